//! models/email_model.rs
//! Estructuras del mensaje saliente.

use lettre::Message;

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Contenido personalizado de un email, antes de armar el MIME.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Mensaje listo para el transporte.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    /// Message-ID con los `<>` incluidos
    pub message_id: String,
    pub message: Message,
}

/// Resultado de un intento exitoso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: String,
    pub attachment_names: Vec<String>,
}
