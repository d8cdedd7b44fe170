//! error.rs
//! Errores tipados del mailer.
//!
//! Los errores por intento (`AttachmentMissing`, `Render`, `Transport`, `Auth`)
//! nunca salen del orquestador: se convierten a texto y se escriben en el log.
//! `Config` y `Schema` son fatales y abortan antes de procesar contactos.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    /// Variables de entorno faltantes o inválidas (todas a la vez).
    #[error("Invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    #[error("Invalid schema in {path}: {detail}")]
    Schema { path: PathBuf, detail: String },

    #[error("Attachment not found: {0}")]
    AttachmentMissing(PathBuf),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("SMTP authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<lettre::transport::smtp::Error> for MailerError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        // 535/534/530: credenciales rechazadas
        let is_auth = e
            .status()
            .map(|code| code.to_string().starts_with("53"))
            .unwrap_or(false);
        if is_auth {
            MailerError::Auth(e.to_string())
        } else {
            MailerError::Transport(e.to_string())
        }
    }
}

impl From<lettre::error::Error> for MailerError {
    fn from(e: lettre::error::Error) -> Self {
        MailerError::Render(format!("could not build message: {e}"))
    }
}
