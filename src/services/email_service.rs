//! services/email_service.rs
//! Armado del mensaje MIME y transporte SMTP.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Local;
use lettre::{
    message::{
        header::{ContentType, Header, HeaderName, HeaderValue},
        Attachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use regex::Regex;
use uuid::Uuid;

use crate::{
    config::mailer_config::{MailerConfig, SecurityMode},
    error::MailerError,
    models::email_model::{EmailAttachment, EmailContent, OutgoingEmail},
    services::letter_service::LOGO_CID_PLACEHOLDER,
};

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

// ========================================================================
// Transporte
// ========================================================================

/// Sesión de envío. Una sola instancia se usa durante toda la corrida.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Envía el mensaje y devuelve su Message-ID.
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError>;

    async fn close(&self) {}
}

pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpMailTransport {
    /// Abre la sesión y verifica login. Un error aquí es fatal para la corrida.
    pub async fn connect(config: &MailerConfig) -> Result<Self, MailerError> {
        let builder = match config.security {
            SecurityMode::ImplicitTls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            }
            SecurityMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
        };

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        log::info!(
            "Conectando a SMTP {}:{} ({:?}) como {}",
            config.smtp_host,
            config.smtp_port,
            config.security,
            config.smtp_user
        );
        if !transport.test_connection().await? {
            return Err(MailerError::Transport(format!(
                "{} did not accept the connection",
                config.smtp_host
            )));
        }

        Ok(Self {
            transport,
            host: config.smtp_host.clone(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError> {
        tokio::time::timeout(SMTP_TIMEOUT, self.transport.send(email.message.clone()))
            .await
            .map_err(|_| MailerError::Transport(format!("timeout sending to {}", email.to)))??;
        Ok(email.message_id.clone())
    }

    async fn close(&self) {
        log::info!("Cerrando sesión SMTP con {}", self.host);
    }
}

// ========================================================================
// Armado del mensaje
// ========================================================================

macro_rules! address_header {
    ($ty:ident, $name:literal) => {
        #[derive(Debug, Clone)]
        struct $ty(String);

        impl Header for $ty {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($name)
            }

            fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Self(s.to_string()))
            }

            fn display(&self) -> HeaderValue {
                HeaderValue::new(Self::name(), self.0.clone())
            }
        }
    };
}

// Acuse de recibo al remitente
address_header!(DispositionNotificationTo, "Disposition-Notification-To");
address_header!(ReturnReceiptTo, "Return-Receipt-To");

#[derive(Debug, Clone)]
pub struct MessageBuilder {
    from: Mailbox,
    reply_to: Mailbox,
    sender: Address,
    logo_path: Option<PathBuf>,
}

impl MessageBuilder {
    pub fn new(config: &MailerConfig, logo_path: Option<PathBuf>) -> Result<Self, MailerError> {
        let sender: Address = config.smtp_user.parse().map_err(|e| {
            MailerError::Config(vec![format!(
                "SMTP_USER is not a valid email address ({e}): {}",
                config.smtp_user
            )])
        })?;
        let reply_to: Address = config.reply_to.parse().map_err(|e| {
            MailerError::Config(vec![format!(
                "REPLY_TO is not a valid email address ({e}): {}",
                config.reply_to
            )])
        })?;

        Ok(Self {
            from: Mailbox::new(Some(config.from_name.clone()), sender.clone()),
            reply_to: Mailbox::new(None, reply_to),
            sender,
            logo_path,
        })
    }

    /// Arma el mensaje completo. Valida los adjuntos antes de leer nada,
    /// así un adjunto faltante falla sin tocar la red.
    pub fn build(
        &self,
        content: &EmailContent,
        attachments: &[PathBuf],
    ) -> Result<OutgoingEmail, MailerError> {
        if let Some(missing) = attachments.iter().find(|p| !p.exists()) {
            return Err(MailerError::AttachmentMissing(missing.clone()));
        }

        let to: Mailbox = content.to.parse().map_err(|e| {
            MailerError::Render(format!("invalid recipient '{}': {e}", content.to))
        })?;

        let domain = self.sender.domain();
        let message_id = format!("<{}@{}>", Uuid::new_v4().simple(), domain);

        // Logo inline (si existe al momento del envío)
        let logo = match &self.logo_path {
            Some(path) if path.exists() => Some(read_attachment(path)?),
            _ => None,
        };

        let alternative = MultiPart::alternative().singlepart(SinglePart::plain(content.body_text.clone()));
        let alternative = match logo {
            Some(logo) => {
                let cid = format!("{}@{}", Uuid::new_v4().simple(), domain);
                let html = content
                    .body_html
                    .replace(LOGO_CID_PLACEHOLDER, &format!("cid:{cid}"));
                alternative.multipart(
                    MultiPart::related()
                        .singlepart(SinglePart::html(html))
                        .singlepart(
                            Attachment::new_inline(cid)
                                .body(logo.data, parse_content_type(&logo.content_type)?),
                        ),
                )
            }
            None => alternative.singlepart(SinglePart::html(
                content.body_html.replace(LOGO_CID_PLACEHOLDER, ""),
            )),
        };

        let mut mixed = MultiPart::mixed().multipart(alternative);
        for path in attachments {
            let attachment = read_attachment(path)?;
            let content_type = parse_content_type(&attachment.content_type)?;
            mixed = mixed.singlepart(Attachment::new(attachment.filename).body(attachment.data, content_type));
        }

        let message = Message::builder()
            .from(self.from.clone())
            .reply_to(self.reply_to.clone())
            .to(to)
            .subject(content.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(DispositionNotificationTo(self.sender.to_string()))
            .header(ReturnReceiptTo(self.sender.to_string()))
            .multipart(mixed)?;

        Ok(OutgoingEmail {
            to: content.to.clone(),
            message_id,
            message,
        })
    }
}

fn parse_content_type(raw: &str) -> Result<ContentType, MailerError> {
    ContentType::parse(raw)
        .map_err(|e| MailerError::Render(format!("invalid content type '{raw}': {e}")))
}

fn read_attachment(path: &Path) -> Result<EmailAttachment, MailerError> {
    let data = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => MailerError::AttachmentMissing(path.to_path_buf()),
        _ => MailerError::Io(e),
    })?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());

    Ok(EmailAttachment {
        content_type: guess_content_type(path).to_string(),
        filename,
        data,
    })
}

/// Content-Type por extensión; desconocido => application/octet-stream.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "html" | "htm" => "text/html",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xls" => "application/vnd.ms-excel",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

static BR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br regex is valid"));
static PARAGRAPH_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</p>").expect("paragraph regex is valid"));
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li>").expect("list item regex is valid"));
static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank lines regex is valid"));

/// Texto plano a partir del HTML: saltos de línea, párrafos y viñetas,
/// el resto de las etiquetas se elimina.
pub fn html_to_text(html: &str) -> String {
    let text = BR_TAG.replace_all(html, "\n");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = LIST_ITEM.replace_all(&text, "- ");
    let text = ANY_TAG.replace_all(&text, "");
    BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
}

/// Guarda el mensaje crudo (.eml) para inspección.
pub fn save_eml(dir: &Path, email: &OutgoingEmail) -> Result<PathBuf, MailerError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "{}_{}.eml",
        Local::now().format("%Y%m%d_%H%M%S"),
        email.to.replace('@', "_at_")
    ));
    fs::write(&path, email.message.formatted())?;
    log::debug!("Mensaje guardado en {:?}", path);
    Ok(path)
}
