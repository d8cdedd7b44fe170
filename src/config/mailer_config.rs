//! config/mailer_config.rs
//! Configuración global del mailer, leída una sola vez del entorno (.env)
//! y pasada por referencia al resto de servicios.

use std::{path::PathBuf, time::Duration};

use crate::error::MailerError;

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_SUBJECT_TEMPLATE: &str = "RFQ for {company} - documents attached";

/// Cómo se protege la sesión SMTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    /// TLS desde el primer byte (típicamente puerto 465).
    ImplicitTls,
    /// Conexión en claro + STARTTLS (típicamente puerto 587).
    StartTls,
}

/// Formato con el que se adjunta la carta de presentación.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachFormat {
    Pdf,
    Html,
}

impl AttachFormat {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "pdf" => Some(AttachFormat::Pdf),
            "html" => Some(AttachFormat::Html),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub from_name: String,
    pub reply_to: String,
    pub security: SecurityMode,
    /// Pausa de cortesía entre mensajes
    pub send_delay: Duration,
    pub subject_template: String,
    pub deadline: String,
    pub attach_format: AttachFormat,
    pub max_retries: u32,
    pub body_html_template: PathBuf,
    pub logo_path: Option<PathBuf>,
}

impl MailerConfig {
    /// Lee la configuración de las variables de entorno del proceso.
    pub fn from_env() -> Result<Self, MailerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la configuración a partir de una función de búsqueda.
    /// Acumula todos los problemas y los devuelve juntos en un solo error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MailerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut problems = Vec::new();

        let mut require = |key: &str| match get(key) {
            Some(v) => v,
            None => {
                problems.push(format!("missing {key}"));
                String::new()
            }
        };
        let smtp_host = require("SMTP_HOST");
        let smtp_user = require("SMTP_USER");
        let smtp_password = require("SMTP_PASSWORD");
        let body_html_template = require("EMAIL_BODY_HTML_TEMPLATE");

        let smtp_port = match get("SMTP_PORT") {
            None => DEFAULT_SMTP_PORT,
            Some(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                problems.push(format!("SMTP_PORT is not a valid port: {raw}"));
                DEFAULT_SMTP_PORT
            }),
        };

        let send_delay = match get("SLEEP_SECONDS") {
            None => Duration::from_secs(1),
            Some(raw) => match raw.parse::<f64>().ok().map(Duration::try_from_secs_f64) {
                Some(Ok(delay)) => delay,
                _ => {
                    problems.push(format!("SLEEP_SECONDS must be a non-negative number: {raw}"));
                    Duration::from_secs(1)
                }
            },
        };

        let attach_format = match get("ATTACH_FORMAT") {
            None => AttachFormat::Pdf,
            Some(raw) => AttachFormat::parse(&raw).unwrap_or_else(|| {
                problems.push(format!("ATTACH_FORMAT must be 'pdf' or 'html', got '{raw}'"));
                AttachFormat::Pdf
            }),
        };

        // Valor inválido o < 1 => default, no es error
        let max_retries = get("MAX_RETRIES")
            .and_then(|raw| raw.parse::<u32>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let security = match get("USE_SSL") {
            Some(raw) if raw.eq_ignore_ascii_case("true") => SecurityMode::ImplicitTls,
            _ => SecurityMode::StartTls,
        };

        if !problems.is_empty() {
            return Err(MailerError::Config(problems));
        }

        Ok(MailerConfig {
            from_name: get("FROM_NAME").unwrap_or_else(|| smtp_user.clone()),
            reply_to: get("REPLY_TO").unwrap_or_else(|| smtp_user.clone()),
            subject_template: get("SUBJECT_TEMPLATE")
                .unwrap_or_else(|| DEFAULT_SUBJECT_TEMPLATE.to_string()),
            deadline: get("DEADLINE").unwrap_or_default(),
            logo_path: get("LOGO_PATH").map(PathBuf::from),
            body_html_template: PathBuf::from(body_html_template),
            smtp_host,
            smtp_port,
            smtp_user,
            smtp_password,
            security,
            send_delay,
            attach_format,
            max_retries,
        })
    }

    /// Asunto con el nombre de la empresa sustituido.
    pub fn subject_for(&self, company: &str) -> String {
        self.subject_template.replace("{company}", company)
    }
}
