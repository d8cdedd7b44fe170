//! models/log_model.rs
//! Filas del log de envío y del export de estado.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::contact_model::Contact;

/// Columnas del log de envío, en orden.
pub const LOG_COLUMNS: [&str; 12] = [
    "run_id",
    "timestamp",
    "attempt",
    "email",
    "name",
    "gender",
    "company",
    "subject",
    "attachments",
    "status",
    "message_id",
    "error",
];

/// Columnas del export de estado, en orden.
pub const STATUS_COLUMNS: [&str; 8] = [
    "email",
    "name",
    "gender",
    "company",
    "last_status",
    "attempt",
    "message_id",
    "error",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    AbortedMaxRetries,
    SkippedMaxRetries,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::AbortedMaxRetries => "aborted_max_retries",
            DeliveryStatus::SkippedMaxRetries => "skipped_max_retries",
        }
    }

    /// Estados que cuentan como intento consumido al reanudar.
    pub fn counts_as_attempt(&self) -> bool {
        !matches!(self, DeliveryStatus::Sent)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            "aborted_max_retries" => Ok(DeliveryStatus::AbortedMaxRetries),
            "skipped_max_retries" => Ok(DeliveryStatus::SkippedMaxRetries),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// Una fila del log: un intento o una decisión de omitir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub run_id: String,
    pub timestamp: String,
    pub attempt: u32,
    pub email: String,
    pub name: String,
    pub gender: String,
    pub company: String,
    pub subject: String,
    /// Nombres de archivo separados por ", "
    pub attachments: String,
    pub status: DeliveryStatus,
    pub message_id: String,
    pub error: String,
}

impl LogEntry {
    pub fn new(run_id: &str, attempt: u32, contact: &Contact, status: DeliveryStatus) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
            attempt,
            email: contact.email.clone(),
            name: contact.name.clone(),
            gender: contact.gender.clone(),
            company: contact.company.clone(),
            subject: String::new(),
            attachments: String::new(),
            status,
            message_id: String::new(),
            error: String::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_attachments(mut self, attachments: impl Into<String>) -> Self {
        self.attachments = attachments.into();
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }
}

/// Fila de un log previo tal como se lee al reanudar. Todo es texto y
/// cualquier columna puede faltar: un log parcial tiene que poder leerse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriorLogRow {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub error: String,
}

/// Último estado conocido de un contacto (export de estado).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactStatus {
    pub email: String,
    pub name: String,
    pub gender: String,
    pub company: String,
    pub last_status: DeliveryStatus,
    pub attempt: u32,
    pub message_id: String,
    pub error: String,
}
