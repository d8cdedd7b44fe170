//! tests/mod.rs
//! Pruebas unitarias y utilidades compartidas (config de prueba,
//! transporte en memoria, plantillas en un directorio temporal).

mod cli_tests;
mod letter_tests;
mod pdf_tests;

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;
use tempfile::TempDir;

use crate::{
    config::mailer_config::{AttachFormat, MailerConfig},
    error::MailerError,
    models::{contact_model::Contact, email_model::OutgoingEmail},
    services::{
        compose_service::ComposeService, email_service::MailTransport,
        email_service::MessageBuilder, letter_service::LetterService, pdf_service::PdfService,
    },
};

pub const LETTER_TEMPLATE: &str =
    "<html><body><p>{salutation},</p><p>Please send your quote for {company} before {deadline}.</p><p>{today}</p></body></html>";

pub const BODY_TEMPLATE: &str = "<p>{salutation},</p>\
<p>Attached is our request for {company}.</p>\
<ul><li>Cover letter</li><li>Specifications</li></ul>\
<p>Kind regards<br>{from_name}</p><img src=\"{logo_cid}\">";

/// Configuración mínima válida; `extra` pisa o agrega variables.
pub fn config_with(body_template: &Path, extra: &[(&str, &str)]) -> MailerConfig {
    let mut vars: HashMap<String, String> = [
        ("SMTP_HOST", "smtp.example.com"),
        ("SMTP_USER", "sender@example.com"),
        ("SMTP_PASSWORD", "secret"),
        ("FROM_NAME", "Acme Sourcing"),
        ("SLEEP_SECONDS", "0"),
        ("ATTACH_FORMAT", "html"),
        ("DEADLINE", "March 31"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    vars.insert(
        "EMAIL_BODY_HTML_TEMPLATE".to_string(),
        body_template.to_string_lossy().into_owned(),
    );
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }

    MailerConfig::from_lookup(|key| vars.get(key).cloned()).expect("test config must be valid")
}

pub fn contact(email: &str, name: &str, gender: &str, company: &str) -> Contact {
    Contact {
        email: email.to_string(),
        name: name.to_string(),
        gender: gender.to_string(),
        company: company.to_string(),
    }
}

/// Directorio temporal con plantillas, adjunto fijo y un composer listo.
pub struct Fixture {
    pub dir: TempDir,
    pub attachment: PathBuf,
    pub composer: ComposeService,
}

impl Fixture {
    pub fn new(max_retries: u32) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let letter = dir.path().join("letter.html");
        let body = dir.path().join("body.html");
        let attachment = dir.path().join("specifications.xlsx");
        fs::write(&letter, LETTER_TEMPLATE).unwrap();
        fs::write(&body, BODY_TEMPLATE).unwrap();
        fs::write(&attachment, b"PK\x03\x04 fake spreadsheet").unwrap();

        let max = max_retries.to_string();
        let config = config_with(&body, &[("MAX_RETRIES", max.as_str())]);
        let letters = LetterService::new(letter, AttachFormat::Html, PdfService::unavailable());
        let builder = MessageBuilder::new(&config, None).unwrap();
        let composer =
            ComposeService::new(&config, letters, builder, attachment.clone(), None).unwrap();

        Self {
            dir,
            attachment,
            composer,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }
}

/// Transporte en memoria: falla las primeras N veces por destinatario y
/// registra cada llamada.
#[derive(Default)]
pub struct ScriptedTransport {
    failures: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(self, email: &str, times: u32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(email.to_string(), times);
        self
    }

    pub fn calls_for(&self, email: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == email)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for ScriptedTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError> {
        self.calls.lock().unwrap().push(email.to.clone());
        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&email.to) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(MailerError::Transport(
                    "451 4.7.1 Try again later".to_string(),
                ));
            }
        }
        Ok(email.message_id.clone())
    }
}
