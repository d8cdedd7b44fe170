//! services/compose_service.rs
//! Personaliza y arma el email completo de un contacto: carta, cuerpo
//! HTML/texto y adjuntos. No toca la red.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::{
    config::mailer_config::MailerConfig,
    error::MailerError,
    models::{
        contact_model::Contact,
        email_model::{EmailContent, OutgoingEmail},
    },
    services::{
        email_service::{html_to_text, save_eml, MessageBuilder},
        letter_service::{render_html_body, LetterContext, LetterService},
    },
};

/// Email armado + datos para el log y la vista previa.
#[derive(Debug, Clone)]
pub struct ComposedEmail {
    pub email: OutgoingEmail,
    pub subject: String,
    pub body_text: String,
    pub attachment_names: Vec<String>,
}

pub struct ComposeService {
    config: MailerConfig,
    letters: LetterService,
    builder: MessageBuilder,
    fixed_attachment: PathBuf,
    save_eml_dir: Option<PathBuf>,
    /// Cartas renderizadas; se borra al salir de scope
    work_dir: TempDir,
}

impl ComposeService {
    pub fn new(
        config: &MailerConfig,
        letters: LetterService,
        builder: MessageBuilder,
        fixed_attachment: PathBuf,
        save_eml_dir: Option<PathBuf>,
    ) -> Result<Self, MailerError> {
        let work_dir = tempfile::Builder::new().prefix("mass_mailer_").tempdir()?;
        Ok(Self {
            config: config.clone(),
            letters,
            builder,
            fixed_attachment,
            save_eml_dir,
            work_dir,
        })
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    pub fn subject_for(&self, contact: &Contact) -> String {
        self.config.subject_for(&contact.company)
    }

    /// Renderiza y arma el mensaje. Cualquier error aquí cuenta como
    /// intento fallido para el orquestador.
    pub async fn compose(&self, contact: &Contact) -> Result<ComposedEmail, MailerError> {
        let ctx = LetterContext::for_contact(&self.config, contact);
        let subject = self.subject_for(contact);

        let letter = self.letters.render_attachment(&ctx, self.work_dir()).await?;
        let attachments = vec![letter, self.fixed_attachment.clone()];

        let body_html = render_html_body(&self.config.body_html_template, &ctx)?;
        let body_text = html_to_text(&body_html);

        let content = EmailContent {
            to: contact.email.clone(),
            subject: subject.clone(),
            body_text: body_text.clone(),
            body_html,
        };
        let email = self.builder.build(&content, &attachments)?;

        if let Some(dir) = &self.save_eml_dir {
            save_eml(dir, &email)?;
        }

        let attachment_names = attachments
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        Ok(ComposedEmail {
            email,
            subject,
            body_text,
            attachment_names,
        })
    }
}
