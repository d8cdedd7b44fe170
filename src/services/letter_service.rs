//! services/letter_service.rs
//! Renderizado de la carta de presentación y del cuerpo HTML a partir de
//! plantillas con campos `{placeholder}`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;

use crate::{
    config::mailer_config::{AttachFormat, MailerConfig},
    error::MailerError,
    models::contact_model::Contact,
    services::pdf_service::PdfService,
};

/// Marca que el builder reemplaza por `cid:<content-id>` del logo.
pub const LOGO_CID_PLACEHOLDER: &str = "{logo_cid}";

/// Valores disponibles para las plantillas.
#[derive(Debug, Clone)]
pub struct LetterContext {
    pub salutation: String,
    pub company: String,
    pub deadline: String,
    pub from_name: String,
    pub reply_to: String,
    pub today: String,
}

impl LetterContext {
    pub fn for_contact(config: &MailerConfig, contact: &Contact) -> Self {
        Self {
            salutation: make_salutation(&contact.name, &contact.gender),
            company: contact.company.clone(),
            deadline: config.deadline.clone(),
            from_name: config.from_name.clone(),
            reply_to: config.reply_to.clone(),
            today: Local::now().format("%m/%d/%Y").to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        match key {
            "salutation" => Some(self.salutation.as_str()),
            "company" => Some(self.company.as_str()),
            "deadline" => Some(self.deadline.as_str()),
            "from_name" => Some(self.from_name.as_str()),
            "reply_to" => Some(self.reply_to.as_str()),
            "today" => Some(self.today.as_str()),
            // Se deja tal cual; el builder lo resuelve
            "logo_cid" => Some(LOGO_CID_PLACEHOLDER),
            _ => None,
        }
    }
}

/// "Dear Mr <apellido>", "Dear Ms <apellido>" o "Hello <nombre completo>".
pub fn make_salutation(full_name: &str, gender: &str) -> String {
    let last = full_name.split_whitespace().last().unwrap_or(full_name);
    match gender {
        "m" => format!("Dear Mr {last}"),
        "f" => format!("Dear Ms {last}"),
        _ => format!("Hello {full_name}"),
    }
}

/// Sustituye `{clave}` por su valor. `{{` y `}}` son llaves literales.
/// Una clave desconocida o una llave sin cerrar es un error de render.
pub fn fill_template(template: &str, ctx: &LetterContext) -> Result<String, MailerError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(k) => key.push(k),
                        None => {
                            return Err(MailerError::Render(format!(
                                "unclosed placeholder '{{{key}'"
                            )))
                        }
                    }
                }
                let value = ctx.lookup(key.trim()).ok_or_else(|| {
                    MailerError::Render(format!("unknown placeholder '{{{key}}}'"))
                })?;
                out.push_str(value);
            }
            '}' => {
                return Err(MailerError::Render(
                    "single '}' encountered in template".to_string(),
                ))
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Renderiza la carta de presentación (HTML) y la convierte al formato
/// de adjunto configurado.
#[derive(Debug, Clone)]
pub struct LetterService {
    template_path: PathBuf,
    attach_format: AttachFormat,
    pdf_service: PdfService,
}

impl LetterService {
    pub fn new(template_path: PathBuf, attach_format: AttachFormat, pdf_service: PdfService) -> Self {
        Self {
            template_path,
            attach_format,
            pdf_service,
        }
    }

    /// Escribe `Cover_Letter_<empresa>.html` en `out_dir` y devuelve su ruta.
    pub fn render_letter(&self, ctx: &LetterContext, out_dir: &Path) -> Result<PathBuf, MailerError> {
        let template = fs::read_to_string(&self.template_path).map_err(|e| {
            MailerError::Render(format!(
                "could not read letter template {:?}: {e}",
                self.template_path
            ))
        })?;
        let rendered = fill_template(&template, ctx)?;

        let out_path = out_dir.join(format!(
            "Cover_Letter_{}.html",
            ctx.company.replace([' ', '/', '\\'], "_")
        ));
        fs::write(&out_path, rendered)?;
        log::debug!("Carta renderizada en {:?}", out_path);
        Ok(out_path)
    }

    /// Carta lista para adjuntar. Con formato PDF intenta convertir y, si
    /// la conversión no está disponible, adjunta el HTML original.
    pub async fn render_attachment(
        &self,
        ctx: &LetterContext,
        out_dir: &Path,
    ) -> Result<PathBuf, MailerError> {
        let letter = self.render_letter(ctx, out_dir)?;
        match self.attach_format {
            AttachFormat::Html => Ok(letter),
            AttachFormat::Pdf => match self.pdf_service.convert_to_pdf(&letter).await {
                Some(pdf) => Ok(pdf),
                None => {
                    log::warn!("Conversión a PDF no disponible, se adjunta {:?}", letter);
                    Ok(letter)
                }
            },
        }
    }
}

/// Renderiza la plantilla HTML del cuerpo del email.
pub fn render_html_body(template_path: &Path, ctx: &LetterContext) -> Result<String, MailerError> {
    let template = fs::read_to_string(template_path).map_err(|e| {
        MailerError::Render(format!("could not read HTML template {:?}: {e}", template_path))
    })?;
    fill_template(&template, ctx)
}
