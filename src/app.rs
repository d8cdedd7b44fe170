//! app.rs
//! Arma los servicios a partir de la configuración y los argumentos, y
//! ejecuta la corrida (envío, vista previa o prueba de SMTP).

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    cli::{resolve_path, Cli},
    config::mailer_config::{AttachFormat, MailerConfig},
    error::MailerError,
    models::contact_model::Contact,
    services::{
        compose_service::ComposeService,
        contact_service::{load_contacts, replay_log, ContactSource},
        dispatch_service::DispatchService,
        email_service::{MailTransport, MessageBuilder, SmtpMailTransport},
        letter_service::LetterService,
        pdf_service::PdfService,
        run_log_service::{new_run_id, summarize, write_status_csv, RunLog},
    },
};

/// Contactos mostrados en la vista previa
const PREVIEW_CONTACTS: usize = 3;

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = MailerConfig::from_env().context("Configuración inválida en .env")?;

    if cli.check_smtp {
        return check_smtp(&config).await;
    }

    // Rutas: se validan antes de procesar cualquier contacto
    let letter_tpl = require_file(cli.letter.as_deref(), "Cover letter template")?;
    let attachment = require_file(cli.attachment.as_deref(), "Attachment")?;
    config.body_html_template = require_file(Some(config.body_html_template.as_path()), "HTML template")?;

    let logo_path = match &config.logo_path {
        Some(raw) => {
            let path = resolve_path(raw);
            if path.exists() {
                Some(path)
            } else {
                log::warn!("Logo no encontrado en {:?}. Se envía sin logo.", raw);
                None
            }
        }
        None => None,
    };

    let mut source = load_source(&cli, &config)?;
    source.truncate(cli.limit);

    let run_id = new_run_id();
    let mut run_log = RunLog::create(&cli.log_dir, &run_id)?;

    let pdf_service = match config.attach_format {
        AttachFormat::Pdf => PdfService::new(),
        AttachFormat::Html => PdfService::unavailable(),
    };
    let letters = LetterService::new(letter_tpl, config.attach_format, pdf_service);
    let builder = MessageBuilder::new(&config, logo_path)?;
    let composer = ComposeService::new(
        &config,
        letters,
        builder,
        attachment,
        cli.eml_dir(),
    )?;

    if cli.dry_run {
        preview(&composer, &source.contacts).await;
        let log_path = run_log.close()?;
        println!("Log guardado: {}", log_path.display());
        return Ok(());
    }

    // Sin sesión ningún contacto puede salir: un fallo aquí aborta la corrida
    let transport = SmtpMailTransport::connect(&config)
        .await
        .context("No se pudo abrir la sesión SMTP")?;

    let dispatcher = DispatchService::new(
        &composer,
        &transport,
        config.max_retries,
        config.send_delay,
    );
    let stats = dispatcher
        .run(&source.contacts, &source.ledger, &mut run_log)
        .await
        .context("Error escribiendo el log de envío")?;
    transport.close().await;

    let statuses = summarize(run_log.entries());
    let log_path = run_log.close()?;

    println!(
        "Listo. Enviados: {}, Fallidos: {}, Abortados: {}, Omitidos: {}",
        stats.sent, stats.failed, stats.aborted, stats.skipped
    );
    println!("Log guardado: {}", log_path.display());

    if let Some(out) = &cli.write_status_csv {
        write_status_csv(out, &statuses)
            .with_context(|| format!("No se pudo escribir {:?}", out))?;
        println!("CSV de estado escrito: {}", out.display());
    }

    Ok(())
}

fn require_file(arg: Option<&Path>, what: &str) -> Result<PathBuf> {
    let arg = arg.ok_or_else(|| anyhow!("{what} path is required"))?;
    let path = resolve_path(arg);
    if !path.exists() {
        bail!("{what} not found: {}", path.display());
    }
    Ok(path)
}

fn load_source(cli: &Cli, config: &MailerConfig) -> Result<ContactSource> {
    if let Some(log_path) = &cli.retry_from_log {
        let path = resolve_path(log_path);
        if !path.exists() {
            bail!("Retry log not found: {}", path.display());
        }
        return Ok(replay_log(&path, config.max_retries)?);
    }

    let Some(contacts_path) = &cli.contacts else {
        bail!("Without --retry-from-log you must pass --contacts.");
    };
    let contacts = load_contacts(&resolve_path(contacts_path))?;
    Ok(ContactSource {
        contacts,
        ..Default::default()
    })
}

async fn preview(composer: &ComposeService, contacts: &[Contact]) {
    for contact in contacts.iter().take(PREVIEW_CONTACTS) {
        println!("Preview:");
        println!("To: {}", contact.email);
        match composer.compose(contact).await {
            Ok(composed) => {
                println!("Subject: {}", composed.subject);
                println!("{}", composed.body_text);
                println!("Attachments: {}", composed.attachment_names.join(", "));
            }
            Err(e) => println!("No se pudo armar el mensaje: {e}"),
        }
        println!("{}", "-".repeat(40));
    }
}

async fn check_smtp(config: &MailerConfig) -> Result<()> {
    println!(
        "Probando login SMTP: host={} port={} security={:?} user={}",
        config.smtp_host, config.smtp_port, config.security, config.smtp_user
    );
    match SmtpMailTransport::connect(config).await {
        Ok(transport) => {
            println!("LOGIN OK");
            transport.close().await;
            Ok(())
        }
        Err(e @ MailerError::Auth(_)) => {
            println!("AUTH FAIL: {e}");
            Err(e.into())
        }
        Err(e) => {
            println!("OTHER ERROR: {e}");
            Err(e.into())
        }
    }
}
