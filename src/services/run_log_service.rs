//! services/run_log_service.rs
//! Log de envío (una fila por intento) y export del último estado por contacto.

use std::{
    collections::HashMap,
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

use chrono::Local;

use crate::{
    error::MailerError,
    models::log_model::{ContactStatus, LogEntry, LOG_COLUMNS, STATUS_COLUMNS},
};

/// Identificador de corrida derivado de la hora local.
pub fn new_run_id() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Writer append-only del log. Cada fila se vuelca a disco al escribirse:
/// si el proceso muere, el log refleja los intentos completados.
pub struct RunLog {
    run_id: String,
    path: PathBuf,
    writer: csv::Writer<File>,
    entries: Vec<LogEntry>,
}

impl RunLog {
    /// Crea `send_log_<run_id>.csv` en `dir`. Si el nombre ya existe
    /// se agrega un sufijo numérico en lugar de pisarlo.
    pub fn create(dir: &Path, run_id: &str) -> Result<Self, MailerError> {
        std::fs::create_dir_all(dir)?;

        let mut suffix = 0;
        let (file, path) = loop {
            let name = if suffix == 0 {
                format!("send_log_{run_id}.csv")
            } else {
                format!("send_log_{run_id}_{suffix}.csv")
            };
            let path = dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (file, path),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(e) => return Err(e.into()),
            }
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record(LOG_COLUMNS)?;
        writer.flush()?;

        log::info!("Log de envío en {:?}", path);
        Ok(Self {
            run_id: run_id.to_string(),
            path,
            writer,
            entries: Vec::new(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Filas escritas en esta corrida, en orden.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn append(&mut self, entry: LogEntry) -> Result<(), MailerError> {
        self.writer.serialize(&entry)?;
        self.writer.flush()?;
        self.entries.push(entry);
        Ok(())
    }

    /// Cierra el archivo y devuelve su ruta.
    pub fn close(mut self) -> Result<PathBuf, MailerError> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

/// Último estado por contacto: orden de primera aparición, gana la última fila.
pub fn summarize(entries: &[LogEntry]) -> Vec<ContactStatus> {
    let mut order: Vec<ContactStatus> = Vec::new();
    let mut by_email: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let status = ContactStatus {
            email: entry.email.clone(),
            name: entry.name.clone(),
            gender: entry.gender.clone(),
            company: entry.company.clone(),
            last_status: entry.status,
            attempt: entry.attempt,
            message_id: entry.message_id.clone(),
            error: entry.error.clone(),
        };
        match by_email.get(entry.email.as_str()) {
            Some(&idx) => order[idx] = status,
            None => {
                by_email.insert(&entry.email, order.len());
                order.push(status);
            }
        }
    }
    order
}

/// Escribe el export de estado (siempre con cabecera).
pub fn write_status_csv(path: &Path, statuses: &[ContactStatus]) -> Result<(), MailerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(STATUS_COLUMNS)?;
    for status in statuses {
        writer.serialize(status)?;
    }
    writer.flush()?;
    Ok(())
}
