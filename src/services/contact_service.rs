//! services/contact_service.rs
//! Fuente de contactos: lista nueva (CSV) o reanudación desde un log previo.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use crate::{
    error::MailerError,
    models::{
        contact_model::{AttemptLedger, AttemptRecord, Contact},
        log_model::{DeliveryStatus, PriorLogRow},
    },
};

const REQUIRED_COLUMNS: [&str; 4] = ["email", "name", "gender", "company"];

/// Contactos a procesar en esta corrida + intentos previos de cada uno.
#[derive(Debug, Default)]
pub struct ContactSource {
    pub contacts: Vec<Contact>,
    pub ledger: AttemptLedger,
}

impl ContactSource {
    /// Recorta a los primeros `limit` contactos (0 = sin límite).
    pub fn truncate(&mut self, limit: usize) {
        if limit > 0 {
            self.contacts.truncate(limit);
        }
    }
}

/// Carga una lista nueva de contactos. Delimitador `,` o `;`, BOM opcional.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>, MailerError> {
    let raw = fs::read_to_string(path)?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    parse_contacts(text, path)
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn parse_contacts(text: &str, path: &Path) -> Result<Vec<Contact>, MailerError> {
    let schema_err = |detail: String| MailerError::Schema {
        path: path.to_path_buf(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(text))
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut index = HashMap::new();
    let mut missing = Vec::new();
    for column in REQUIRED_COLUMNS {
        match headers.iter().position(|h| h == column) {
            Some(i) => {
                index.insert(column, i);
            }
            None => missing.push(column),
        }
    }
    if !missing.is_empty() {
        return Err(schema_err(format!(
            "contacts file must contain columns {:?}, missing {:?}",
            REQUIRED_COLUMNS, missing
        )));
    }

    let mut contacts = Vec::new();
    let mut seen = HashSet::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record?;
        let field = |column: &str| -> Result<String, MailerError> {
            record
                .get(index[column])
                .map(|v| v.trim().to_string())
                .ok_or_else(|| schema_err(format!("row {} has no '{}' field", row_no + 2, column)))
        };
        // Líneas en blanco al final del archivo
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        let contact = Contact {
            email: field("email")?,
            name: field("name")?,
            gender: field("gender")?.to_lowercase(),
            company: field("company")?,
        };
        // El email es la clave del contacto dentro de la corrida
        if !seen.insert(contact.email.clone()) {
            log::warn!("Contacto duplicado ignorado: {}", contact.email);
            continue;
        }
        contacts.push(contact);
    }

    log::info!("Cargados {} contactos desde {:?}", contacts.len(), path);
    Ok(contacts)
}

/// Reconstruye la fuente de contactos a partir de un log de una corrida anterior.
pub fn replay_log(path: &Path, max_retries: u32) -> Result<ContactSource, MailerError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (row_no, row) in reader.deserialize::<PriorLogRow>().enumerate() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => log::warn!("Fila {} del log {:?} ignorada: {}", row_no + 2, path, e),
        }
    }

    let source = replay_rows(rows, max_retries);
    log::info!(
        "Reanudando desde {:?}: {} contactos pendientes",
        path,
        source.contacts.len()
    );
    Ok(source)
}

#[derive(Debug)]
struct ReplayState {
    contact: Contact,
    sent: bool,
    previous_attempts: u32,
    last_error: String,
    recognized: bool,
}

/// Agrupa las filas por email y decide quién se vuelve a intentar.
/// Incluido sii nunca fue `sent`, tiene al menos una fila con estado conocido
/// y sus intentos previos son < `max_retries`.
pub fn replay_rows<I>(rows: I, max_retries: u32) -> ContactSource
where
    I: IntoIterator<Item = PriorLogRow>,
{
    let mut order: Vec<ReplayState> = Vec::new();
    let mut by_email: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let email = row.email.trim();
        if email.is_empty() {
            continue;
        }

        let idx = *by_email.entry(email.to_string()).or_insert_with(|| {
            order.push(ReplayState {
                contact: Contact {
                    email: email.to_string(),
                    name: String::new(),
                    gender: String::new(),
                    company: String::new(),
                },
                sent: false,
                previous_attempts: 0,
                last_error: String::new(),
                recognized: false,
            });
            order.len() - 1
        });
        let state = &mut order[idx];

        // Los datos del contacto vienen de la última fila que los trae
        for (target, value) in [
            (&mut state.contact.name, &row.name),
            (&mut state.contact.company, &row.company),
        ] {
            if !value.trim().is_empty() {
                *target = value.trim().to_string();
            }
        }
        if !row.gender.trim().is_empty() {
            state.contact.gender = row.gender.trim().to_lowercase();
        }

        let Ok(status) = row.status.parse::<DeliveryStatus>() else {
            continue;
        };
        state.recognized = true;
        if status.counts_as_attempt() {
            state.previous_attempts += 1;
            if !row.error.is_empty() {
                state.last_error = row.error;
            }
        } else {
            state.sent = true;
        }
    }

    let mut source = ContactSource {
        contacts: Vec::new(),
        ledger: AttemptLedger::new(),
    };
    for mut state in order {
        if !state.recognized || state.sent || state.previous_attempts >= max_retries {
            continue;
        }
        if state.contact.gender.is_empty() {
            state.contact.gender = "x".to_string();
        }
        source.ledger.insert(
            state.contact.email.clone(),
            AttemptRecord {
                previous_attempts: state.previous_attempts,
                last_error: state.last_error,
            },
        );
        source.contacts.push(state.contact);
    }
    source
}
