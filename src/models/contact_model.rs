//! models/contact_model.rs
//! Contactos y estado de intentos previos.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Clave única dentro de una corrida
    pub email: String,
    pub name: String,
    /// "m", "f" u otro código
    pub gender: String,
    pub company: String,
}

/// Intentos ya consumidos por un contacto en corridas anteriores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptRecord {
    pub previous_attempts: u32,
    pub last_error: String,
}

/// Mapa email -> AttemptRecord, construido una sola vez al inicio de la corrida.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptLedger {
    records: HashMap<String, AttemptRecord>,
}

impl AttemptLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, email: impl Into<String>, record: AttemptRecord) {
        self.records.insert(email.into(), record);
    }

    /// Sin registro previo => cero intentos y sin error.
    pub fn get(&self, email: &str) -> AttemptRecord {
        self.records.get(email).cloned().unwrap_or_default()
    }
}
