//! config/mod.rs
//! Configuración de la aplicación.

pub mod mailer_config;
