//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod compose_service;
pub mod contact_service;
pub mod dispatch_service;
pub mod email_service;
pub mod letter_service;
pub mod pdf_service;
pub mod run_log_service;
