//! logger.rs
//! Configuración del logger usando env_logger.

use env_logger;

pub fn init_logger() {
    // RUST_LOG manda; si no está, info para la app y warn para lettre,
    // que en info imprime cada comando SMTP.
    let log_env = std::env::var("RUST_LOG").unwrap_or_else(|_| "info,lettre=warn".to_string());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_env))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}
