//! cli.rs
//! Argumentos de línea de comandos.

use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};

/// Envío masivo de solicitudes con carta personalizada, adjuntos y log CSV
#[derive(Parser, Debug, Clone)]
#[command(name = "mass_mailer", version, long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .args(["contacts", "retry_from_log"])
        .multiple(false)
))]
pub struct Cli {
    /// Lista de contactos (CSV con email, name, gender, company)
    #[arg(long)]
    pub contacts: Option<PathBuf>,

    /// Log de una corrida anterior (send_log_*.csv) para reintentar pendientes
    #[arg(long)]
    pub retry_from_log: Option<PathBuf>,

    /// Plantilla HTML de la carta de presentación
    #[arg(long, required_unless_present = "check_smtp")]
    pub letter: Option<PathBuf>,

    /// Archivo fijo adjunto a todos los emails
    #[arg(long, required_unless_present = "check_smtp")]
    pub attachment: Option<PathBuf>,

    /// Procesar solo los primeros N contactos (0 = todos)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Vista previa de los primeros contactos, sin enviar
    #[arg(long)]
    pub dry_run: bool,

    /// Directorio donde guardar los .eml generados
    #[arg(long)]
    pub save_eml_out: Option<PathBuf>,

    /// Escribir el último estado por contacto en este CSV
    #[arg(long)]
    pub write_status_csv: Option<PathBuf>,

    /// Directorio del log de envío
    #[arg(long, default_value = ".")]
    pub log_dir: PathBuf,

    /// Solo probar conexión y login SMTP
    #[arg(long)]
    pub check_smtp: bool,
}

impl Cli {
    /// Directorio de .eml a usar. La vista previa nunca guarda mensajes.
    pub fn eml_dir(&self) -> Option<PathBuf> {
        if self.dry_run {
            None
        } else {
            self.save_eml_out.clone()
        }
    }
}

/// Resuelve una ruta: tal cual, luego relativa al directorio actual y luego
/// relativa al directorio del ejecutable. Si no existe en ninguno devuelve
/// la ruta original (sirve para el mensaje de error).
pub fn resolve_path(arg: &Path) -> PathBuf {
    if arg.exists() {
        return arg.canonicalize().unwrap_or_else(|_| arg.to_path_buf());
    }

    let bases = [
        std::env::current_dir().ok(),
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf)),
    ];
    for base in bases.into_iter().flatten() {
        let candidate = base.join(arg);
        if candidate.exists() {
            return candidate;
        }
    }
    arg.to_path_buf()
}
