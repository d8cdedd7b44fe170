//! services/pdf_service.rs
//! Conversión de la carta HTML a PDF con wkhtmltopdf (o LibreOffice como
//! respaldo). Si no hay conversor disponible el llamador adjunta el HTML.

use anyhow::{anyhow, Context, Result};
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tokio::{process::Command, time::timeout};

/// Tiempo máximo para generar un PDF
const PDF_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);
/// Márgenes de página en mm
const PAGE_MARGIN_MM: f64 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct PdfService {
    wkhtmltopdf_path: Option<PathBuf>,
    soffice_path: Option<PathBuf>,
}

impl PdfService {
    /// Busca los conversores en PATH. No falla si no hay ninguno.
    pub fn new() -> Self {
        let wkhtmltopdf_path = which::which("wkhtmltopdf").ok();
        let soffice_path = which::which("soffice")
            .or_else(|_| which::which("libreoffice"))
            .ok();

        if wkhtmltopdf_path.is_none() && soffice_path.is_none() {
            log::warn!("No se encontró wkhtmltopdf ni LibreOffice; las cartas se adjuntarán en HTML");
        }

        Self::with_converters(wkhtmltopdf_path, soffice_path)
    }

    /// Servicio con rutas de conversores explícitas.
    pub fn with_converters(wkhtmltopdf_path: Option<PathBuf>, soffice_path: Option<PathBuf>) -> Self {
        Self {
            wkhtmltopdf_path,
            soffice_path,
        }
    }

    /// Servicio sin conversores: toda conversión devuelve `None`.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Convierte `html_path` a un PDF al lado del original.
    /// `None` si la conversión no está disponible o falló.
    pub async fn convert_to_pdf(&self, html_path: &Path) -> Option<PathBuf> {
        let start = Instant::now();
        let pdf_path = html_path.with_extension("pdf");

        // Un PDF previo con el mismo nombre (otro contacto de la misma empresa)
        // no puede contar como resultado de esta conversión
        match tokio::fs::remove_file(&pdf_path).await {
            Ok(()) => log::debug!("PDF previo eliminado: {:?}", pdf_path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                log::warn!("No se pudo eliminar {:?}: {}", pdf_path, e);
                return None;
            }
        }

        if let Some(bin) = &self.wkhtmltopdf_path {
            match self.run_wkhtmltopdf(bin, html_path, &pdf_path).await {
                Ok(()) if pdf_path.exists() => {
                    log::info!("PDF generado en {:.2}s", start.elapsed().as_secs_f32());
                    return Some(pdf_path);
                }
                Ok(()) => log::warn!("wkhtmltopdf no produjo {:?}", pdf_path),
                Err(e) => log::warn!("wkhtmltopdf falló: {:#}", e),
            }
        }

        if let Some(bin) = &self.soffice_path {
            match self.run_soffice(bin, html_path).await {
                Ok(()) if pdf_path.exists() => {
                    log::info!(
                        "PDF generado con LibreOffice en {:.2}s",
                        start.elapsed().as_secs_f32()
                    );
                    return Some(pdf_path);
                }
                Ok(()) => log::warn!("LibreOffice no produjo {:?}", pdf_path),
                Err(e) => log::warn!("LibreOffice falló: {:#}", e),
            }
        }

        None
    }

    async fn run_wkhtmltopdf(&self, bin: &Path, html_path: &Path, pdf_path: &Path) -> Result<()> {
        let mut cmd = Command::new(bin);

        cmd.arg("--page-size").arg("A4");
        cmd.arg("--margin-top").arg(format!("{}mm", PAGE_MARGIN_MM));
        cmd.arg("--margin-bottom")
            .arg(format!("{}mm", PAGE_MARGIN_MM));
        cmd.arg("--margin-left").arg(format!("{}mm", PAGE_MARGIN_MM));
        cmd.arg("--margin-right")
            .arg(format!("{}mm", PAGE_MARGIN_MM));

        // El logo y otros recursos se referencian como archivos locales
        cmd.arg("--enable-local-file-access");
        cmd.arg("--print-media-type");

        cmd.arg(html_path);
        cmd.arg(pdf_path);

        run_command(cmd, "wkhtmltopdf").await
    }

    async fn run_soffice(&self, bin: &Path, html_path: &Path) -> Result<()> {
        let out_dir = html_path
            .parent()
            .ok_or_else(|| anyhow!("La carta no tiene directorio padre: {:?}", html_path))?;

        let mut cmd = Command::new(bin);
        cmd.arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(html_path);

        run_command(cmd, "soffice").await
    }
}

async fn run_command(mut cmd: Command, name: &str) -> Result<()> {
    cmd.stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let output = timeout(PDF_GENERATION_TIMEOUT, cmd.output())
        .await
        .with_context(|| format!("Timeout ejecutando {name}"))?
        .with_context(|| format!("No se pudo lanzar {name}"))?;

    if !output.status.success() {
        let stderr_msg = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} falló: {}", name, stderr_msg));
    }
    Ok(())
}
