//! tests/pdf_tests.rs
//! Pruebas unitarias para `PdfService`.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Instant;

    use crate::config::mailer_config::AttachFormat;
    use crate::services::letter_service::{LetterContext, LetterService};
    use crate::services::pdf_service::PdfService;

    const SIMPLE_LETTER: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><meta charset="utf-8"><title>Cover letter</title></head>
        <body>
            <p>Dear Ms Ruiz,</p>
            <p>Please find attached our request for quotation.</p>
        </body>
        </html>
    "#;

    #[tokio::test]
    async fn test_unavailable_service_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("letter.html");
        fs::write(&html, SIMPLE_LETTER).unwrap();

        let service = PdfService::unavailable();
        assert!(service.convert_to_pdf(&html).await.is_none());
        assert!(!html.with_extension("pdf").exists());
    }

    /// Conversor falso que termina con éxito sin escribir nada
    /// (como LibreOffice cuando otra instancia tiene el perfil tomado).
    #[cfg(unix)]
    fn silent_converter(dir: &std::path::Path) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let bin = dir.join("soffice");
        fs::write(&bin, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
        bin
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_pdf_is_not_reused() {
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("Cover_Letter_Acme.html");
        fs::write(&html, SIMPLE_LETTER).unwrap();
        let stale = html.with_extension("pdf");
        fs::write(&stale, "%PDF letter for Dear Mr Smith").unwrap();

        let service = PdfService::with_converters(None, Some(silent_converter(dir.path())));
        assert!(service.convert_to_pdf(&html).await.is_none());
        assert!(!stale.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_same_company_letters_fall_back_to_fresh_html() {
        let dir = tempfile::tempdir().unwrap();
        let bin_dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("letter.html");
        fs::write(&template, "<p>{salutation}</p>").unwrap();
        let out_dir = dir.path().join("work");
        fs::create_dir_all(&out_dir).unwrap();
        fs::write(
            out_dir.join("Cover_Letter_Acme.pdf"),
            "%PDF letter for Dear Mr Smith",
        )
        .unwrap();

        let service = LetterService::new(
            template,
            AttachFormat::Pdf,
            PdfService::with_converters(None, Some(silent_converter(bin_dir.path()))),
        );
        let ctx = LetterContext {
            salutation: "Dear Ms Jones".to_string(),
            company: "Acme".to_string(),
            deadline: String::new(),
            from_name: "Acme Sourcing".to_string(),
            reply_to: "buyer@example.com".to_string(),
            today: "01/15/2025".to_string(),
        };

        let attached = service.render_attachment(&ctx, &out_dir).await.unwrap();
        assert_eq!(attached.extension().unwrap(), "html");
        assert_eq!(fs::read_to_string(&attached).unwrap(), "<p>Dear Ms Jones</p>");
        assert!(!out_dir.join("Cover_Letter_Acme.pdf").exists());
    }

    /// Solo corre de verdad si wkhtmltopdf está instalado.
    #[tokio::test]
    async fn test_convert_with_wkhtmltopdf() {
        if which::which("wkhtmltopdf").is_err() {
            println!("wkhtmltopdf no instalado, se omite la prueba");
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("Cover_Letter_Ruiz_SA.html");
        fs::write(&html, SIMPLE_LETTER).unwrap();

        let start = Instant::now();
        let pdf = PdfService::new()
            .convert_to_pdf(&html)
            .await
            .expect("wkhtmltopdf should produce a PDF");
        println!("PDF generado en {:?}", start.elapsed());

        assert_eq!(pdf, html.with_extension("pdf"));
        let bytes = fs::read(&pdf).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "output is not a PDF");
    }
}
