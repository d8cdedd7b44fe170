//! tests/letter_tests.rs
//! Pruebas de saludos, plantillas y renderizado de la carta.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use crate::config::mailer_config::AttachFormat;
    use crate::error::MailerError;
    use crate::services::letter_service::{
        fill_template, make_salutation, render_html_body, LetterContext, LetterService,
    };
    use crate::services::pdf_service::PdfService;
    use crate::tests::{config_with, contact, LETTER_TEMPLATE};

    fn ctx() -> LetterContext {
        LetterContext {
            salutation: "Dear Ms Ruiz".to_string(),
            company: "Ruiz / Hijos SA".to_string(),
            deadline: "March 31".to_string(),
            from_name: "Acme Sourcing".to_string(),
            reply_to: "buyer@example.com".to_string(),
            today: "01/15/2025".to_string(),
        }
    }

    #[test]
    fn test_salutation_by_gender() {
        assert_eq!(make_salutation("Ana María Ruiz", "f"), "Dear Ms Ruiz");
        assert_eq!(make_salutation("Bo Lind", "m"), "Dear Mr Lind");
        assert_eq!(make_salutation("Sam Smith", "x"), "Hello Sam Smith");
        assert_eq!(make_salutation("Cher", "f"), "Dear Ms Cher");
        assert_eq!(make_salutation("", "m"), "Dear Mr ");
    }

    #[test]
    fn test_context_for_contact() {
        let config = config_with(Path::new("body.html"), &[]);
        let ctx = LetterContext::for_contact(&config, &contact("a@example.com", "Bo Lind", "m", "Lind AB"));
        assert_eq!(ctx.salutation, "Dear Mr Lind");
        assert_eq!(ctx.company, "Lind AB");
        assert_eq!(ctx.deadline, "March 31");
        assert_eq!(ctx.from_name, "Acme Sourcing");
        assert_eq!(ctx.reply_to, "sender@example.com");
        assert_eq!(ctx.today.len(), "01/15/2025".len());
    }

    #[test]
    fn test_fill_template_known_keys() {
        let out = fill_template(
            "{salutation}, quote for {company} by { deadline } ({today}). {from_name} <{reply_to}>",
            &ctx(),
        )
        .unwrap();
        assert_eq!(
            out,
            "Dear Ms Ruiz, quote for Ruiz / Hijos SA by March 31 (01/15/2025). Acme Sourcing <buyer@example.com>"
        );
    }

    #[test]
    fn test_fill_template_escapes_and_logo_placeholder() {
        let out = fill_template("p {{ margin: 0 }} <img src=\"{logo_cid}\">", &ctx()).unwrap();
        assert_eq!(out, "p { margin: 0 } <img src=\"{logo_cid}\">");
    }

    #[test]
    fn test_fill_template_errors() {
        for template in ["{unknown}", "Hello {company", "a } b"] {
            assert!(
                matches!(fill_template(template, &ctx()), Err(MailerError::Render(_))),
                "{template}"
            );
        }
    }

    #[test]
    fn test_render_letter_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("letter.html");
        fs::write(&template, LETTER_TEMPLATE).unwrap();
        let service = LetterService::new(template, AttachFormat::Html, PdfService::unavailable());

        let path = service.render_letter(&ctx(), dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "Cover_Letter_Ruiz___Hijos_SA.html"
        );
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("<p>Dear Ms Ruiz,</p>"));
        assert!(html.contains("before March 31"));
    }

    #[test]
    fn test_render_letter_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let service = LetterService::new(
            dir.path().join("missing.html"),
            AttachFormat::Html,
            PdfService::unavailable(),
        );
        assert!(matches!(
            service.render_letter(&ctx(), dir.path()),
            Err(MailerError::Render(_))
        ));
    }

    #[tokio::test]
    async fn test_render_attachment_html() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("letter.html");
        fs::write(&template, LETTER_TEMPLATE).unwrap();
        let service = LetterService::new(template, AttachFormat::Html, PdfService::unavailable());

        let path = service.render_attachment(&ctx(), dir.path()).await.unwrap();
        assert_eq!(path.extension().unwrap(), "html");
    }

    #[tokio::test]
    async fn test_render_attachment_pdf_falls_back_to_html() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("letter.html");
        fs::write(&template, LETTER_TEMPLATE).unwrap();
        let service = LetterService::new(template, AttachFormat::Pdf, PdfService::unavailable());

        let path = service.render_attachment(&ctx(), dir.path()).await.unwrap();
        assert_eq!(path.extension().unwrap(), "html");
        assert!(path.exists());
    }

    #[test]
    fn test_render_html_body() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("body.html");
        fs::write(&template, "<p>{salutation}</p><p>{company}</p>").unwrap();

        let html = render_html_body(&template, &ctx()).unwrap();
        assert_eq!(html, "<p>Dear Ms Ruiz</p><p>Ruiz / Hijos SA</p>");
    }
}
