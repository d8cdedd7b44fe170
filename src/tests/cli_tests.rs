//! tests/cli_tests.rs
//! Pruebas de la línea de comandos.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::cli::Cli;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("mass_mailer").chain(args.iter().copied()))
    }

    #[test]
    fn test_dry_run_never_saves_eml() {
        let cli = parse(&[
            "--contacts", "c.csv", "--letter", "l.html", "--attachment", "a.xlsx",
            "--save-eml-out", "eml", "--dry-run",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.eml_dir(), None);
    }

    #[test]
    fn test_send_run_keeps_eml_dir() {
        let cli = parse(&[
            "--contacts", "c.csv", "--letter", "l.html", "--attachment", "a.xlsx",
            "--save-eml-out", "eml",
        ])
        .unwrap();
        assert_eq!(cli.eml_dir(), Some(PathBuf::from("eml")));
        assert_eq!(cli.limit, 0);
        assert_eq!(cli.log_dir, PathBuf::from("."));
    }

    #[test]
    fn test_contacts_and_retry_log_are_exclusive() {
        let result = parse(&[
            "--contacts", "c.csv", "--retry-from-log", "send_log_x.csv",
            "--letter", "l.html", "--attachment", "a.xlsx",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_letter_and_attachment_required_unless_check_smtp() {
        assert!(parse(&["--contacts", "c.csv"]).is_err());
        let cli = parse(&["--check-smtp"]).unwrap();
        assert!(cli.check_smtp);
        assert!(cli.letter.is_none());
    }
}
