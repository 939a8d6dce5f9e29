//! Argument parsing tests

use super::*;

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["impacto", "domains", "list", "--format", "json", "-q"]).unwrap();
    assert_eq!(cli.format, OutputFormat::Json);
    assert!(cli.quiet);
    assert!(matches!(
        cli.command,
        Commands::Domains {
            action: DomainAction::List
        }
    ));
}

#[test]
fn test_default_format_is_text() {
    let cli = Cli::try_parse_from(["impacto", "tools"]).unwrap();
    assert_eq!(cli.format, OutputFormat::Text);
    assert!(cli.config.is_none());
}

#[test]
fn test_feature_filter() {
    let cli = Cli::try_parse_from(["impacto", "features", "list", "--domain", "payments"]).unwrap();
    match cli.command {
        Commands::Features {
            action: FeatureAction::List { domain },
        } => assert_eq!(domain.as_deref(), Some("payments")),
        _ => panic!("expected features list"),
    }
}

#[test]
fn test_import_with_export() {
    let cli = Cli::try_parse_from([
        "impacto",
        "--config",
        "/tmp/impacto.toml",
        "import",
        "mapping.yaml",
        "--export",
        "out.yaml",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/impacto.toml")));
    match cli.command {
        Commands::Import { file, export } => {
            assert_eq!(file, PathBuf::from("mapping.yaml"));
            assert_eq!(export, Some(PathBuf::from("out.yaml")));
        }
        _ => panic!("expected import"),
    }
}

#[test]
fn test_lookup_test_entity() {
    let cli = Cli::try_parse_from(["impacto", "lookup", "test", "com.acme.PaymentTest"]).unwrap();
    match cli.command {
        Commands::Lookup {
            target: LookupTarget::Test { entity_id, sources },
        } => {
            assert_eq!(entity_id, "com.acme.PaymentTest");
            assert!(sources.mapping.is_none());
            assert!(sources.associate.is_empty());
        }
        _ => panic!("expected lookup test"),
    }
}

#[test]
fn test_lookup_collects_associations() {
    let cli = Cli::try_parse_from([
        "impacto",
        "lookup",
        "code",
        "com.acme.InvoiceWriter",
        "--associate",
        "invoice-writer:0.75",
        "--associate",
        "pdf-gen",
    ])
    .unwrap();
    match cli.command {
        Commands::Lookup {
            target: LookupTarget::Code { sources, .. },
        } => {
            assert_eq!(
                sources.associate,
                vec![
                    Association {
                        component_id: "invoice-writer".to_string(),
                        confidence: 0.75,
                    },
                    Association {
                        component_id: "pdf-gen".to_string(),
                        confidence: 1.0,
                    },
                ]
            );
        }
        _ => panic!("expected lookup code"),
    }
}

#[test]
fn test_association_confidence_is_bounded() {
    assert!(parse_association("pdf-gen:1.5").is_err());
    assert!(parse_association("pdf-gen:high").is_err());
    assert!(parse_association(":0.5").is_err());
    assert_eq!(parse_association("pdf-gen:0").unwrap().confidence, 0.0);
}

#[test]
fn test_rejects_unknown_format() {
    assert!(Cli::try_parse_from(["impacto", "tools", "--format", "xml"]).is_err());
}

#[test]
fn test_config_set_requires_value() {
    assert!(Cli::try_parse_from(["impacto", "config", "set", "remote.command"]).is_err());
}
