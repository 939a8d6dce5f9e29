//! Impacto CLI - business knowledge lookup for code changes

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use impacto_core::application::DomainResolver;
use impacto_core::config::Config;
use impacto_core::domain::{Component, Domain, Feature};
use impacto_core::infrastructure::InMemoryDomainRepository;
use impacto_core::infrastructure::catalog::ComponentCatalog;
use serde_json::json;
use tracing::debug;

type Resolver = DomainResolver<InMemoryDomainRepository>;

#[derive(Parser)]
#[command(name = "impacto")]
#[command(author, version, about = "Map code changes to business domains, features and components", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the documentation tool's search tools
    Tools,

    /// Query raw documentation
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Browse domains
    Domains {
        #[command(subcommand)]
        action: DomainAction,
    },

    /// Browse features
    Features {
        #[command(subcommand)]
        action: FeatureAction,
    },

    /// Browse components
    Components {
        #[command(subcommand)]
        action: ComponentAction,
    },

    /// Query the secondary catalog directly
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Import a mapping file
    Import {
        /// Mapping file (YAML)
        file: PathBuf,
        /// Write the resolved graph back out to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Export the resolved graph as a mapping file
    Export {
        /// Output file (YAML)
        file: PathBuf,
    },

    /// Find what a code or test entity belongs to
    Lookup {
        #[command(subcommand)]
        target: LookupTarget,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// Ask every documentation tool about a term
    Search { term: String },
}

#[derive(Subcommand)]
enum DomainAction {
    /// List all domains
    List,
    /// Show a domain and its features
    Show { id: String },
}

#[derive(Subcommand)]
enum FeatureAction {
    /// List features
    List {
        /// Only features owned by this domain
        #[arg(short, long)]
        domain: Option<String>,
    },
}

#[derive(Subcommand)]
enum ComponentAction {
    /// List components
    List {
        /// Only components owned by this feature
        #[arg(short, long)]
        feature: Option<String>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Catalog components
    Components,
    /// Catalog features
    Features,
}

#[derive(Subcommand)]
enum LookupTarget {
    /// A class, method or field id
    Code {
        entity_id: String,
        #[command(flatten)]
        sources: LookupSources,
    },
    /// A test class or method id
    Test {
        entity_id: String,
        #[command(flatten)]
        sources: LookupSources,
    },
}

#[derive(clap::Args)]
struct LookupSources {
    /// Mapping file to load first
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Associate the entity with a component first (`<component-id>[:confidence]`)
    #[arg(long, value_parser = parse_association)]
    associate: Vec<Association>,
}

/// Component link requested on the command line
#[derive(Debug, Clone, PartialEq)]
struct Association {
    component_id: String,
    confidence: f64,
}

fn parse_association(raw: &str) -> Result<Association, String> {
    let (component_id, confidence) = match raw.rsplit_once(':') {
        Some((id, value)) => {
            let confidence: f64 = value
                .trim()
                .parse()
                .map_err(|_| format!("invalid confidence '{}'", value))?;
            if !(0.0..=1.0).contains(&confidence) {
                return Err(format!("confidence {} is outside 0..=1", confidence));
            }
            (id.trim(), confidence)
        }
        None => (raw.trim(), 1.0),
    };
    if component_id.is_empty() {
        return Err("component id must not be empty".to_string());
    }
    Ok(Association {
        component_id: component_id.to_string(),
        confidence,
    })
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all configuration values
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env may carry RUST_LOG, so it loads before the subscriber
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "impacto=info,impacto_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        report(&error);
        std::process::exit(1);
    }
    Ok(())
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<impacto_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", error),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let quiet = cli.quiet;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { action } => cmd_config(action, config_path, format),
        Commands::Tools => cmd_tools(&connect(config_path)?, format).await,
        Commands::Docs {
            action: DocsAction::Search { term },
        } => cmd_docs_search(&connect(config_path)?, &term, format).await,
        Commands::Domains { action } => cmd_domains(&connect(config_path)?, action, format).await,
        Commands::Features { action } => {
            cmd_features(&connect(config_path)?, action, format).await
        }
        Commands::Components { action } => {
            cmd_components(&connect(config_path)?, action, format).await
        }
        Commands::Catalog { action } => cmd_catalog(&connect(config_path)?, action, format).await,
        Commands::Import { file, export } => {
            cmd_import(&connect(config_path)?, &file, export.as_deref(), format, quiet).await
        }
        Commands::Export { file } => {
            cmd_export(&connect(config_path)?, &file, format, quiet).await
        }
        Commands::Lookup { target } => cmd_lookup(&connect(config_path)?, target, format).await,
    }
}

fn connect(config_path: Option<&Path>) -> anyhow::Result<Resolver> {
    let config = load_config(config_path)?;
    Ok(DomainResolver::from_config(&config)?)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env()?;
    debug!(command = %config.remote.command, catalog = %config.secondary.base_url, "Configuration loaded");
    Ok(config)
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_domains(domains: &[Domain], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(domains)?);
    }
    if domains.is_empty() {
        println!("No domains found.");
    }
    for domain in domains {
        println!("{:<32} {}", domain.id, domain.name);
    }
    Ok(())
}

fn print_features(features: &[Feature], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(features)?);
    }
    if features.is_empty() {
        println!("No features found.");
    }
    for feature in features {
        println!("{:<32} {:<32} (domain: {})", feature.id, feature.name, feature.domain_id);
    }
    Ok(())
}

fn print_components(components: &[Component], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(components)?);
    }
    if components.is_empty() {
        println!("No components found.");
    }
    for component in components {
        println!(
            "{:<32} {:<32} (feature: {})",
            component.id, component.name, component.feature_id
        );
    }
    Ok(())
}

async fn cmd_tools(resolver: &Resolver, format: OutputFormat) -> anyhow::Result<()> {
    let tools = resolver.documentation().tools().await?;
    if format == OutputFormat::Json {
        return print_json(&serde_json::to_value(&tools)?);
    }
    if tools.is_empty() {
        println!("No documentation tools available.");
    }
    for tool in tools {
        println!("{:<32} {}", tool.name, tool.description);
    }
    Ok(())
}

async fn cmd_docs_search(resolver: &Resolver, term: &str, format: OutputFormat) -> anyhow::Result<()> {
    let digest = resolver.documentation().search(term).await?;
    if format == OutputFormat::Json {
        return print_json(&json!({ "term": term, "documentation": digest }));
    }
    if digest.is_empty() {
        println!("No documentation found for '{}'.", term);
    } else {
        println!("{}", digest);
    }
    Ok(())
}

async fn cmd_domains(resolver: &Resolver, action: DomainAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        DomainAction::List => {
            let domains = resolver.get_all_domains().await?;
            print_domains(&domains, format)
        }
        DomainAction::Show { id } => {
            let domain = resolver.get_domain_by_id(&id).await?.ok_or_else(|| {
                impacto_core::Error::not_found(impacto_core::domain::EntityKind::Domain, &id)
            })?;
            let features = resolver.get_features_by_domain_id(&domain.id).await?;

            if format == OutputFormat::Json {
                return print_json(&json!({ "domain": domain, "features": features }));
            }
            println!("{} ({})", domain.name, domain.id);
            if !domain.description.is_empty() {
                println!("  {}", domain.description);
            }
            if let Some(parent) = resolver.parent_of(&domain).await? {
                println!("  Parent: {}", parent.name);
            }
            println!();
            print_features(&features, format)
        }
    }
}

async fn cmd_features(resolver: &Resolver, action: FeatureAction, format: OutputFormat) -> anyhow::Result<()> {
    let FeatureAction::List { domain } = action;
    let features = match domain {
        Some(domain_id) => resolver.get_features_by_domain_id(&domain_id).await?,
        None => resolver.get_all_features().await?,
    };
    print_features(&features, format)
}

async fn cmd_components(
    resolver: &Resolver,
    action: ComponentAction,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let ComponentAction::List { feature } = action;
    let components = match feature {
        Some(feature_id) => resolver.get_components_by_feature_id(&feature_id).await?,
        None => resolver.get_all_components().await?,
    };
    print_components(&components, format)
}

async fn cmd_catalog(resolver: &Resolver, action: CatalogAction, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = resolver.documentation().catalog();
    match action {
        CatalogAction::Components => {
            let components = catalog.get_all_components().await;
            if format == OutputFormat::Json {
                return print_json(&serde_json::to_value(&components)?);
            }
            for component in components {
                println!(
                    "{:<16} {:<24} [{}] {}",
                    component.id, component.name, component.component_type, component.description
                );
            }
        }
        CatalogAction::Features => {
            let features = catalog.get_all_features().await;
            if format == OutputFormat::Json {
                return print_json(&serde_json::to_value(&features)?);
            }
            for feature in features {
                println!(
                    "{:<24} {:<28} {}",
                    feature.id,
                    feature.name,
                    feature.components.join(", ")
                );
            }
        }
    }
    Ok(())
}

async fn cmd_import(
    resolver: &Resolver,
    file: &Path,
    export: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let summary = resolver.import_from_config(file).await?;
    let exported = match export {
        Some(out) => Some(resolver.export_to_config(out).await?),
        None => None,
    };

    if format == OutputFormat::Json {
        return print_json(&json!({ "summary": summary, "exported_domains": exported }));
    }
    if !quiet {
        println!(
            "Imported {}: {} created, {} already known.",
            file.display(),
            summary.created(),
            summary.existing()
        );
        println!(
            "  Domains: {} created, {} known",
            summary.domains_created, summary.domains_existing
        );
        println!(
            "  Features: {} created, {} known",
            summary.features_created, summary.features_existing
        );
        println!(
            "  Components: {} created, {} known",
            summary.components_created, summary.components_existing
        );
        if let (Some(out), Some(count)) = (export, exported) {
            println!("Exported {} domain(s) to {}", count, out.display());
        }
    }
    Ok(())
}

async fn cmd_export(resolver: &Resolver, file: &Path, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let count = resolver.export_to_config(file).await?;
    if format == OutputFormat::Json {
        return print_json(&json!({ "file": file.display().to_string(), "domains": count }));
    }
    if !quiet {
        println!("Exported {} domain(s) to {}", count, file.display());
    }
    Ok(())
}

async fn cmd_lookup(resolver: &Resolver, target: LookupTarget, format: OutputFormat) -> anyhow::Result<()> {
    let (entity_id, sources, is_test) = match target {
        LookupTarget::Code { entity_id, sources } => (entity_id, sources, false),
        LookupTarget::Test { entity_id, sources } => (entity_id, sources, true),
    };
    if let Some(mapping) = &sources.mapping {
        resolver.import_from_config(mapping).await?;
    }
    for association in &sources.associate {
        if is_test {
            resolver
                .associate_test_entity_with_component(
                    &entity_id,
                    &association.component_id,
                    association.confidence,
                )
                .await?;
        } else {
            resolver
                .associate_code_entity_with_component(
                    &entity_id,
                    &association.component_id,
                    association.confidence,
                )
                .await?;
        }
    }

    let (components, features, domains) = if is_test {
        (
            resolver.get_components_for_test_entity(&entity_id).await?,
            resolver.get_features_for_test_entity(&entity_id).await?,
            resolver.get_domains_for_test_entity(&entity_id).await?,
        )
    } else {
        (
            resolver.get_components_for_code_entity(&entity_id).await?,
            resolver.get_features_for_code_entity(&entity_id).await?,
            resolver.get_domains_for_code_entity(&entity_id).await?,
        )
    };

    if format == OutputFormat::Json {
        return print_json(&json!({
            "entity_id": entity_id,
            "components": components,
            "features": features,
            "domains": domains,
        }));
    }

    if components.is_empty() {
        println!("'{}' is not associated with any component.", entity_id);
        return Ok(());
    }
    println!("Components:");
    for component in &components {
        println!("  {} ({})", component.name, component.id);
    }
    println!("Features:");
    for feature in &features {
        println!("  {} ({})", feature.name, feature.id);
    }
    println!("Domains:");
    for domain in &domains {
        println!("  {} ({})", domain.name, domain.id);
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, path: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    match action {
        ConfigAction::Show => {
            let mut config = Config::load_from(&config_path)?;
            config.apply_env()?;
            let items = config.list()?;
            if format == OutputFormat::Json {
                let map: serde_json::Map<String, serde_json::Value> = items
                    .into_iter()
                    .map(|(key, value)| (key, serde_json::Value::String(value)))
                    .collect();
                return print_json(&serde_json::Value::Object(map));
            }
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Get { key } => {
            let mut config = Config::load_from(&config_path)?;
            config.apply_env()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(&config_path)?;
            config.set(&key, &value)?;
            match path {
                Some(path) => config.save_to(path)?,
                None => config.save()?,
            }
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod main_tests;
