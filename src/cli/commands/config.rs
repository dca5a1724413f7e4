//! `vct config` command - Configuration management
//!
//! Provides commands to view and modify toolkit configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::discover_workspace;
use crate::cli::GlobalOpts;
use crate::core::config::DEFAULT_DATABASE;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., author, database)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("author", "Author stamped on imported documents"),
    ("database", "Record store path, relative to the workspace root"),
    ("default_export_format", "Export format when --format is not given (csv, json, spreadsheet)"),
    ("max_upload_bytes", "Largest accepted import file, in bytes"),
    ("notification_duration_secs", "Seconds a notification stays visible"),
    ("log_level", "Log filter when VCT_LOG is unset"),
];

const NUMERIC_KEYS: &[&str] = &["max_upload_bytes", "notification_duration_secs"];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Set(args) => run_set(args, global),
        ConfigCommands::Unset(args) => run_unset(args, global),
        ConfigCommands::Path => run_path(global),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let workspace = discover_workspace(global).ok();
    let config = Config::load(workspace.as_ref());
    let values = effective_values(&config, workspace.as_ref().map(|w| w.root()));

    if let Some(key) = &args.key {
        let (_, value) = values
            .iter()
            .find(|(k, _)| k == key)
            .ok_or_else(|| unknown_key(key))?;
        println!("{}", value);
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, value) in &values {
        println!("  {}: {}", style(key).cyan(), style(value).yellow());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (VCT_AUTHOR, VCT_DATABASE)");
    println!("  2. Workspace config (.vct/config.yaml)");
    println!("  3. Global config (~/.config/vct/config.yaml)");

    Ok(())
}

/// Every key with its effective value, defaults included
fn effective_values(config: &Config, root: Option<&Path>) -> Vec<(String, String)> {
    let database = config
        .database
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
    let database = match root {
        Some(root) => root.join(database),
        None => database,
    };
    vec![
        ("author".into(), config.author()),
        ("database".into(), database.display().to_string()),
        ("default_export_format".into(), config.export_format().to_string()),
        ("max_upload_bytes".into(), config.max_upload_bytes().to_string()),
        (
            "notification_duration_secs".into(),
            config.notification_duration().as_secs().to_string(),
        ),
        ("log_level".into(), config.log_level().to_string()),
    ]
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    if !VALID_KEYS.iter().any(|(k, _)| *k == args.key) {
        return Err(unknown_key(&args.key));
    }
    let config_path = config_path(args.global, global)?;

    let mut config_map = read_mapping(&config_path)?;
    let value = yaml_value(&args.key, &args.value)?;
    if let serde_yml::Value::Mapping(map) = &mut config_map {
        map.insert(serde_yml::Value::String(args.key.clone()), value);
    }

    // Reject values the loader would not accept
    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    serde_yml::from_str::<Config>(&yaml)
        .map_err(|e| miette::miette!("invalid value for '{}': {}", args.key, e))?;

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs, global: &GlobalOpts) -> Result<()> {
    let config_path = config_path(args.global, global)?;

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = match &mut config_map {
        serde_yml::Value::Mapping(map) => map
            .remove(&serde_yml::Value::String(args.key.clone()))
            .is_some(),
        _ => false,
    };

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path(global: &GlobalOpts) -> Result<()> {
    let global_path = global_config_path()?;

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    print_exists(&global_path, 9);

    println!();
    match discover_workspace(global) {
        Ok(workspace) => {
            let path = workspace.vct_dir().join("config.yaml");
            println!("  {} {}", style("Workspace:").cyan(), path.display());
            print_exists(&path, 12);
        }
        Err(_) => println!(
            "  {} {}",
            style("Workspace:").cyan(),
            style("(not in a content workspace)").dim()
        ),
    }

    Ok(())
}

fn print_exists(path: &Path, indent: usize) {
    let marker = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("{:indent$}{}", "", marker, indent = indent);
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<28} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'vct config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn unknown_key(key: &str) -> miette::Report {
    let valid: Vec<&str> = VALID_KEYS.iter().map(|(k, _)| *k).collect();
    miette::miette!(
        help = format!("valid keys: {}", valid.join(", ")),
        "unknown configuration key '{}'",
        key
    )
}

fn global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn config_path(use_global: bool, global: &GlobalOpts) -> Result<PathBuf> {
    if use_global {
        global_config_path()
    } else {
        Ok(discover_workspace(global)?.vct_dir().join("config.yaml"))
    }
}

/// Existing config as a YAML mapping; missing, empty or comment-only files yield an empty one
fn read_mapping(path: &Path) -> Result<serde_yml::Value> {
    if !path.exists() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value =
        serde_yml::from_str(&content).unwrap_or(serde_yml::Value::Mapping(Default::default()));
    Ok(match parsed {
        serde_yml::Value::Mapping(_) => parsed,
        _ => serde_yml::Value::Mapping(Default::default()),
    })
}

fn yaml_value(key: &str, value: &str) -> Result<serde_yml::Value> {
    if NUMERIC_KEYS.contains(&key) {
        let n: u64 = value
            .parse()
            .map_err(|_| miette::miette!("'{}' must be a whole number, got '{}'", key, value))?;
        return Ok(serde_yml::Value::Number(n.into()));
    }
    Ok(serde_yml::Value::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_value_types() {
        assert_eq!(
            yaml_value("max_upload_bytes", "2048").unwrap(),
            serde_yml::Value::Number(2048u64.into())
        );
        assert!(yaml_value("notification_duration_secs", "soon").is_err());
        assert_eq!(
            yaml_value("author", "Misaki").unwrap(),
            serde_yml::Value::String("Misaki".into())
        );
    }

    #[test]
    fn test_read_mapping_handles_comment_only_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "# nothing here\n").unwrap();
        assert!(read_mapping(&path).unwrap().as_mapping().unwrap().is_empty());
    }

    #[test]
    fn test_effective_values_cover_every_key() {
        let values = effective_values(&Config::default(), None);
        for (key, _) in VALID_KEYS {
            assert!(values.iter().any(|(k, _)| k == key), "missing {key}");
        }
    }
}
