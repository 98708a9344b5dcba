//! Config command handlers

use std::path::PathBuf;

use reciprocal_core::config::{Config, PropertyPair};
use reciprocal_core::patch::RemovalPolicy;

use crate::cli::args::ConfigCommands;
use crate::cli::util::load_config;

/// Handle config subcommands; no subcommand shows the config.
/// Returns true on success, false on error
pub fn handle_config_command(command: Option<ConfigCommands>) -> bool {
    match command.unwrap_or(ConfigCommands::Show) {
        ConfigCommands::Show => handle_show(),
        ConfigCommands::Path => handle_path(),
        ConfigCommands::AddPair {
            property_a,
            property_b,
        } => handle_add_pair(PropertyPair::new(property_a, property_b)),
        ConfigCommands::RemovePair {
            property_a,
            property_b,
        } => handle_remove_pair(&PropertyPair::new(property_a, property_b)),
        ConfigCommands::Policy { policy } => handle_policy(policy.into()),
        ConfigCommands::Vault { path } => handle_vault(path),
    }
}

fn handle_show() -> bool {
    let config = load_config();
    match Config::config_path() {
        Some(path) if path.exists() => println!("# {}", path.display()),
        Some(path) => println!("# {} (not created yet, showing defaults)", path.display()),
        None => println!("# no config directory, showing defaults"),
    }
    match toml::to_string_pretty(&config) {
        Ok(contents) => {
            print!("{}", contents);
            true
        }
        Err(e) => {
            eprintln!("✗ Error serializing config: {}", e);
            false
        }
    }
}

fn handle_path() -> bool {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            true
        }
        None => {
            eprintln!("✗ Could not determine config directory");
            false
        }
    }
}

fn handle_add_pair(pair: PropertyPair) -> bool {
    let mut config = load_config();
    let label = pair.to_string();
    if !config.add_pair(pair) {
        println!("✓ {} is already configured", label);
        return true;
    }
    save(&config, &format!("Added {}", label))
}

fn handle_remove_pair(pair: &PropertyPair) -> bool {
    let mut config = load_config();
    if !config.remove_pair(pair) {
        eprintln!("✗ {} is not configured", pair);
        return false;
    }
    save(&config, &format!("Removed {}", pair))
}

fn handle_policy(policy: RemovalPolicy) -> bool {
    let mut config = load_config();
    config.removal_policy = policy;
    let label = match policy {
        RemovalPolicy::RemoveProperty => "Emptied properties will be removed",
        RemovalPolicy::KeepEmptyArray => "Emptied properties will be kept as []",
    };
    save(&config, label)
}

fn handle_vault(path: PathBuf) -> bool {
    let path = std::fs::canonicalize(&path).unwrap_or(path);
    if !path.is_dir() {
        eprintln!("✗ Vault not found at '{}'", path.display());
        return false;
    }
    let mut config = load_config();
    config.vault = Some(path.clone());
    save(&config, &format!("Default vault set to {}", path.display()))
}

fn save(config: &Config, message: &str) -> bool {
    match config.save() {
        Ok(()) => {
            println!("✓ {}", message);
            true
        }
        Err(e) => {
            eprintln!("✗ Error saving config: {}", e);
            false
        }
    }
}
