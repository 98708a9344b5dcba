//! Shared CLI utilities

use std::path::Path;

use reciprocal_core::config::Config;
use reciprocal_core::error::Result;
use reciprocal_core::fs::RealFileSystem;
use reciprocal_core::store::VaultStore;
use reciprocal_core::sync::SyncReport;

/// The vault store the CLI operates on.
pub type CliVault = VaultStore<RealFileSystem>;

/// Load config, printing (not failing on) a broken config file.
pub fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Could not read config, using defaults: {}", e);
            Config::default()
        }
    }
}

/// Open the vault from `--vault`, the config, or the current directory.
///
/// The root is canonicalized so paths reported by the file watcher match the
/// paths the store lists.
pub fn open_vault(config: &Config, explicit: Option<&Path>) -> Result<CliVault> {
    let dir = config.vault_dir(explicit)?;
    let root = std::fs::canonicalize(&dir).unwrap_or(dir);
    VaultStore::new(RealFileSystem, root)
}

/// Print what a sync pass did, one line per notice.
pub fn print_report(report: &SyncReport) {
    for notice in &report.notices {
        eprintln!("✗ {}", notice);
    }
    if report.writes() == 0 {
        println!("✓ Everything already reciprocal");
    } else {
        println!(
            "✓ Added {} and removed {} reciprocal reference(s)",
            report.inserted, report.removed
        );
    }
}
