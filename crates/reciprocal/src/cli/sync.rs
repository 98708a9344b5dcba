//! `sync` command

use std::path::Path;

use reciprocal_core::sync::RelationSync;

use crate::cli::util::{load_config, open_vault, print_report};

/// Handle the sync command
/// Returns true on success, false on error
pub fn handle_sync(vault: Option<&Path>) -> bool {
    let config = load_config();
    let store = match open_vault(&config, vault) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ {}", e);
            return false;
        }
    };
    println!("Syncing {}", store.root().display());

    let mut sync = RelationSync::new(store, &config);
    match sync.reconcile_all() {
        Ok(report) => {
            print_report(&report);
            report.notices.is_empty()
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
