/// Clap argument definitions
mod args;

/// Config command handlers
mod config;

/// `insert`, `remove` and `links` on a single file
mod patch;

/// `sync` command (vault-wide reconciliation)
mod sync;

/// Shared CLI utilities
mod util;

/// `watch` command (filesystem notifications)
mod watch;

use clap::Parser;

use args::{Cli, Commands};

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Execute commands and track success
    let success = match cli.command {
        Commands::Insert {
            file,
            note,
            property,
            dry_run,
        } => patch::handle_insert(&file, &note, &property, dry_run),

        Commands::Remove {
            file,
            note,
            property,
            dry_run,
            keep_empty,
        } => patch::handle_remove(&file, &note, &property, dry_run, keep_empty),

        Commands::Links { file } => patch::handle_links(&file),

        Commands::Sync => sync::handle_sync(cli.vault.as_deref()),

        Commands::Watch { sync_first } => watch::handle_watch(cli.vault.as_deref(), sync_first),

        Commands::Config { command } => config::handle_config_command(command),
    };

    if !success {
        std::process::exit(1);
    }
}

/// `warn` by default, `info` with `--verbose`; `RUST_LOG` wins over both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}
