use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use reciprocal_core::patch::RemovalPolicy;

#[derive(Parser)]
#[command(name = "reciprocal")]
#[command(about = "Keep front-matter relations between markdown notes bidirectional", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Vault directory (overrides the configured vault)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Log what is being changed
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a [[note]] reference to a property of one file
    Insert {
        /// Markdown file to edit
        file: PathBuf,

        /// Note name to reference
        note: String,

        /// Front-matter property
        property: String,

        /// Print the result instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove a [[note]] reference from a property of one file
    Remove {
        /// Markdown file to edit
        file: PathBuf,

        /// Note name whose reference is removed
        note: String,

        /// Front-matter property
        property: String,

        /// Print the result instead of writing it
        #[arg(long)]
        dry_run: bool,

        /// Leave `property: []` instead of dropping an emptied property
        #[arg(long)]
        keep_empty: bool,
    },

    /// Show the references a file holds in each configured property
    Links {
        /// Markdown file to inspect
        file: PathBuf,
    },

    /// Add every missing reciprocal reference in the vault
    Sync,

    /// Keep relations reciprocal while notes change
    Watch {
        /// Reconcile the whole vault before watching
        #[arg(long)]
        sync_first: bool,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,

    /// Print the config file location
    Path,

    /// Add a property pair
    AddPair {
        /// Property on the source note
        property_a: String,

        /// Property on the linked note
        property_b: String,
    },

    /// Remove a property pair (either orientation)
    RemovePair {
        /// Property on the source note
        property_a: String,

        /// Property on the linked note
        property_b: String,
    },

    /// Set what happens when the last reference leaves a property
    Policy {
        #[arg(value_enum)]
        policy: PolicyArg,
    },

    /// Set the default vault directory
    Vault {
        /// Vault directory
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Drop the property line
    RemoveProperty,
    /// Keep the property as `[]`
    KeepEmptyArray,
}

impl From<PolicyArg> for RemovalPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RemoveProperty => RemovalPolicy::RemoveProperty,
            PolicyArg::KeepEmptyArray => RemovalPolicy::KeepEmptyArray,
        }
    }
}
