use crate::settings::{Settings, SwappableModel};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw configuration input - all fields Optional for merging
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigInput {
    pub directories: Option<DirectoriesInput>,
    pub history: Option<HistoryInput>,
    pub settings: Option<SettingsInput>,
}

/// Resolved configuration with all defaults applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub directories: Directories,
    pub history: History,
    pub settings: Settings,
}

// Directory configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DirectoriesInput {
    pub migrations_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Directories {
    pub migrations: String,
}

// Applied-history configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HistoryInput {
    pub file: Option<String>,
    pub tracking_table: Option<TrackingTableInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TrackingTableInput {
    pub schema: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct History {
    pub file: String,
    pub tracking_table: TrackingTable,
}

/// Table the `sql` command records applied migrations in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingTable {
    pub schema: String,
    pub name: String,
}

// Settings handed to the resolver and applier
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SettingsInput {
    pub swappable: Option<BTreeMap<String, SwappableModel>>,
}

// CLI argument groups for command-specific options
#[derive(Debug, Clone, Default, Args)]
pub struct DirectoryArgs {
    #[arg(long, help = "Migrations directory path")]
    pub migrations_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct HistoryArgs {
    #[arg(long, help = "Applied-migration history file")]
    pub history_file: Option<String>,
}

// Conversion functions from CLI args to config input
impl From<DirectoryArgs> for DirectoriesInput {
    fn from(args: DirectoryArgs) -> Self {
        Self {
            migrations_dir: args.migrations_dir,
        }
    }
}

impl From<HistoryArgs> for HistoryInput {
    fn from(args: HistoryArgs) -> Self {
        Self {
            file: args.history_file,
            tracking_table: None, // Tracking table comes from file only
        }
    }
}
