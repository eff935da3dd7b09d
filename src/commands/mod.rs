pub mod apply;
pub mod plan;
pub mod sql;
pub mod status;

// Re-export all command functions
pub use apply::{ApplyOptions, cmd_apply};
pub use plan::cmd_plan;
pub use sql::cmd_sql;
pub use status::cmd_status;

use crate::config::Config;
use crate::migration::{Migration, discover_migrations};
use crate::migration_tracking::FileHistory;
use anyhow::Result;
use std::path::Path;

/// Migration files and applied history for one project
pub struct Project {
    pub migrations: Vec<Migration>,
    pub history: FileHistory,
}

impl Project {
    pub fn load(config: &Config, root_dir: &Path) -> Result<Self> {
        let migrations_dir = root_dir.join(&config.directories.migrations);
        let migrations = discover_migrations(&migrations_dir)?;
        let history = FileHistory::open(root_dir.join(&config.history.file))?;

        Ok(Self {
            migrations,
            history,
        })
    }
}
