use crate::config::{merge::Merge, types::*};
use crate::constants::{HISTORY_FILE_ENV, MIGRATIONS_DIR_ENV};
use crate::settings::Settings;
use anyhow::{Result, bail};

pub struct ConfigBuilder {
    config_input: ConfigInput,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config_input: ConfigInput::default(),
        }
    }

    pub fn with_file(mut self, file_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(file_input);
        self
    }

    /// Layer `MIGRUN_*` environment variables over the file configuration
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.config_input = self.config_input.merge(env_input(lookup));
        self
    }

    pub fn with_cli_args(mut self, cli_input: ConfigInput) -> Self {
        self.config_input = self.config_input.merge(cli_input);
        self
    }

    pub fn resolve(self) -> Result<Config> {
        let defaults = Config::default();

        Ok(Config {
            directories: self.resolve_directories(&defaults.directories),
            history: self.resolve_history(&defaults.history),
            settings: self.resolve_settings()?,
        })
    }

    fn resolve_directories(&self, defaults: &Directories) -> Directories {
        let dir_input = self.config_input.directories.as_ref();

        Directories {
            migrations: dir_input
                .and_then(|d| d.migrations_dir.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.migrations.clone()),
        }
    }

    fn resolve_history(&self, defaults: &History) -> History {
        let history_input = self.config_input.history.as_ref();

        let tracking_table = history_input
            .and_then(|h| h.tracking_table.as_ref())
            .map(|t| TrackingTable {
                schema: t
                    .schema
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| defaults.tracking_table.schema.clone()),
                name: t
                    .name
                    .as_ref()
                    .cloned()
                    .unwrap_or_else(|| defaults.tracking_table.name.clone()),
            })
            .unwrap_or_else(|| defaults.tracking_table.clone());

        History {
            file: history_input
                .and_then(|h| h.file.as_ref())
                .cloned()
                .unwrap_or_else(|| defaults.file.clone()),
            tracking_table,
        }
    }

    fn resolve_settings(&self) -> Result<Settings> {
        let swappable = self
            .config_input
            .settings
            .as_ref()
            .and_then(|s| s.swappable.clone())
            .unwrap_or_default();

        for (setting, model) in &swappable {
            if model.app.is_empty() || model.table.is_empty() {
                bail!(
                    "Swappable setting '{}' must name both an app and a table",
                    setting
                );
            }
        }

        Ok(Settings::from_swappable(swappable))
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment layer built from a variable lookup
fn env_input(lookup: impl Fn(&str) -> Option<String>) -> ConfigInput {
    let migrations_dir = lookup(MIGRATIONS_DIR_ENV);
    let history_file = lookup(HISTORY_FILE_ENV);

    ConfigInput {
        directories: migrations_dir.map(|dir| DirectoriesInput {
            migrations_dir: Some(dir),
        }),
        history: history_file.map(|file| HistoryInput {
            file: Some(file),
            tracking_table: None,
        }),
        settings: None,
    }
}
