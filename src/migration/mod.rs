pub mod parsing;
pub mod resolver;

pub use parsing::{discover_migrations, load_migration_file};
pub use resolver::Resolver;

use crate::migration_tracking::calculate_checksum;
use crate::operations::Operation;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a migration by app and name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct MigrationKey {
    pub app: String,
    pub name: String,
}

impl MigrationKey {
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app, self.name)
    }
}

/// Parse `app/name` or `app.name`
impl FromStr for MigrationKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (app, name) = s
            .split_once('/')
            .or_else(|| s.split_once('.'))
            .ok_or_else(|| anyhow!("Invalid migration reference '{}': expected app/name", s))?;

        if app.is_empty() || name.is_empty() {
            return Err(anyhow!(
                "Invalid migration reference '{}': app and name must be non-empty",
                s
            ));
        }

        Ok(Self::new(app, name))
    }
}

/// A declared dependency on another migration.
///
/// Serialized either as an `[app, name]` pair or as `{swappable: SETTING}`,
/// which resolves to the first migration of the app configured for the setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Dependency {
    Migration(String, String),
    Swappable { swappable: String },
}

impl Dependency {
    pub fn on(app: impl Into<String>, name: impl Into<String>) -> Self {
        Dependency::Migration(app.into(), name.into())
    }

    pub fn swappable(setting: impl Into<String>) -> Self {
        Dependency::Swappable {
            swappable: setting.into(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Migration(app, name) => write!(f, "{}.{}", app, name),
            Dependency::Swappable { swappable } => write!(f, "${}", swappable),
        }
    }
}

/// An immutable, named set of schema operations with explicit dependencies
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Migration {
    pub app_name: String,
    pub migration_name: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

impl Migration {
    pub fn new(app_name: impl Into<String>, migration_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            migration_name: migration_name.into(),
            dependencies: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn depends_on(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn key(&self) -> MigrationKey {
        MigrationKey::new(&self.app_name, &self.migration_name)
    }

    /// Checksum of the canonical JSON form, used to detect edits after apply
    pub fn checksum(&self) -> serde_json::Result<String> {
        let canonical = serde_json::to_string(self)?;
        Ok(calculate_checksum(&canonical))
    }
}
