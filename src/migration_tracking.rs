//! Persisted record of applied migrations
//!
//! The history is an explicit set keyed by `(app_name, migration_name)`. It is
//! read to determine the pending set and appended to after each successful
//! migration.

use crate::config::types::TrackingTable;
use crate::migration::MigrationKey;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Record representing a migration in the history
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppliedMigration {
    pub app_name: String,
    pub migration_name: String,
    pub applied_at: DateTime<Utc>,
    pub checksum: String,
}

impl AppliedMigration {
    pub fn new(key: &MigrationKey, checksum: impl Into<String>) -> Self {
        Self {
            app_name: key.app.clone(),
            migration_name: key.name.clone(),
            applied_at: Utc::now(),
            checksum: checksum.into(),
        }
    }

    pub fn key(&self) -> MigrationKey {
        MigrationKey::new(&self.app_name, &self.migration_name)
    }
}

/// Read/write contract for the applied-migration history
pub trait HistoryStore {
    /// All recorded migrations, in the order they were applied
    fn applied(&self) -> &[AppliedMigration];

    /// Record a migration as applied. Recording the same key twice is an error.
    fn record(&mut self, entry: AppliedMigration) -> Result<()>;

    fn find(&self, key: &MigrationKey) -> Option<&AppliedMigration> {
        self.applied()
            .iter()
            .find(|entry| entry.app_name == key.app && entry.migration_name == key.name)
    }

    fn contains(&self, key: &MigrationKey) -> bool {
        self.find(key).is_some()
    }
}

/// History held only in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    entries: Vec<AppliedMigration>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistory {
    fn applied(&self) -> &[AppliedMigration] {
        &self.entries
    }

    fn record(&mut self, entry: AppliedMigration) -> Result<()> {
        if self.contains(&entry.key()) {
            bail!("Migration {} is already recorded as applied", entry.key());
        }
        self.entries.push(entry);
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct HistoryDocument {
    migrations: Vec<AppliedMigration>,
}

/// History persisted as a JSON document, rewritten atomically on every record
#[derive(Debug)]
pub struct FileHistory {
    path: PathBuf,
    entries: Vec<AppliedMigration>,
}

impl FileHistory {
    /// Open the history at `path`; a missing file is an empty history
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read history file {}", path.display()))?;
            let document: HistoryDocument = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid history file {}", path.display()))?;
            document.migrations
        } else {
            debug!("History file {} does not exist yet", path.display());
            Vec::new()
        };

        info!(
            "Loaded {} applied migrations from {}",
            entries.len(),
            path.display()
        );

        Ok(Self { path, entries })
    }

    fn persist(&self, entries: &[AppliedMigration]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create history directory {}", dir.display()))?;

        let document = HistoryDocument {
            migrations: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path)
            .with_context(|| format!("Failed to write history file {}", self.path.display()))?;

        Ok(())
    }
}

impl HistoryStore for FileHistory {
    fn applied(&self) -> &[AppliedMigration] {
        &self.entries
    }

    fn record(&mut self, entry: AppliedMigration) -> Result<()> {
        if self.contains(&entry.key()) {
            bail!("Migration {} is already recorded as applied", entry.key());
        }

        let mut entries = self.entries.clone();
        entries.push(entry);
        self.persist(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

/// Safely format a schema-qualified tracking table name for SQL
pub fn format_tracking_table_name(tracking_table: &TrackingTable) -> Result<String> {
    // Letters, digits, underscore and dollar, starting with a letter or underscore
    fn is_valid_sql_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {
                chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
            }
            _ => false,
        }
    }

    if !is_valid_sql_identifier(&tracking_table.schema) {
        bail!(
            "Invalid schema name '{}': must contain only letters, numbers, underscores, and dollar signs, starting with letter or underscore",
            tracking_table.schema
        );
    }

    if !is_valid_sql_identifier(&tracking_table.name) {
        bail!(
            "Invalid table name '{}': must contain only letters, numbers, underscores, and dollar signs, starting with letter or underscore",
            tracking_table.name
        );
    }

    Ok(format!(
        r#""{}"."{}""#,
        tracking_table.schema, tracking_table.name
    ))
}

/// Calculate checksum for migration content
pub fn calculate_checksum(content: &str) -> String {
    format!("{:x}", md5::compute(content))
}
