//! Error taxonomy for resolving and applying migrations

use crate::migration::MigrationKey;
use itertools::Itertools;
use thiserror::Error;

/// Errors raised while ordering migrations. None of these mutate schema state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Dependency cycle detected between migrations: {}", .0.iter().join(" -> "))]
    Cycle(Vec<MigrationKey>),

    #[error("Migration {migration} depends on {dependency}, which does not exist")]
    MissingDependency {
        migration: MigrationKey,
        dependency: MigrationKey,
    },

    #[error("Migration {migration} depends on swappable setting '{setting}', which is not configured")]
    UnknownSetting {
        migration: MigrationKey,
        setting: String,
    },

    #[error("Migration {0} is defined more than once")]
    DuplicateMigration(MigrationKey),

    #[error("Target migration {0} does not exist")]
    UnknownTarget(MigrationKey),
}

/// Errors raised by a single operation against the schema state
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Table '{0}' already exists")]
    DuplicateTable(String),

    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    #[error("Column '{column}' already exists on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Column '{column}' does not exist on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Constraint violation on table '{table}': {message}")]
    ConstraintViolation { table: String, message: String },

    #[error("Swappable setting '{0}' is not configured")]
    UnknownSetting(String),
}

impl SchemaError {
    pub(crate) fn violation(table: &str, message: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            table: table.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that halt an apply run
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Migration {migration} failed at operation {operation_index} ({operation}): {source}")]
    Failed {
        migration: MigrationKey,
        operation_index: usize,
        operation: String,
        #[source]
        source: SchemaError,
    },

    #[error(
        "Migration {migration} has been modified after being applied (expected checksum {expected}, found {actual})"
    )]
    ChecksumMismatch {
        migration: MigrationKey,
        expected: String,
        actual: String,
    },

    #[error("Migration {0} is already applied")]
    AlreadyApplied(MigrationKey),

    #[error("Failed to serialize migration: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    History(#[from] anyhow::Error),
}

impl ApplyError {
    /// The migration this error is attributed to, when there is one
    pub fn migration(&self) -> Option<&MigrationKey> {
        match self {
            Self::Failed { migration, .. }
            | Self::ChecksumMismatch { migration, .. }
            | Self::AlreadyApplied(migration) => Some(migration),
            _ => None,
        }
    }
}
