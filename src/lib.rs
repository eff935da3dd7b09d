pub mod apply;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod migration;
pub mod migration_tracking;
pub mod operations;
pub mod progress;
pub mod render;
pub mod settings;

pub use apply::{ApplyReport, MigrationStatus, Migrator};
pub use catalog::SchemaState;
pub use error::{ApplyError, ResolveError, SchemaError};
pub use migration::{Dependency, Migration, MigrationKey};
pub use operations::Operation;
pub use settings::Settings;
