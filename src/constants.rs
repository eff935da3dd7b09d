// Configuration file name
pub const CONFIG_FILENAME: &str = "migrun.yaml";

// Default locations, relative to the directory holding the config file
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
pub const DEFAULT_HISTORY_FILE: &str = ".migrun/history.json";

// Tracking table defaults
pub const DEFAULT_TRACKING_SCHEMA: &str = "public";
pub const DEFAULT_TRACKING_TABLE: &str = "migrun_migrations";

// Environment overrides
pub const MIGRATIONS_DIR_ENV: &str = "MIGRUN_MIGRATIONS_DIR";
pub const HISTORY_FILE_ENV: &str = "MIGRUN_HISTORY_FILE";

// Migration file extensions recognised during discovery
pub const MIGRATION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

// Dependency aliases resolved against an app's migrations
pub const FIRST_MIGRATION: &str = "__first__";
pub const LATEST_MIGRATION: &str = "__latest__";

// Primary key column assumed for referenced tables that declare none
pub const DEFAULT_PRIMARY_KEY: &str = "id";
