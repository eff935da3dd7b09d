use crate::config::types::*;
use crate::constants::{
    DEFAULT_HISTORY_FILE, DEFAULT_MIGRATIONS_DIR, DEFAULT_TRACKING_SCHEMA, DEFAULT_TRACKING_TABLE,
};

impl Default for Directories {
    fn default() -> Self {
        Self {
            migrations: DEFAULT_MIGRATIONS_DIR.to_string(),
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self {
            file: DEFAULT_HISTORY_FILE.to_string(),
            tracking_table: TrackingTable::default(),
        }
    }
}

impl Default for TrackingTable {
    fn default() -> Self {
        Self {
            schema: DEFAULT_TRACKING_SCHEMA.to_string(),
            name: DEFAULT_TRACKING_TABLE.to_string(),
        }
    }
}
