use crate::config::types::*;

/// Trait for merging optional configuration values
pub trait Merge<T> {
    fn merge(self, other: T) -> T;
}

impl<T> Merge<Option<T>> for Option<T> {
    fn merge(self, other: Option<T>) -> Option<T> {
        other.or(self)
    }
}

impl Merge<ConfigInput> for ConfigInput {
    fn merge(self, other: ConfigInput) -> ConfigInput {
        ConfigInput {
            directories: match (self.directories, other.directories) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
            history: match (self.history, other.history) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
            settings: match (self.settings, other.settings) {
                (Some(a), Some(b)) => Some(a.merge_with(b)),
                (a, b) => b.or(a),
            },
        }
    }
}

impl DirectoriesInput {
    pub fn merge_with(self, other: DirectoriesInput) -> DirectoriesInput {
        DirectoriesInput {
            migrations_dir: self.migrations_dir.merge(other.migrations_dir),
        }
    }
}

impl HistoryInput {
    pub fn merge_with(self, other: HistoryInput) -> HistoryInput {
        let tracking_table = match (self.tracking_table, other.tracking_table) {
            (Some(a), Some(b)) => Some(TrackingTableInput {
                schema: a.schema.merge(b.schema),
                name: a.name.merge(b.name),
            }),
            (a, b) => b.or(a),
        };

        HistoryInput {
            file: self.file.merge(other.file),
            tracking_table,
        }
    }
}

impl SettingsInput {
    /// Swappable entries are merged per setting; later layers win
    pub fn merge_with(self, other: SettingsInput) -> SettingsInput {
        let swappable = match (self.swappable, other.swappable) {
            (Some(mut a), Some(b)) => {
                a.extend(b);
                Some(a)
            }
            (a, b) => b.or(a),
        };

        SettingsInput { swappable }
    }
}
