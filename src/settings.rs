//! Explicit settings consulted while resolving dependencies and table references.
//!
//! Swappable models (for example a configurable user model) are declared here
//! and handed to the resolver and the applier when they are constructed.

use crate::catalog::table::TableRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A model whose concrete location is chosen by configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SwappableModel {
    /// App whose migrations create the model
    pub app: String,
    /// Table backing the model
    pub table: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    swappable: BTreeMap<String, SwappableModel>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_swappable(
        mut self,
        setting: impl Into<String>,
        app: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        self.swappable.insert(
            setting.into(),
            SwappableModel {
                app: app.into(),
                table: table.into(),
            },
        );
        self
    }

    /// Build settings from an already collected swappable map
    pub fn from_swappable(swappable: BTreeMap<String, SwappableModel>) -> Self {
        Self { swappable }
    }

    pub fn swappable(&self, setting: &str) -> Option<&SwappableModel> {
        self.swappable.get(setting)
    }

    pub fn swappable_settings(&self) -> impl Iterator<Item = (&String, &SwappableModel)> {
        self.swappable.iter()
    }

    /// Resolve a table reference to a concrete table name.
    ///
    /// Returns `None` when the reference names a setting that is not configured.
    pub fn resolve_table<'a>(&'a self, table_ref: &'a TableRef) -> Option<&'a str> {
        match table_ref {
            TableRef::Table(name) => Some(name.as_str()),
            TableRef::Swappable { swappable } => {
                self.swappable(swappable).map(|model| model.table.as_str())
            }
        }
    }
}
