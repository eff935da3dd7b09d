//! Logical schema tracked by the migration system
//!
//! `SchemaState` maps table names to their definitions. It is only mutated by
//! the operation applier, inside a per-migration transaction.

pub mod constraint;
pub mod table;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use constraint::{Constraint, ConstraintKind};
pub use table::{CascadePolicy, Column, FieldType, Table, TableOptions, TableRef};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SchemaState {
    tables: BTreeMap<String, Table>,
}

impl SchemaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }

    pub(crate) fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub(crate) fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(name)
    }
}
