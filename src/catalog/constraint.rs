//! Table-level constraints: multi-column uniqueness and explicit foreign keys
use serde::{Deserialize, Serialize};

use super::table::{CascadePolicy, TableRef};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    Unique {
        columns: Vec<String>,
    },
    ForeignKey {
        columns: Vec<String>,
        to: TableRef,
        to_columns: Vec<String>,
        on_delete: CascadePolicy,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Constraint {
    pub name: String,
    #[serde(flatten)]
    pub kind: ConstraintKind,
}

impl Constraint {
    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Unique {
                columns: columns.iter().map(|c| c.to_string()).collect(),
            },
        }
    }

    pub fn foreign_key(
        name: impl Into<String>,
        columns: &[&str],
        to: TableRef,
        to_columns: &[&str],
        on_delete: CascadePolicy,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::ForeignKey {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                to,
                to_columns: to_columns.iter().map(|c| c.to_string()).collect(),
                on_delete,
            },
        }
    }

    /// Local columns covered by the constraint
    pub fn columns(&self) -> &[String] {
        match &self.kind {
            ConstraintKind::Unique { columns } | ConstraintKind::ForeignKey { columns, .. } => {
                columns
            }
        }
    }

    pub fn target_mut(&mut self) -> Option<&mut TableRef> {
        match &mut self.kind {
            ConstraintKind::ForeignKey { to, .. } => Some(to),
            ConstraintKind::Unique { .. } => None,
        }
    }

    pub fn on_delete(&self) -> Option<CascadePolicy> {
        match &self.kind {
            ConstraintKind::ForeignKey { on_delete, .. } => Some(*on_delete),
            ConstraintKind::Unique { .. } => None,
        }
    }
}
