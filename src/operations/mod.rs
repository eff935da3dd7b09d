//! Schema operations carried by a migration
//!
//! Each operation is a single atomic schema change. Operations serialize as a
//! map tagged by `op`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Column, Constraint, TableOptions};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateTable {
        name: String,
        columns: Vec<Column>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        constraints: Vec<Constraint>,
        #[serde(default, skip_serializing_if = "TableOptions::is_empty")]
        options: TableOptions,
    },
    AddColumn {
        table: String,
        column: Column,
    },
    AlterColumn {
        table: String,
        column: Column,
    },
    RenameTable {
        old_name: String,
        new_name: String,
    },
    AddConstraint {
        table: String,
        constraint: Constraint,
    },
    AlterModelOptions {
        table: String,
        options: TableOptions,
    },
}

impl Operation {
    /// Table the operation targets (the original name for renames)
    pub fn table(&self) -> &str {
        match self {
            Operation::CreateTable { name, .. } => name,
            Operation::RenameTable { old_name, .. } => old_name,
            Operation::AddColumn { table, .. }
            | Operation::AlterColumn { table, .. }
            | Operation::AddConstraint { table, .. }
            | Operation::AlterModelOptions { table, .. } => table,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::CreateTable { .. } => "CreateTable",
            Operation::AddColumn { .. } => "AddColumn",
            Operation::AlterColumn { .. } => "AlterColumn",
            Operation::RenameTable { .. } => "RenameTable",
            Operation::AddConstraint { .. } => "AddConstraint",
            Operation::AlterModelOptions { .. } => "AlterModelOptions",
        }
    }

    /// Short human-readable summary used in progress output and errors
    pub fn describe(&self) -> String {
        match self {
            Operation::CreateTable { name, .. } => format!("CreateTable {}", name),
            Operation::AddColumn { table, column } | Operation::AlterColumn { table, column } => {
                format!("{} {}.{}", self.kind(), table, column.name)
            }
            Operation::RenameTable { old_name, new_name } => {
                format!("RenameTable {} -> {}", old_name, new_name)
            }
            Operation::AddConstraint { table, constraint } => {
                format!("AddConstraint {}.{}", table, constraint.name)
            }
            Operation::AlterModelOptions { table, .. } => format!("AlterModelOptions {}", table),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
