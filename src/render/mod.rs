//! PostgreSQL DDL equivalent of schema operations
//!
//! Rendering happens after an operation is applied, so table references are
//! resolved against the state that includes it.

pub mod sql;

use crate::catalog::{Column, SchemaState, TableRef};
use crate::config::types::TrackingTable;
use crate::migration::MigrationKey;
use crate::migration_tracking::format_tracking_table_name;
use crate::operations::Operation;
use crate::settings::Settings;
use anyhow::Result;

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// SQL literal for a column default
pub fn render_default(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => escape_string(s),
        other => escape_string(&other.to_string()),
    }
}

/// Resolved name of a referenced table; unresolvable references render as written
pub(crate) fn resolved_table_name(table_ref: &TableRef, settings: &Settings) -> String {
    settings
        .resolve_table(table_ref)
        .map(str::to_string)
        .unwrap_or_else(|| table_ref.to_string())
}

/// Column definition an `AlterColumn` replaces, looked up before it is applied
pub fn previous_column(state: &SchemaState, operation: &Operation) -> Option<Column> {
    match operation {
        Operation::AlterColumn { table, column } => state.table(table)?.column(&column.name).cloned(),
        _ => None,
    }
}

/// DDL statements for one operation. State-only operations render nothing.
///
/// `previous` is the definition an `AlterColumn` replaces; see [`previous_column`].
pub fn render_operation(
    operation: &Operation,
    previous: Option<&Column>,
    state: &SchemaState,
    settings: &Settings,
) -> Vec<String> {
    match operation {
        Operation::CreateTable { name, .. } => {
            let Some(table) = state.table(name) else {
                return Vec::new();
            };
            std::iter::once(sql::render_create_table(table, state, settings))
                .chain(
                    table
                        .constraints
                        .iter()
                        .map(|c| sql::render_add_constraint(table, c, state, settings)),
                )
                .collect()
        }
        Operation::AddColumn { table, column } => {
            if !column.field.is_concrete() {
                return Vec::new();
            }
            vec![format!(
                "ALTER TABLE {} ADD COLUMN {};",
                quote_ident(table),
                sql::render_column_definition(column, state, settings)
            )]
        }
        Operation::AlterColumn { table, column } => {
            sql::render_alter_column(table, previous, column, state, settings)
                .into_iter()
                .collect()
        }
        Operation::RenameTable { old_name, new_name } => vec![format!(
            "ALTER TABLE {} RENAME TO {};",
            quote_ident(old_name),
            quote_ident(new_name)
        )],
        Operation::AddConstraint { table, constraint } => state
            .table(table)
            .map(|owner| vec![sql::render_add_constraint(owner, constraint, state, settings)])
            .unwrap_or_default(),
        Operation::AlterModelOptions { .. } => Vec::new(),
    }
}

/// DDL for the migration tracking table
pub fn render_tracking_table(tracking_table: &TrackingTable) -> Result<String> {
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    \
         app_name TEXT NOT NULL,\n    \
         migration_name TEXT NOT NULL,\n    \
         applied_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,\n    \
         checksum TEXT NOT NULL,\n    \
         PRIMARY KEY (app_name, migration_name)\n);",
        format_tracking_table_name(tracking_table)?
    ))
}

/// Statement recording a migration in the tracking table
pub fn render_record_applied(
    tracking_table: &TrackingTable,
    key: &MigrationKey,
    checksum: &str,
) -> Result<String> {
    Ok(format!(
        "INSERT INTO {} (app_name, migration_name, checksum) VALUES ({}, {}, {});",
        format_tracking_table_name(tracking_table)?,
        escape_string(&key.app),
        escape_string(&key.name),
        escape_string(checksum)
    ))
}
