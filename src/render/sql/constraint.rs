//! Shared SQL rendering for constraint statements

use crate::catalog::{Constraint, ConstraintKind, SchemaState, Table};
use crate::render::{quote_ident, resolved_table_name};
use crate::settings::Settings;

/// Database column names for fields of `table`, falling back to the field name
fn db_columns(table: Option<&Table>, fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| {
            let column = table
                .and_then(|t| t.column(field))
                .map(|c| c.db_column())
                .unwrap_or_else(|| field.clone());
            quote_ident(&column)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render an ALTER TABLE ADD CONSTRAINT statement for a constraint on `table`
pub fn render_add_constraint(
    table: &Table,
    constraint: &Constraint,
    state: &SchemaState,
    settings: &Settings,
) -> String {
    let definition = match &constraint.kind {
        ConstraintKind::Unique { columns } => {
            format!("UNIQUE ({})", db_columns(Some(table), columns))
        }
        ConstraintKind::ForeignKey {
            columns,
            to,
            to_columns,
            on_delete,
        } => {
            let target = resolved_table_name(to, settings);
            let target_table = if target == table.name {
                Some(table)
            } else {
                state.table(&target)
            };
            format!(
                "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
                db_columns(Some(table), columns),
                quote_ident(&target),
                db_columns(target_table, to_columns),
                on_delete.as_sql()
            )
        }
    };

    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} {};",
        quote_ident(&table.name),
        quote_ident(&constraint.name),
        definition
    )
}
