//! Shared SQL rendering for CREATE TABLE statements and column definitions

use crate::catalog::{Column, FieldType, SchemaState, Table};
use crate::constants::DEFAULT_PRIMARY_KEY;
use crate::render::{quote_ident, render_default, resolved_table_name};
use crate::settings::Settings;

fn is_identity(column: &Column) -> bool {
    column.primary_key && matches!(column.field, FieldType::BigAuto)
}

/// Unique through the column itself; primary keys are unique through their own constraint
fn is_unique(column: &Column) -> bool {
    !column.primary_key
        && (column.unique || matches!(column.field, FieldType::OneToOne { .. }))
}

/// `REFERENCES` clause for single-valued relations, pointing at the target's primary key
fn references_clause(column: &Column, state: &SchemaState, settings: &Settings) -> Option<String> {
    let (to, on_delete) = column.field.foreign_target()?;
    let target = resolved_table_name(to, settings);
    let target_pk = state
        .table(&target)
        .map(|t| t.primary_key_column())
        .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());
    Some(format!(
        "REFERENCES {} ({}) ON DELETE {}",
        quote_ident(&target),
        quote_ident(&target_pk),
        on_delete.as_sql()
    ))
}

/// Render a single column definition as used in CREATE TABLE and ADD COLUMN.
///
/// Relations render an inline `REFERENCES` clause pointing at the target's
/// primary key; positive integers get a non-negative CHECK.
pub fn render_column_definition(column: &Column, state: &SchemaState, settings: &Settings) -> String {
    let db_column = column.db_column();
    let sql_type = column.field.sql_type().unwrap_or_default();
    let mut def = format!("{} {}", quote_ident(&db_column), sql_type);

    if is_identity(column) {
        def.push_str(" GENERATED BY DEFAULT AS IDENTITY");
    }

    if let Some(default) = &column.default {
        def.push_str(&format!(" DEFAULT {}", render_default(default)));
    }

    if column.primary_key {
        def.push_str(" PRIMARY KEY");
    } else if !column.nullable {
        def.push_str(" NOT NULL");
    }
    if is_unique(column) {
        def.push_str(" UNIQUE");
    }

    if matches!(column.field, FieldType::PositiveInteger) {
        def.push_str(&format!(" CHECK ({} >= 0)", quote_ident(&db_column)));
    }

    if let Some(references) = references_clause(column, state, settings) {
        def.push(' ');
        def.push_str(&references);
    }

    def
}

/// Render the ALTER TABLE statement that turns `previous` into `column`.
///
/// Inline relation and unique constraints carry PostgreSQL's default names
/// (`<table>_<column>_fkey`, `<table>_<column>_key`) and are dropped and
/// re-added when they change. Without a previous definition only the type,
/// nullability and default are rendered. Returns `None` for fields without
/// a column.
pub fn render_alter_column(
    table: &str,
    previous: Option<&Column>,
    column: &Column,
    state: &SchemaState,
    settings: &Settings,
) -> Option<String> {
    let sql_type = column.field.sql_type()?;
    let db_column = column.db_column();
    let name = quote_ident(&db_column);
    let mut actions = vec![format!("ALTER COLUMN {} TYPE {}", name, sql_type)];

    actions.push(if column.nullable && !column.primary_key {
        format!("ALTER COLUMN {} DROP NOT NULL", name)
    } else {
        format!("ALTER COLUMN {} SET NOT NULL", name)
    });

    // Identity columns generate their own values
    if !is_identity(column) {
        actions.push(match &column.default {
            Some(default) => format!("ALTER COLUMN {} SET DEFAULT {}", name, render_default(default)),
            None => format!("ALTER COLUMN {} DROP DEFAULT", name),
        });
    }

    if let Some(previous) = previous {
        let constraint_name = |owner: &Column, suffix: &str| {
            quote_ident(&format!("{}_{}_{}", table, owner.db_column(), suffix))
        };

        let before = references_clause(previous, state, settings);
        let after = references_clause(column, state, settings);
        if before != after {
            if before.is_some() {
                actions.push(format!("DROP CONSTRAINT {}", constraint_name(previous, "fkey")));
            }
            if let Some(references) = after {
                actions.push(format!(
                    "ADD CONSTRAINT {} FOREIGN KEY ({}) {}",
                    constraint_name(column, "fkey"),
                    name,
                    references
                ));
            }
        }

        match (is_unique(previous), is_unique(column)) {
            (true, false) => {
                actions.push(format!("DROP CONSTRAINT {}", constraint_name(previous, "key")))
            }
            (false, true) => actions.push(format!(
                "ADD CONSTRAINT {} UNIQUE ({})",
                constraint_name(column, "key"),
                name
            )),
            _ => {}
        }
    }

    Some(format!("ALTER TABLE {} {};", quote_ident(table), actions.join(", ")))
}

/// Render a complete CREATE TABLE statement. Many-to-many fields are skipped.
pub fn render_create_table(table: &Table, state: &SchemaState, settings: &Settings) -> String {
    let column_definitions: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.field.is_concrete())
        .map(|c| format!("    {}", render_column_definition(c, state, settings)))
        .collect();

    format!(
        "CREATE TABLE {} (\n{}\n);",
        quote_ident(&table.name),
        column_definitions.join(",\n")
    )
}
