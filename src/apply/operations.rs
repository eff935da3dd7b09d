//! Applies single operations to a schema state, validating preconditions first.
//!
//! Every check runs before the state is touched, so a failing operation leaves
//! the state it was given unchanged.

use crate::catalog::{CascadePolicy, Column, Constraint, ConstraintKind, SchemaState, Table, TableOptions, TableRef};
use crate::error::SchemaError;
use crate::operations::Operation;
use crate::settings::Settings;
use itertools::Itertools;
use tracing::debug;

pub fn apply_operation(
    state: &mut SchemaState,
    operation: &Operation,
    settings: &Settings,
) -> Result<(), SchemaError> {
    debug!("Applying {}", operation);

    match operation {
        Operation::CreateTable {
            name,
            columns,
            constraints,
            options,
        } => create_table(state, settings, name, columns, constraints, options),
        Operation::AddColumn { table, column } => add_column(state, settings, table, column),
        Operation::AlterColumn { table, column } => alter_column(state, settings, table, column),
        Operation::RenameTable { old_name, new_name } => rename_table(state, old_name, new_name),
        Operation::AddConstraint { table, constraint } => {
            add_constraint(state, settings, table, constraint)
        }
        Operation::AlterModelOptions { table, options } => {
            let target = state
                .table_mut(table)
                .ok_or_else(|| SchemaError::UnknownTable(table.clone()))?;
            target.options = options.clone();
            Ok(())
        }
    }
}

fn create_table(
    state: &mut SchemaState,
    settings: &Settings,
    name: &str,
    columns: &[Column],
    constraints: &[Constraint],
    options: &TableOptions,
) -> Result<(), SchemaError> {
    if state.contains_table(name) {
        return Err(SchemaError::DuplicateTable(name.to_string()));
    }

    if let Some(duplicate) = columns.iter().map(|c| c.name.as_str()).duplicates().next() {
        return Err(SchemaError::DuplicateColumn {
            table: name.to_string(),
            column: duplicate.to_string(),
        });
    }

    if columns.iter().filter(|c| c.primary_key).count() > 1 {
        return Err(SchemaError::violation(
            name,
            "a table can declare at most one primary key column",
        ));
    }

    let mut table = Table::new(name, columns.to_vec());
    table.options = options.clone();

    for column in columns {
        validate_column(state, &table, column, settings)?;
    }

    for constraint in constraints {
        validate_constraint(state, &table, constraint, settings)?;
        table.constraints.push(constraint.clone());
    }

    state.insert_table(table);
    Ok(())
}

fn add_column(
    state: &mut SchemaState,
    settings: &Settings,
    table: &str,
    column: &Column,
) -> Result<(), SchemaError> {
    let owner = state
        .table(table)
        .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;

    if owner.has_column(&column.name) {
        return Err(SchemaError::DuplicateColumn {
            table: table.to_string(),
            column: column.name.clone(),
        });
    }

    if column.primary_key && owner.columns.iter().any(|c| c.primary_key) {
        return Err(SchemaError::violation(
            table,
            format!("cannot add primary key column '{}': table already has one", column.name),
        ));
    }

    validate_column(state, owner, column, settings)?;

    state
        .table_mut(table)
        .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?
        .columns
        .push(column.clone());
    Ok(())
}

fn alter_column(
    state: &mut SchemaState,
    settings: &Settings,
    table: &str,
    column: &Column,
) -> Result<(), SchemaError> {
    let owner = state
        .table(table)
        .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;

    if !owner.has_column(&column.name) {
        return Err(SchemaError::UnknownColumn {
            table: table.to_string(),
            column: column.name.clone(),
        });
    }

    validate_column(state, owner, column, settings)?;

    if !column.nullable
        && let Some(constraint) = owner.constraints.iter().find(|c| {
            c.on_delete() == Some(CascadePolicy::SetNull) && c.columns().contains(&column.name)
        })
    {
        return Err(SchemaError::violation(
            table,
            format!(
                "column '{}' must stay nullable: constraint '{}' sets it to NULL on delete",
                column.name, constraint.name
            ),
        ));
    }

    let target = state
        .table_mut(table)
        .and_then(|t| t.column_mut(&column.name))
        .ok_or_else(|| SchemaError::UnknownColumn {
            table: table.to_string(),
            column: column.name.clone(),
        })?;
    *target = column.clone();
    Ok(())
}

fn rename_table(state: &mut SchemaState, old_name: &str, new_name: &str) -> Result<(), SchemaError> {
    if !state.contains_table(old_name) {
        return Err(SchemaError::UnknownTable(old_name.to_string()));
    }
    if state.contains_table(new_name) {
        return Err(SchemaError::DuplicateTable(new_name.to_string()));
    }

    let mut table = state
        .remove_table(old_name)
        .ok_or_else(|| SchemaError::UnknownTable(old_name.to_string()))?;
    table.name = new_name.to_string();
    let mut rewritten = table.rename_references(old_name, new_name);

    for other in state.tables_mut() {
        rewritten += other.rename_references(old_name, new_name);
    }
    state.insert_table(table);

    debug!(
        "Renamed table {} to {} ({} references rewritten)",
        old_name, new_name, rewritten
    );
    Ok(())
}

fn add_constraint(
    state: &mut SchemaState,
    settings: &Settings,
    table: &str,
    constraint: &Constraint,
) -> Result<(), SchemaError> {
    let owner = state
        .table(table)
        .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?;

    validate_constraint(state, owner, constraint, settings)?;

    state
        .table_mut(table)
        .ok_or_else(|| SchemaError::UnknownTable(table.to_string()))?
        .constraints
        .push(constraint.clone());
    Ok(())
}

fn resolve_ref<'a>(settings: &'a Settings, table_ref: &'a TableRef) -> Result<&'a str, SchemaError> {
    settings.resolve_table(table_ref).ok_or_else(|| match table_ref {
        TableRef::Swappable { swappable } => SchemaError::UnknownSetting(swappable.clone()),
        TableRef::Table(name) => SchemaError::UnknownTable(name.clone()),
    })
}

/// Look up a referenced table; `owner` may not be in the state yet
fn referenced_table<'a>(
    state: &'a SchemaState,
    owner: &'a Table,
    name: &str,
) -> Result<&'a Table, SchemaError> {
    if name == owner.name {
        return Ok(owner);
    }
    state
        .table(name)
        .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
}

fn validate_column(
    state: &SchemaState,
    owner: &Table,
    column: &Column,
    settings: &Settings,
) -> Result<(), SchemaError> {
    for table_ref in column.field.references() {
        let name = resolve_ref(settings, table_ref)?;
        referenced_table(state, owner, name)?;
    }

    if let Some((_, CascadePolicy::SetNull)) = column.field.foreign_target()
        && !column.nullable
    {
        return Err(SchemaError::violation(
            &owner.name,
            format!(
                "column '{}' uses on_delete SET_NULL but is not nullable",
                column.name
            ),
        ));
    }

    if column.primary_key && column.nullable {
        return Err(SchemaError::violation(
            &owner.name,
            format!("primary key column '{}' cannot be nullable", column.name),
        ));
    }

    Ok(())
}

fn validate_constraint(
    state: &SchemaState,
    owner: &Table,
    constraint: &Constraint,
    settings: &Settings,
) -> Result<(), SchemaError> {
    if owner.constraint(&constraint.name).is_some() {
        return Err(SchemaError::violation(
            &owner.name,
            format!("constraint '{}' already exists", constraint.name),
        ));
    }

    if constraint.columns().is_empty() {
        return Err(SchemaError::violation(
            &owner.name,
            format!("constraint '{}' covers no columns", constraint.name),
        ));
    }

    for name in constraint.columns() {
        let column = owner.column(name).ok_or_else(|| SchemaError::UnknownColumn {
            table: owner.name.clone(),
            column: name.clone(),
        })?;
        if !column.field.is_concrete() {
            return Err(SchemaError::violation(
                &owner.name,
                format!(
                    "constraint '{}' cannot cover many-to-many field '{}'",
                    constraint.name, name
                ),
            ));
        }
    }

    if let ConstraintKind::ForeignKey {
        columns,
        to,
        to_columns,
        on_delete,
    } = &constraint.kind
    {
        let target = referenced_table(state, owner, resolve_ref(settings, to)?)?;

        if columns.len() != to_columns.len() {
            return Err(SchemaError::violation(
                &owner.name,
                format!(
                    "foreign key '{}' maps {} columns onto {} referenced columns",
                    constraint.name,
                    columns.len(),
                    to_columns.len()
                ),
            ));
        }

        if let Some(missing) = to_columns.iter().find(|c| !target.has_column(c)) {
            return Err(SchemaError::UnknownColumn {
                table: target.name.clone(),
                column: missing.clone(),
            });
        }

        if *on_delete == CascadePolicy::SetNull
            && let Some(column) = columns
                .iter()
                .filter_map(|c| owner.column(c))
                .find(|c| !c.nullable)
        {
            return Err(SchemaError::violation(
                &owner.name,
                format!(
                    "foreign key '{}' uses on_delete SET_NULL but column '{}' is not nullable",
                    constraint.name, column.name
                ),
            ));
        }
    }

    Ok(())
}
