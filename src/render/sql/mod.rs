//! Shared SQL rendering functions
//!
//! Table and constraint rendering used by the operation renderer.

pub mod constraint;
pub mod table;

pub use constraint::render_add_constraint;
pub use table::{render_alter_column, render_column_definition, render_create_table};
