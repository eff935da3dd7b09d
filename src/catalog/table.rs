//! Tables, columns and field types tracked by the schema state
use serde::{Deserialize, Serialize};

use super::constraint::Constraint;
use crate::constants::DEFAULT_PRIMARY_KEY;

/// Behaviour applied to referencing rows when the referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadePolicy {
    Cascade,
    SetNull,
    Restrict,
}

impl CascadePolicy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CascadePolicy::Cascade => "CASCADE",
            CascadePolicy::SetNull => "SET NULL",
            CascadePolicy::Restrict => "RESTRICT",
        }
    }
}

/// Reference to a table, either by name or through a swappable setting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TableRef {
    Table(String),
    Swappable { swappable: String },
}

impl TableRef {
    pub fn table(name: impl Into<String>) -> Self {
        TableRef::Table(name.into())
    }

    /// Point a by-name reference at a renamed table. Returns true when rewritten.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> bool {
        match self {
            TableRef::Table(name) if name == old_name => {
                *name = new_name.to_string();
                true
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableRef::Table(name) => write!(f, "{}", name),
            TableRef::Swappable { swappable } => write!(f, "${}", swappable),
        }
    }
}

/// Field kinds a column can carry.
///
/// Relations keep their target and cascade policy explicitly instead of
/// inferring them from a field class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldType {
    BigAuto,
    Char {
        max_length: u32,
    },
    Text,
    Image {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upload_to: Option<String>,
    },
    Date,
    DateTime {
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        auto_now: bool,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        auto_now_add: bool,
    },
    Boolean,
    PositiveInteger,
    ForeignKey {
        to: TableRef,
        on_delete: CascadePolicy,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        related_name: Option<String>,
    },
    OneToOne {
        to: TableRef,
        on_delete: CascadePolicy,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        related_name: Option<String>,
    },
    ManyToMany {
        to: TableRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        through: Option<TableRef>,
    },
}

impl FieldType {
    /// SQL type for the backing column, `None` for fields without a column
    pub fn sql_type(&self) -> Option<String> {
        let sql_type = match self {
            FieldType::BigAuto => "bigint".to_string(),
            FieldType::Char { max_length } => format!("varchar({})", max_length),
            FieldType::Text => "text".to_string(),
            FieldType::Image { .. } => "varchar(100)".to_string(),
            FieldType::Date => "date".to_string(),
            FieldType::DateTime { .. } => "timestamp with time zone".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::PositiveInteger => "integer".to_string(),
            FieldType::ForeignKey { .. } | FieldType::OneToOne { .. } => "bigint".to_string(),
            FieldType::ManyToMany { .. } => return None,
        };
        Some(sql_type)
    }

    /// Whether the field is stored as a column on its own table
    pub fn is_concrete(&self) -> bool {
        !matches!(self, FieldType::ManyToMany { .. })
    }

    /// Target and cascade policy for single-valued relations
    pub fn foreign_target(&self) -> Option<(&TableRef, CascadePolicy)> {
        match self {
            FieldType::ForeignKey { to, on_delete, .. }
            | FieldType::OneToOne { to, on_delete, .. } => Some((to, *on_delete)),
            _ => None,
        }
    }

    /// Every table this field points at
    pub fn references(&self) -> Vec<&TableRef> {
        match self {
            FieldType::ForeignKey { to, .. } | FieldType::OneToOne { to, .. } => vec![to],
            FieldType::ManyToMany { to, through } => {
                std::iter::once(to).chain(through.as_ref()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn references_mut(&mut self) -> Vec<&mut TableRef> {
        match self {
            FieldType::ForeignKey { to, .. } | FieldType::OneToOne { to, .. } => vec![to],
            FieldType::ManyToMany { to, through } => {
                std::iter::once(to).chain(through.as_mut()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Column {
    pub name: String,
    pub field: FieldType,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, field: FieldType) -> Self {
        Self {
            name: name.into(),
            field,
            nullable: false,
            default: None,
            primary_key: false,
            unique: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Name of the database column; relations store the referenced key in `<name>_id`
    pub fn db_column(&self) -> String {
        match self.field {
            FieldType::ForeignKey { .. } | FieldType::OneToOne { .. } => {
                format!("{}_id", self.name)
            }
            _ => self.name.clone(),
        }
    }
}

/// Model-level options that do not change the table layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ordering: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose_name_plural: Option<String>,
}

impl TableOptions {
    pub fn is_empty(&self) -> bool {
        self == &TableOptions::default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "TableOptions::is_empty")]
    pub options: TableOptions,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            constraints: Vec::new(),
            options: TableOptions::default(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Primary key column name, falling back to the conventional `id`
    pub fn primary_key_column(&self) -> String {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.db_column())
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string())
    }

    /// Rewrite every by-name reference to `old_name`. Returns the number rewritten.
    pub fn rename_references(&mut self, old_name: &str, new_name: &str) -> usize {
        let column_refs = self
            .columns
            .iter_mut()
            .flat_map(|c| c.field.references_mut())
            .map(|r| r.rename(old_name, new_name))
            .filter(|renamed| *renamed)
            .count();
        let constraint_refs = self
            .constraints
            .iter_mut()
            .filter_map(|c| c.target_mut())
            .map(|r| r.rename(old_name, new_name))
            .filter(|renamed| *renamed)
            .count();
        column_refs + constraint_refs
    }
}
