//! Schema description types for conform.
//!
//! This crate contains the shapes shared between model extraction and live
//! introspection: both sides of a reconciliation run are reduced to the same
//! [`TableDescription`] / [`ColumnDescription`] form before they are compared.
//!
//! Models are declared as plain data via [`ModelDescriptor`], an explicit
//! builder the model author populates, no reflection involved:
//!
//! ```
//! use conform_schema::{FieldDescriptor, Literal, LogicalType, ModelDescriptor};
//!
//! let roles = ModelDescriptor::new("Roles")
//!     .field(FieldDescriptor::new("Id", LogicalType::Integer).primary_key())
//!     .field(FieldDescriptor::new("Name", LogicalType::Text).unique())
//!     .field(
//!         FieldDescriptor::new("CreatedAt", LogicalType::Timestamp)
//!             .default_value(Literal::text("CURRENT_TIMESTAMP")),
//!     );
//!
//! let table = roles.to_table().unwrap();
//! assert_eq!(table.columns[0].native_type, "INT");
//! ```

pub mod dialect;

use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while turning model descriptors into table descriptions.
///
/// Both variants fire before any database I/O happens.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A field declares a logical type the dialect has no native spelling for.
    #[error("no native type mapping for {logical} ({table}.{column})")]
    UnmappedType {
        logical: LogicalType,
        table: String,
        column: String,
    },

    /// A model descriptor was built with an empty table name.
    #[error("model descriptor declares no table name")]
    MissingTableName,
}

/// An abstract column type, independent of any dialect's native spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// 16-bit integer.
    SmallInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// 32-bit floating point.
    Real,
    /// 64-bit floating point.
    Double,
    /// Boolean flag.
    Boolean,
    /// Unbounded unicode text.
    Text,
    /// Unbounded binary data.
    Binary,
    /// Date and time, no timezone.
    Timestamp,
    /// Date only.
    Date,
    /// Time of day only.
    Time,
    /// 128-bit identifier.
    Uuid,
    /// JSON document.
    Json,
    /// Time span.
    Interval,
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalType::SmallInt => "SmallInt",
            LogicalType::Integer => "Integer",
            LogicalType::BigInt => "BigInt",
            LogicalType::Real => "Real",
            LogicalType::Double => "Double",
            LogicalType::Boolean => "Boolean",
            LogicalType::Text => "Text",
            LogicalType::Binary => "Binary",
            LogicalType::Timestamp => "Timestamp",
            LogicalType::Date => "Date",
            LogicalType::Time => "Time",
            LogicalType::Uuid => "Uuid",
            LogicalType::Json => "Json",
            LogicalType::Interval => "Interval",
        };
        write!(f, "{}", name)
    }
}

/// A default-value literal attached to a column.
///
/// Model declarations carry typed variants; descriptions recovered from the
/// catalog carry [`Literal::Raw`], already-formatted SQL text. Comparing the
/// two goes through the same rendering policy, see
/// [`dialect::DefaultLiteralPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Timestamp(chrono::NaiveDateTime),
    /// Already-formatted SQL text, as recovered from the catalog.
    Raw(String),
}

impl Literal {
    /// A string literal.
    pub fn text(value: impl Into<String>) -> Self {
        Literal::Text(value.into())
    }

    /// Pre-formatted SQL text, passed through rendering untouched.
    pub fn raw(value: impl Into<String>) -> Self {
        Literal::Raw(value.into())
    }
}

/// Reference to a column in another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

/// A single column, in the shape both extraction and introspection produce.
///
/// `native_type` always holds the canonical dialect spelling (`INT`,
/// `NVARCHAR(MAX)`, ...); both sides of a diff are funneled through the same
/// type map so comparisons never see raw catalog aliases.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    /// Column name.
    pub name: String,
    /// Canonical native type spelling.
    pub native_type: String,
    /// Whether this is a primary key.
    pub is_primary_key: bool,
    /// Whether this has a unique constraint.
    pub is_unique: bool,
    /// Whether this column should be indexed.
    pub is_indexed: bool,
    /// Foreign key target, if any.
    pub foreign_key: Option<ForeignKeyRef>,
    /// Default-value literal, if any.
    pub default_value: Option<Literal>,
    /// CHECK predicate expression, if any.
    pub check_constraint: Option<String>,
}

/// A table, as declared by a model or observed in the live database.
///
/// Column names are unique within a table; table identity is its name,
/// compared case-sensitively on both sides of every comparison. Instances are
/// built fresh per reconciliation run and discarded after diffing.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    /// Table name.
    pub name: String,
    /// Columns, in declared (or catalog ordinal) order.
    pub columns: Vec<ColumnDescription>,
}

impl TableDescription {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescription> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// The set of tables observed in a live database, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    /// Tables in catalog order.
    pub tables: IndexMap<String, TableDescription>,
}

impl SchemaSet {
    /// Create a new empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableDescription> {
        self.tables.get(name)
    }

    /// Insert a table, replacing any previous entry with the same name.
    pub fn insert(&mut self, table: TableDescription) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &TableDescription> {
        self.tables.values()
    }
}

// =============================================================================
// Model descriptors
// =============================================================================

/// Declarative description of one model type: a table name plus its ordered
/// fields. Populated by the model author and handed to the reconciler as part
/// of the model registry.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    table_name: String,
    fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    /// Start a descriptor for the given table name.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Field order becomes column order.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// The declared table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The declared fields, in order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Extract this descriptor into a [`TableDescription`], mapping every
    /// field through the dialect type map.
    ///
    /// Pure function of the descriptor: no I/O, no side effects. Fails with
    /// [`SchemaError::UnmappedType`] on the first field whose logical type has
    /// no native spelling, and with [`SchemaError::MissingTableName`] when the
    /// table name is empty. Descriptors are plain data, so there is no type
    /// name to fall back to.
    pub fn to_table(&self) -> Result<TableDescription, SchemaError> {
        if self.table_name.is_empty() {
            return Err(SchemaError::MissingTableName);
        }

        let mut columns = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let native = dialect::native_type(field.logical_type).ok_or_else(|| {
                SchemaError::UnmappedType {
                    logical: field.logical_type,
                    table: self.table_name.clone(),
                    column: field.name.clone(),
                }
            })?;

            columns.push(ColumnDescription {
                name: field.name.clone(),
                native_type: native.to_string(),
                is_primary_key: field.primary_key,
                is_unique: field.unique,
                is_indexed: field.indexed,
                foreign_key: field.foreign_key.clone(),
                default_value: field.default_value.clone(),
                check_constraint: field.check.clone(),
            });
        }

        Ok(TableDescription {
            name: self.table_name.clone(),
            columns,
        })
    }
}

/// One declared field of a model: a name, a logical type, and zero or more
/// constraint annotations.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    logical_type: LogicalType,
    primary_key: bool,
    unique: bool,
    indexed: bool,
    foreign_key: Option<ForeignKeyRef>,
    default_value: Option<Literal>,
    check: Option<String>,
}

impl FieldDescriptor {
    /// A plain field with no constraints.
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            primary_key: false,
            unique: false,
            indexed: false,
            foreign_key: None,
            default_value: None,
            check: None,
        }
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Add a unique constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark for indexing.
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Declare a foreign key to `table.column`.
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Attach a default-value literal.
    pub fn default_value(mut self, literal: Literal) -> Self {
        self.default_value = Some(literal);
        self
    }

    /// Attach a CHECK predicate.
    pub fn check(mut self, predicate: impl Into<String>) -> Self {
        self.check = Some(predicate.into());
        self
    }
}
