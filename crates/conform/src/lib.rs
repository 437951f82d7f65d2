//! Declarative schema reconciliation for SQL Server.
//!
//! This crate compares a set of declared models against the live structure of
//! a SQL Server database and applies the minimal sequence of DDL statements
//! that brings the database into conformance:
//!
//! - models are plain-data [`ModelDescriptor`]s, extracted into table
//!   descriptions through the dialect type map;
//! - the live catalog is read in one bulk `INFORMATION_SCHEMA` query and
//!   reduced to the same description shape;
//! - the differ emits an ordered, deterministic [`ChangeSet`], additive and
//!   corrective for declared tables only;
//! - the executor applies the rendered statements in a single transaction,
//!   rolling the whole batch back on the first failure.
//!
//! # Example
//!
//! ```ignore
//! use conform::{FieldDescriptor, Literal, LogicalType, ModelDescriptor, Reconciler};
//!
//! let roles = ModelDescriptor::new("Roles")
//!     .field(FieldDescriptor::new("Id", LogicalType::Integer).primary_key())
//!     .field(FieldDescriptor::new("Name", LogicalType::Text).unique())
//!     .field(
//!         FieldDescriptor::new("CreatedAt", LogicalType::Timestamp)
//!             .default_value(Literal::text("CURRENT_TIMESTAMP")),
//!     );
//!
//! let reconciler = Reconciler::new(std::env::var("DATABASE_URL")?);
//! let plan = reconciler.plan(&[roles]).await?;
//! println!("{}", plan.changes());
//! reconciler.apply(&plan).await?;
//! ```

mod client;
mod ddl;
mod diff;
mod error;
mod execute;
mod introspect;
mod reconcile;

pub use client::{SqlClient, connect};
pub use ddl::{column_clause, create_table_sql};
pub use diff::{ChangeOperation, ChangeSet, diff_schemas};
pub use error::Error;
pub use execute::{ApplyReport, apply_batch, execute_one};
pub use introspect::introspect_schema;
pub use reconcile::{Plan, Reconciler};

// Re-export the description types so callers only need one crate.
pub use conform_schema::{
    ColumnDescription, FieldDescriptor, ForeignKeyRef, Literal, LogicalType, ModelDescriptor,
    SchemaError, SchemaSet, TableDescription, dialect,
};

/// Result type for conform operations.
pub type Result<T> = std::result::Result<T, Error>;
