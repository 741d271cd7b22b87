//! Core types for relkv.
//!
//! This crate holds everything the source side, the sink side and the mapper
//! agree on:
//!
//! - [`schema`] - table definitions, columns and foreign keys, including the
//!   bundled e-commerce schema ([`Schema::ecommerce`])
//! - [`value`] - raw source values, typed column values and their stable
//!   textual encoding
//! - [`row`] - typed rows keyed by their identity
//! - [`keys`] - the authoritative `Table:id:attribute` naming convention
//! - [`policy`] - null handling and index selection shared by settings and
//!   the mapper
//! - [`error`] - the migration error taxonomy
//!
//! # Key naming
//!
//! ```
//! use relkv_core::keys;
//!
//! assert_eq!(keys::attribute_key("Customer", 1, "email"), "Customer:1:email");
//! assert_eq!(keys::row_key("Order", 1001), "Order:1001");
//! assert_eq!(
//!     keys::index_key("Order", "status", "delivered"),
//!     "idx:Order:status:delivered"
//! );
//! ```

pub mod error;
pub mod keys;
pub mod policy;
pub mod row;
pub mod schema;
pub mod value;

pub use error::{MigrationError, Result};
pub use keys::ParsedKey;
pub use policy::{IndexSpec, NullPolicy};
pub use row::{Row, RowId, SourceRow};
pub use schema::{ColumnDef, ColumnType, ForeignKey, Schema, TableSchema};
pub use value::{SourceValue, Value};
