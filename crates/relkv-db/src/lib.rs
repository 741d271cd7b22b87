//! Row sources for relkv.
//!
//! A [`RowSource`] enumerates the rows of a table as raw column maps. Two
//! implementations are provided:
//!
//! - [`SqliteSource`] reads a SQLite database through a sqlx pool and can
//!   bootstrap the bundled e-commerce schema and seed rows
//! - [`MemorySource`] holds rows in memory, built from the seed data or from
//!   JSON fixtures ([`FixtureParser`])

pub mod error;
pub mod fixtures;
pub mod memory;
pub mod seed;
pub mod source;
pub mod sqlite;

pub use error::{DbError, DbResult};
pub use fixtures::{FixtureData, FixtureParser, FixtureRecord};
pub use memory::MemorySource;
pub use source::RowSource;
pub use sqlite::SqliteSource;
