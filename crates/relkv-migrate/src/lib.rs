//! The Row-to-KV mapper.
//!
//! [`Migrator`] copies every row of a [`Schema`](relkv_core::Schema) from a
//! [`RowSource`](relkv_db::RowSource) into a [`KvStore`](relkv_kv::KvStore)
//! as `{Table}:{id}:{attribute}` keys, with optional row hashes and index
//! sets, and returns a [`MigrationReport`]. [`Lookup`] implements the read
//! side over the resulting keys.

pub mod lookup;
pub mod migrator;
pub mod options;
pub mod report;

pub use lookup::{Lookup, ResolvedReference, RowAttributes};
pub use migrator::{AttributeWrite, Migrator, RowPlan};
pub use options::MapperOptions;
pub use report::{MigrationReport, TableReport};
