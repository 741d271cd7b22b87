//! # relkv
//!
//! Copies relational rows into a key-value store as flat
//! `Table:id:attribute` keys and reads them back.
//!
//! Every non-identity column of a row becomes one string key:
//!
//! ```text
//! Customer:1:first_name -> "Ahmed"
//! Order:1001:customer_id -> "1"
//! ```
//!
//! Optionally each row is also written as a hash under `Table:id`, and
//! chosen attributes get secondary-index sets under
//! `idx:Table:attribute:value`.
//!
//! ## Feature Flags
//!
//! ### Presets
//!
//! - `minimal` - Mapper, sources and the in-memory sink
//! - `standard` (default) - `minimal` plus Redis and layered settings
//! - `full` - Everything
//!
//! ### Components
//!
//! - `core` - Schema, values and key layout
//! - `db` - Row sources: SQLite, in-memory seed data, JSON fixtures
//! - `kv` - Key-value stores and the hash-slot layout
//! - `redis-backend` - Redis and Redis Cluster store
//! - `migrate` - The migrator and read-back lookups
//! - `conf` - Settings from defaults, a TOML file and `RELKV_*` variables
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use relkv::prelude::*;
//!
//! let migrator = Migrator::new(Schema::ecommerce(), MapperOptions::default())?;
//! let store = MemoryStore::new();
//! let report = migrator.run(&MemorySource::seeded(), &store).await?;
//!
//! let lookup = Lookup::new(migrator.schema(), &store).with_indexes(IndexSpec::defaults());
//! let delivered = lookup.find("Order", "status", "delivered").await?;
//! ```

#[cfg(feature = "core")]
pub use relkv_core as core;
#[cfg(feature = "db")]
pub use relkv_db as db;
#[cfg(feature = "kv")]
pub use relkv_kv as kv;
#[cfg(feature = "migrate")]
pub use relkv_migrate as migrate;
#[cfg(feature = "conf")]
pub use relkv_conf as conf;

// Re-export core types
#[cfg(feature = "core")]
pub use relkv_core::{
	ColumnDef, ColumnType, IndexSpec, MigrationError, NullPolicy, Result, Row, RowId, Schema,
	TableSchema, Value, keys,
};

// Re-export sources
#[cfg(feature = "db")]
pub use relkv_db::{DbError, FixtureParser, MemorySource, RowSource, SqliteSource};

// Re-export stores
#[cfg(feature = "kv")]
pub use relkv_kv::{KvError, KvStore, MemoryStore, SlotLayout, key_hash_slot};
#[cfg(feature = "redis-backend")]
pub use relkv_kv::RedisStore;

// Re-export the mapper
#[cfg(feature = "migrate")]
pub use relkv_migrate::{Lookup, MapperOptions, MigrationReport, Migrator, TableReport};

// Re-export settings
#[cfg(feature = "conf")]
pub use relkv_conf::{Settings, SettingsError, SinkBackend};

/// Commonly used types.
pub mod prelude {
	#[cfg(feature = "core")]
	pub use crate::{IndexSpec, MigrationError, NullPolicy, RowId, Schema};

	#[cfg(feature = "db")]
	pub use crate::{MemorySource, RowSource, SqliteSource};

	#[cfg(feature = "kv")]
	pub use crate::{KvStore, MemoryStore};

	#[cfg(feature = "redis-backend")]
	pub use crate::RedisStore;

	#[cfg(feature = "migrate")]
	pub use crate::{Lookup, MapperOptions, MigrationReport, Migrator};

	#[cfg(feature = "conf")]
	pub use crate::Settings;
}
