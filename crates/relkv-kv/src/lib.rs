//! Key-value sinks for relkv.
//!
//! [`KvStore`] is the sink surface the mapper writes through. Backends:
//!
//! - [`MemoryStore`] - in-process store with Redis semantics, used by tests
//!   and the demo
//! - [`RedisStore`] - a single Redis node or a Redis Cluster, through
//!   deadpool-redis pools (feature `redis-backend`, on by default)
//!
//! [`slots`] computes Redis Cluster hash slots for diagnostics only.

pub mod error;
pub mod memory;
pub mod pattern;
#[cfg(feature = "redis-backend")]
pub mod redis_store;
pub mod slots;
pub mod store;

pub use error::{KvError, KvResult};
pub use memory::{MemoryStore, StoreStatistics, StoredValue};
pub use pattern::KeyPattern;
#[cfg(feature = "redis-backend")]
pub use redis_store::RedisStore;
pub use slots::{MasterNode, SlotLayout, SlotRange, key_hash_slot};
pub use store::KvStore;
