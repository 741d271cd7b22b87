//! Redis key-value store
//!
//! Single node or Redis Cluster, both through deadpool-redis connection
//! pools. Cluster slot routing, redirections and replica handling are left to
//! the cluster client.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use deadpool_redis::cluster::{Config as ClusterConfig, Pool as ClusterPool};
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::{Cmd, FromRedisValue, Pipeline};
use tracing::{debug, info};

use crate::error::{KvError, KvResult};
use crate::store::KvStore;

/// Number of keys to scan per iteration
const SCAN_BATCH_SIZE: usize = 100;

#[derive(Clone)]
enum Backend {
	Single(Pool),
	Cluster(ClusterPool),
}

/// Redis store with connection pooling.
#[derive(Clone)]
pub struct RedisStore {
	backend: Backend,
}

impl RedisStore {
	/// Connects to a single Redis node and checks it answers `PING`.
	///
	/// # Examples
	///
	/// ```no_run
	/// use relkv_kv::RedisStore;
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let store = RedisStore::connect("redis://127.0.0.1:6379").await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn connect(url: &str) -> KvResult<Self> {
		let pool = PoolConfig::from_url(url)
			.create_pool(Some(Runtime::Tokio1))
			.map_err(|e| KvError::Configuration(format!("Failed to create Redis pool: {}", e)))?;
		let store = Self {
			backend: Backend::Single(pool),
		};
		store.ping().await?;
		info!(url, "Connected to Redis");
		Ok(store)
	}

	/// Connects to a Redis Cluster through its seed nodes and checks it
	/// answers `PING`.
	///
	/// # Examples
	///
	/// ```no_run
	/// use relkv_kv::RedisStore;
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let store = RedisStore::connect_cluster(&[
	///     "redis://127.0.0.1:7000".to_string(),
	///     "redis://127.0.0.1:7001".to_string(),
	/// ])
	/// .await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn connect_cluster(urls: &[String]) -> KvResult<Self> {
		if urls.is_empty() {
			return Err(KvError::Configuration(
				"Redis Cluster needs at least one seed node".to_string(),
			));
		}
		let pool = ClusterConfig::from_urls(urls.to_vec())
			.create_pool(Some(Runtime::Tokio1))
			.map_err(|e| {
				KvError::Configuration(format!("Failed to create Redis Cluster pool: {}", e))
			})?;
		let store = Self {
			backend: Backend::Cluster(pool),
		};
		store.ping().await?;
		info!(seeds = urls.len(), "Connected to Redis Cluster");
		Ok(store)
	}

	/// Returns true when connected to a cluster.
	pub fn is_cluster(&self) -> bool {
		matches!(self.backend, Backend::Cluster(_))
	}

	/// `PING`.
	pub async fn ping(&self) -> KvResult<()> {
		let reply: String = self.query(&redis::cmd("PING")).await?;
		if reply == "PONG" {
			Ok(())
		} else {
			Err(KvError::Command(format!("Unexpected PING reply: {}", reply)))
		}
	}

	/// `FLUSHDB` (every master in cluster mode).
	pub async fn flush(&self) -> KvResult<()> {
		let _: () = self.query(&redis::cmd("FLUSHDB")).await?;
		Ok(())
	}

	async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> KvResult<T> {
		match &self.backend {
			Backend::Single(pool) => {
				let mut conn = pool.get().await?;
				Ok(cmd.query_async(&mut *conn).await?)
			}
			Backend::Cluster(pool) => {
				let mut conn = pool.get().await?;
				Ok(cmd.query_async(&mut *conn).await?)
			}
		}
	}

	async fn query_pipeline(&self, pipe: &Pipeline) -> KvResult<()> {
		match &self.backend {
			Backend::Single(pool) => {
				let mut conn = pool.get().await?;
				let _: () = pipe.query_async(&mut *conn).await?;
			}
			Backend::Cluster(pool) => {
				let mut conn = pool.get().await?;
				let _: () = pipe.query_async(&mut *conn).await?;
			}
		}
		Ok(())
	}

	async fn scan_single(&self, pool: &Pool, pattern: &str) -> KvResult<BTreeSet<String>> {
		let mut conn = pool.get().await?;
		let mut found = BTreeSet::new();
		let mut cursor: u64 = 0;

		loop {
			let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
				.arg(cursor)
				.arg("MATCH")
				.arg(pattern)
				.arg("COUNT")
				.arg(SCAN_BATCH_SIZE)
				.query_async(&mut *conn)
				.await?;

			found.extend(keys);

			cursor = next_cursor;
			if cursor == 0 {
				break;
			}
		}
		Ok(found)
	}
}

#[async_trait]
impl KvStore for RedisStore {
	fn backend_name(&self) -> &str {
		match self.backend {
			Backend::Single(_) => "redis",
			Backend::Cluster(_) => "redis-cluster",
		}
	}

	async fn set(&self, key: &str, value: &str) -> KvResult<()> {
		let _: () = self.query(redis::cmd("SET").arg(key).arg(value)).await?;
		Ok(())
	}

	async fn get(&self, key: &str) -> KvResult<Option<String>> {
		self.query(redis::cmd("GET").arg(key)).await
	}

	async fn delete(&self, key: &str) -> KvResult<bool> {
		let removed: i64 = self.query(redis::cmd("DEL").arg(key)).await?;
		Ok(removed > 0)
	}

	async fn replace_hash(&self, key: &str, fields: &[(String, String)]) -> KvResult<()> {
		let mut pipe = redis::pipe();
		pipe.cmd("DEL").arg(key).ignore();
		if !fields.is_empty() {
			let hset = pipe.cmd("HSET").arg(key);
			for (field, value) in fields {
				hset.arg(field).arg(value);
			}
			hset.ignore();
		}
		debug!(key, fields = fields.len(), "Replacing hash");
		self.query_pipeline(&pipe).await
	}

	async fn hash_get_all(&self, key: &str) -> KvResult<Vec<(String, String)>> {
		let hash: BTreeMap<String, String> = self.query(redis::cmd("HGETALL").arg(key)).await?;
		Ok(hash.into_iter().collect())
	}

	async fn replace_set(&self, key: &str, members: &[String]) -> KvResult<()> {
		let mut pipe = redis::pipe();
		pipe.cmd("DEL").arg(key).ignore();
		if !members.is_empty() {
			pipe.cmd("SADD").arg(key).arg(members).ignore();
		}
		debug!(key, members = members.len(), "Replacing set");
		self.query_pipeline(&pipe).await
	}

	async fn set_add(&self, key: &str, member: &str) -> KvResult<bool> {
		let added: i64 = self.query(redis::cmd("SADD").arg(key).arg(member)).await?;
		Ok(added > 0)
	}

	async fn set_members(&self, key: &str) -> KvResult<Vec<String>> {
		let mut members: Vec<String> = self.query(redis::cmd("SMEMBERS").arg(key)).await?;
		members.sort();
		Ok(members)
	}

	async fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
		let keys = match &self.backend {
			Backend::Single(pool) => self.scan_single(pool, pattern).await?,
			Backend::Cluster(_) => {
				// The cluster client sends KEYS to every master and
				// concatenates the replies.
				let keys: Vec<String> = self.query(redis::cmd("KEYS").arg(pattern)).await?;
				keys.into_iter().collect()
			}
		};
		Ok(keys.into_iter().collect())
	}

	async fn key_count(&self) -> KvResult<u64> {
		self.query(&redis::cmd("DBSIZE")).await
	}
}
