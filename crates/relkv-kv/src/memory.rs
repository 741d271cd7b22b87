//! In-memory key-value store

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{KvError, KvResult};
use crate::pattern::KeyPattern;
use crate::store::KvStore;

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
	String(String),
	Hash(BTreeMap<String, String>),
	Set(BTreeSet<String>),
}

impl StoredValue {
	fn type_name(&self) -> &'static str {
		match self {
			StoredValue::String(_) => "string",
			StoredValue::Hash(_) => "hash",
			StoredValue::Set(_) => "set",
		}
	}
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
	/// Read commands served
	pub reads: u64,
	/// Write commands served
	pub writes: u64,
	/// Current number of keys
	pub key_count: u64,
}

/// In-memory store with Redis semantics for the commands of [`KvStore`].
///
/// Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
	store: Arc<RwLock<HashMap<String, StoredValue>>>,
	reads: Arc<AtomicU64>,
	writes: Arc<AtomicU64>,
}

impl MemoryStore {
	/// Create an empty store
	///
	/// # Examples
	///
	/// ```
	/// use relkv_kv::{KvStore, MemoryStore};
	///
	/// # async fn example() {
	/// let store = MemoryStore::new();
	/// store.set("Customer:1:first_name", "Ahmed").await.unwrap();
	/// assert_eq!(
	///     store.get("Customer:1:first_name").await.unwrap().as_deref(),
	///     Some("Ahmed")
	/// );
	/// # }
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Full copy of the store contents, ordered by key.
	pub async fn snapshot(&self) -> BTreeMap<String, StoredValue> {
		self.store
			.read()
			.await
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}

	/// Removes every key.
	pub async fn clear(&self) {
		self.store.write().await.clear();
	}

	pub async fn get_statistics(&self) -> StoreStatistics {
		StoreStatistics {
			reads: self.reads.load(Ordering::Relaxed),
			writes: self.writes.load(Ordering::Relaxed),
			key_count: self.store.read().await.len() as u64,
		}
	}

	fn record_read(&self) {
		self.reads.fetch_add(1, Ordering::Relaxed);
	}

	fn record_write(&self) {
		self.writes.fetch_add(1, Ordering::Relaxed);
	}
}

fn wrong_type(key: &str, found: &StoredValue, wanted: &str) -> KvError {
	KvError::WrongType(format!(
		"{} holds a {}, not a {}",
		key,
		found.type_name(),
		wanted
	))
}

#[async_trait]
impl KvStore for MemoryStore {
	fn backend_name(&self) -> &str {
		"memory"
	}

	async fn set(&self, key: &str, value: &str) -> KvResult<()> {
		self.record_write();
		self.store
			.write()
			.await
			.insert(key.to_string(), StoredValue::String(value.to_string()));
		Ok(())
	}

	async fn get(&self, key: &str) -> KvResult<Option<String>> {
		self.record_read();
		match self.store.read().await.get(key) {
			None => Ok(None),
			Some(StoredValue::String(value)) => Ok(Some(value.clone())),
			Some(other) => Err(wrong_type(key, other, "string")),
		}
	}

	async fn delete(&self, key: &str) -> KvResult<bool> {
		self.record_write();
		Ok(self.store.write().await.remove(key).is_some())
	}

	async fn replace_hash(&self, key: &str, fields: &[(String, String)]) -> KvResult<()> {
		self.record_write();
		let mut store = self.store.write().await;
		store.remove(key);
		if !fields.is_empty() {
			let hash = fields.iter().cloned().collect();
			store.insert(key.to_string(), StoredValue::Hash(hash));
		}
		Ok(())
	}

	async fn hash_get_all(&self, key: &str) -> KvResult<Vec<(String, String)>> {
		self.record_read();
		match self.store.read().await.get(key) {
			None => Ok(Vec::new()),
			Some(StoredValue::Hash(hash)) => Ok(hash
				.iter()
				.map(|(k, v)| (k.clone(), v.clone()))
				.collect()),
			Some(other) => Err(wrong_type(key, other, "hash")),
		}
	}

	async fn replace_set(&self, key: &str, members: &[String]) -> KvResult<()> {
		self.record_write();
		let mut store = self.store.write().await;
		store.remove(key);
		if !members.is_empty() {
			let set = members.iter().cloned().collect();
			store.insert(key.to_string(), StoredValue::Set(set));
		}
		Ok(())
	}

	async fn set_add(&self, key: &str, member: &str) -> KvResult<bool> {
		self.record_write();
		let mut store = self.store.write().await;
		match store
			.entry(key.to_string())
			.or_insert_with(|| StoredValue::Set(BTreeSet::new()))
		{
			StoredValue::Set(set) => Ok(set.insert(member.to_string())),
			other => Err(wrong_type(key, other, "set")),
		}
	}

	async fn set_members(&self, key: &str) -> KvResult<Vec<String>> {
		self.record_read();
		match self.store.read().await.get(key) {
			None => Ok(Vec::new()),
			Some(StoredValue::Set(set)) => Ok(set.iter().cloned().collect()),
			Some(other) => Err(wrong_type(key, other, "set")),
		}
	}

	async fn scan_keys(&self, pattern: &str) -> KvResult<Vec<String>> {
		self.record_read();
		let pattern = KeyPattern::new(pattern)?;
		let mut keys: Vec<String> = self
			.store
			.read()
			.await
			.keys()
			.filter(|k| pattern.matches(k))
			.cloned()
			.collect();
		keys.sort();
		Ok(keys)
	}

	async fn key_count(&self) -> KvResult<u64> {
		self.record_read();
		Ok(self.store.read().await.len() as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;

	#[fixture]
	fn store() -> MemoryStore {
		MemoryStore::new()
	}

	#[rstest]
	#[tokio::test]
	async fn test_set_get_delete(store: MemoryStore) {
		store.set("Order:1001:status", "delivered").await.unwrap();
		assert_eq!(
			store.get("Order:1001:status").await.unwrap(),
			Some("delivered".to_string())
		);
		assert!(store.delete("Order:1001:status").await.unwrap());
		assert!(!store.delete("Order:1001:status").await.unwrap());
		assert_eq!(store.get("Order:1001:status").await.unwrap(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_replace_hash(store: MemoryStore) {
		let fields = vec![
			("status".to_string(), "pending".to_string()),
			("customer_id".to_string(), "4".to_string()),
		];
		store.replace_hash("Order:1005", &fields).await.unwrap();
		store
			.replace_hash("Order:1005", &fields[..1])
			.await
			.unwrap();

		let hash = store.hash_get_all("Order:1005").await.unwrap();
		assert_eq!(hash, vec![("status".to_string(), "pending".to_string())]);

		store.replace_hash("Order:1005", &[]).await.unwrap();
		assert_eq!(store.key_count().await.unwrap(), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_sets(store: MemoryStore) {
		assert!(store.set_add("idx:Order:status:shipped", "1003").await.unwrap());
		assert!(!store.set_add("idx:Order:status:shipped", "1003").await.unwrap());
		store
			.replace_set(
				"idx:Order:status:shipped",
				&["1007".to_string(), "1003".to_string()],
			)
			.await
			.unwrap();
		assert_eq!(
			store.set_members("idx:Order:status:shipped").await.unwrap(),
			vec!["1003", "1007"]
		);
		assert!(store.set_members("idx:Order:status:lost").await.unwrap().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_wrong_type(store: MemoryStore) {
		store.set("Customer:1", "oops").await.unwrap();
		assert!(matches!(
			store.hash_get_all("Customer:1").await,
			Err(KvError::WrongType(_))
		));
		assert!(matches!(
			store.set_add("Customer:1", "x").await,
			Err(KvError::WrongType(_))
		));

		// SET overwrites whatever the key held
		store.replace_set("Customer:2", &["1".to_string()]).await.unwrap();
		store.set("Customer:2", "plain").await.unwrap();
		assert_eq!(store.get("Customer:2").await.unwrap().as_deref(), Some("plain"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_scan_keys_sorted(store: MemoryStore) {
		for id in [3, 1, 2] {
			store
				.set(&format!("Customer:{}:email", id), "x")
				.await
				.unwrap();
			store
				.set(&format!("Customer:{}:city", id), "y")
				.await
				.unwrap();
		}
		let keys = store.scan_keys("Customer:*:email").await.unwrap();
		assert_eq!(
			keys,
			vec!["Customer:1:email", "Customer:2:email", "Customer:3:email"]
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_clones_share_data_and_statistics(store: MemoryStore) {
		let other = store.clone();
		other.set("k", "v").await.unwrap();
		assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

		let stats = store.get_statistics().await;
		assert_eq!(stats.writes, 1);
		assert_eq!(stats.reads, 1);
		assert_eq!(stats.key_count, 1);

		store.clear().await;
		assert!(store.snapshot().await.is_empty());
	}
}
