//! Integration tests for the Redis store
//!
//! These tests start a Redis container with TestContainers, so they need
//! Docker and only run with the `redis-integration` feature:
//!
//! ```text
//! cargo test -p relkv-kv --features redis-integration
//! ```

#![cfg(feature = "redis-integration")]

use relkv_kv::{KvError, KvStore, RedisStore};
use rstest::*;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;

/// Set up test Redis container and return the connection URL
async fn setup_test_redis() -> (ContainerAsync<Redis>, String) {
	let redis_container = Redis::default()
		.start()
		.await
		.expect("Failed to start Redis container");

	let port = redis_container
		.get_host_port_ipv4(6379)
		.await
		.expect("Failed to get Redis port");

	let redis_url = format!("redis://127.0.0.1:{}", port);

	(redis_container, redis_url)
}

#[rstest]
#[tokio::test]
async fn test_strings() {
	let (_container, url) = setup_test_redis().await;
	let store = RedisStore::connect(&url).await.unwrap();

	store.set("Customer:1:first_name", "Ahmed").await.unwrap();
	assert_eq!(
		store.get("Customer:1:first_name").await.unwrap().as_deref(),
		Some("Ahmed")
	);
	assert_eq!(store.get("Customer:99:first_name").await.unwrap(), None);
	assert!(store.delete("Customer:1:first_name").await.unwrap());
	assert_eq!(store.key_count().await.unwrap(), 0);
	assert_eq!(store.backend_name(), "redis");
}

#[rstest]
#[tokio::test]
async fn test_hash_replacement() {
	let (_container, url) = setup_test_redis().await;
	let store = RedisStore::connect(&url).await.unwrap();

	let full = vec![
		("status".to_string(), "pending".to_string()),
		("total_amount".to_string(), "850.00".to_string()),
	];
	store.replace_hash("Order:1005", &full).await.unwrap();
	store.replace_hash("Order:1005", &full[1..]).await.unwrap();

	assert_eq!(
		store.hash_get_all("Order:1005").await.unwrap(),
		vec![("total_amount".to_string(), "850.00".to_string())]
	);

	store.replace_hash("Order:1005", &[]).await.unwrap();
	assert!(store.hash_get_all("Order:1005").await.unwrap().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_set_replacement() {
	let (_container, url) = setup_test_redis().await;
	let store = RedisStore::connect(&url).await.unwrap();

	let key = "idx:Product:category:Electronics";
	store.set_add(key, "999").await.unwrap();
	let members: Vec<String> = ["101", "102", "105", "106"]
		.iter()
		.map(|s| s.to_string())
		.collect();
	store.replace_set(key, &members).await.unwrap();

	assert_eq!(store.set_members(key).await.unwrap(), members);
}

#[rstest]
#[tokio::test]
async fn test_scan_keys() {
	let (_container, url) = setup_test_redis().await;
	let store = RedisStore::connect(&url).await.unwrap();

	for id in 1..=250 {
		store
			.set(&format!("Customer:{}:email", id), "x")
			.await
			.unwrap();
	}
	store.set("Customer:1:city", "Riyadh").await.unwrap();

	let keys = store.scan_keys("Customer:*:email").await.unwrap();
	assert_eq!(keys.len(), 250);
	assert!(keys.windows(2).all(|w| w[0] < w[1]));
	assert_eq!(store.key_count().await.unwrap(), 251);

	store.flush().await.unwrap();
	assert_eq!(store.key_count().await.unwrap(), 0);
}

#[rstest]
#[tokio::test]
async fn test_wrong_type() {
	let (_container, url) = setup_test_redis().await;
	let store = RedisStore::connect(&url).await.unwrap();

	store.set("Order:1001", "not a hash").await.unwrap();
	let result = store.hash_get_all("Order:1001").await;
	assert!(matches!(result, Err(KvError::WrongType(_))));
}

#[rstest]
#[tokio::test]
async fn test_unreachable_server() {
	let result = RedisStore::connect("redis://127.0.0.1:1").await;
	assert!(matches!(result, Err(KvError::Connection(_))));
}
