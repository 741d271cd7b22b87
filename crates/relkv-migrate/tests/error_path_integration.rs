//! Error path integration tests for the migration pass.
//!
//! Every failure aborts the pass and names the table or key it stopped at.


use fixtures::{FailingStore, assert_absent, assert_value, migrator, schema, source};
use relkv_core::{MigrationError, NullPolicy, Schema, SourceRow, SourceValue};
use relkv_db::MemorySource;
use relkv_kv::{KvStore, MemoryStore};
use relkv_migrate::{MapperOptions, Migrator};
use rstest::rstest;
use std::sync::atomic::Ordering;

fn source_row(pairs: &[(&str, SourceValue)]) -> SourceRow {
	pairs
		.iter()
		.map(|(column, value)| (column.to_string(), value.clone()))
		.collect()
}

fn dangling_order() -> SourceRow {
	source_row(&[
		("order_id", 1008.into()),
		("customer_id", 99.into()),
		("order_date", "2024-07-04".into()),
		("status", "pending".into()),
		("total_amount", 120.into()),
	])
}

// ============================================================================
// Schema mismatches
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_dangling_reference_aborts(migrator: Migrator, source: MemorySource) {
	source.push("Order", dangling_order()).await;
	let store = MemoryStore::new();

	let err = migrator.run(&source, &store).await.unwrap_err();
	match err {
		MigrationError::SchemaMismatch { key, message } => {
			assert_eq!(key, "Order:1008:customer_id");
			assert!(message.contains("Customer:99"), "{}", message);
		}
		other => panic!("unexpected error: {:?}", other),
	}
	// Rows before the failing one were written.
	assert_value(&store, "Order:1007:status", "shipped").await;
	assert_absent(&store, "Order:1008:status").await;
}

#[rstest]
#[tokio::test]
async fn test_dangling_reference_allowed_without_verification(
	schema: Schema,
	source: MemorySource,
) {
	source.push("Order", dangling_order()).await;
	let options = MapperOptions::default().with_verify_references(false);
	let migrator = Migrator::new(schema, options).unwrap();
	let store = MemoryStore::new();

	migrator.run(&source, &store).await.unwrap();
	assert_value(&store, "Order:1008:customer_id", "99").await;
	assert_value(&store, "Order:1008:total_amount", "120.00").await;
	assert_absent(&store, "Order:1008:shipping_address").await;
}

#[rstest]
#[tokio::test]
async fn test_duplicate_identity_aborts(migrator: Migrator, source: MemorySource) {
	source
		.push(
			"Product",
			source_row(&[
				("product_id", 101.into()),
				("product_name", "Laptop Stand".into()),
				("category", "Furniture".into()),
				("price", 150.into()),
			]),
		)
		.await;
	let store = MemoryStore::new();

	let err = migrator.run(&source, &store).await.unwrap_err();
	assert!(matches!(err, MigrationError::SchemaMismatch { .. }));
	assert_eq!(err.key(), Some("Product:101"));

	// The second row never reached the store and no index was built from it.
	assert_value(&store, "Product:101:category", "Electronics").await;
	assert!(
		store
			.set_members("idx:Product:category:Furniture")
			.await
			.unwrap()
			.is_empty()
	);
}

#[rstest]
#[tokio::test]
async fn test_unknown_column_aborts(migrator: Migrator, source: MemorySource) {
	source
		.push(
			"Customer",
			source_row(&[
				("customer_id", 6.into()),
				("first_name", "Noura".into()),
				("last_name", "Saleh".into()),
				("email", "noura.saleh@email.com".into()),
				("loyalty_tier", "gold".into()),
			]),
		)
		.await;

	let err = migrator.run(&source, &MemoryStore::new()).await.unwrap_err();
	assert!(matches!(err, MigrationError::SchemaMismatch { .. }));
	assert_eq!(err.key(), Some("Customer:6:loyalty_tier"));
}

#[rstest]
#[tokio::test]
async fn test_null_in_required_column_aborts(migrator: Migrator, source: MemorySource) {
	source
		.update("Customer", "customer_id", 3, "email", SourceValue::Null)
		.await;

	let err = migrator.run(&source, &MemoryStore::new()).await.unwrap_err();
	assert_eq!(err.key(), Some("Customer:3:email"));
}

#[rstest]
#[tokio::test]
async fn test_negative_stock_aborts(migrator: Migrator, source: MemorySource) {
	source
		.update("Product", "product_id", 104, "stock_quantity", (-1).into())
		.await;

	let err = migrator.run(&source, &MemoryStore::new()).await.unwrap_err();
	assert_eq!(err.key(), Some("Product:104:stock_quantity"));
}

// ============================================================================
// Source and sink failures
// ============================================================================

#[rstest]
#[tokio::test]
async fn test_missing_table_is_source_unavailable(migrator: Migrator) {
	let err = migrator
		.run(&MemorySource::new(), &MemoryStore::new())
		.await
		.unwrap_err();
	match err {
		MigrationError::SourceUnavailable { table, .. } => assert_eq!(table, "Customer"),
		other => panic!("unexpected error: {:?}", other),
	}
}

#[rstest]
#[case::attribute("Product:103:price")]
#[case::row_hash("Customer:4")]
#[case::index_set("idx:Order:status:delivered")]
#[tokio::test]
async fn test_sink_failure_names_key(
	migrator: Migrator,
	source: MemorySource,
	#[case] failing_key: &str,
) {
	let store = FailingStore::new(failing_key);

	let err = migrator.run(&source, &store).await.unwrap_err();
	match &err {
		MigrationError::SinkUnavailable { key, message } => {
			assert_eq!(key, failing_key);
			assert!(message.contains("connection reset"), "{}", message);
		}
		other => panic!("unexpected error: {:?}", other),
	}
	assert_eq!(store.rejected.load(Ordering::Relaxed), 1);
}

#[rstest]
#[tokio::test]
async fn test_concurrent_sink_failure_names_key(schema: Schema, source: MemorySource) {
	let options = MapperOptions::default().with_concurrent_row_writes(true);
	let migrator = Migrator::new(schema, options).unwrap();
	let store = FailingStore::new("Order:1004:status");

	let err = migrator.run(&source, &store).await.unwrap_err();
	assert_eq!(err.key(), Some("Order:1004:status"));
	assert_absent(&store.inner, "Order:1005:status").await;
}

#[rstest]
#[tokio::test]
async fn test_rerun_recovers_after_failure(migrator: Migrator, source: MemorySource) {
	let store = FailingStore::new("Product:103:price");
	migrator.run(&source, &store).await.unwrap_err();
	assert_absent(&store.inner, "Order:1001:status").await;

	// Once the sink accepts writes again the same pass completes.
	migrator.run(&source, &store.inner).await.unwrap();
	assert_value(&store.inner, "Product:103:price", "850.00").await;
	assert_value(&store.inner, "Order:1001:status", "delivered").await;
	assert_eq!(store.inner.key_count().await.unwrap(), 126);
}

// ============================================================================
// Configuration
// ============================================================================

#[rstest]
fn test_empty_tombstone_rejected(schema: Schema) {
	let options = MapperOptions::default()
		.with_null_policy(NullPolicy::Tombstone)
		.with_tombstone("");
	let err = Migrator::new(schema, options).unwrap_err();
	assert!(matches!(err, MigrationError::Configuration(_)));
}
