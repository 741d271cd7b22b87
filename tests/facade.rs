//! The facade's prelude is enough to migrate and read back.

use relkv::prelude::*;
use rstest::*;

#[rstest]
#[tokio::test]
async fn test_prelude_round_trip() {
	let migrator = Migrator::new(Schema::ecommerce(), MapperOptions::default()).unwrap();
	let store = MemoryStore::new();
	let report = migrator.run(&MemorySource::seeded(), &store).await.unwrap();
	assert_eq!(report.keys_written(), 126);

	let lookup = Lookup::new(migrator.schema(), &store).with_indexes(IndexSpec::defaults());
	assert_eq!(
		lookup.find("Product", "category", "Furniture").await.unwrap(),
		vec![103, 104]
	);
	assert_eq!(
		lookup
			.get_attribute("Customer", 3, "city")
			.await
			.unwrap()
			.as_deref(),
		Some("Dammam")
	);
}

#[rstest]
fn test_slot_reexport() {
	assert_eq!(relkv::key_hash_slot("foo"), 12182);
}

#[rstest]
fn test_minimal_preset_leaves_out_redis() {
	let manifest: toml::Table =
		toml::from_str(include_str!("../Cargo.toml")).expect("Failed to parse Cargo.toml");

	let kv = &manifest["workspace"]["dependencies"]["relkv-kv"];
	assert_eq!(kv.get("default-features").and_then(toml::Value::as_bool), Some(false));

	let minimal: Vec<&str> = manifest["features"]["minimal"]
		.as_array()
		.unwrap()
		.iter()
		.filter_map(toml::Value::as_str)
		.collect();
	assert!(!minimal.contains(&"redis-backend"), "{:?}", minimal);
	assert!(!minimal.iter().any(|feature| feature.contains("redis")));
}
