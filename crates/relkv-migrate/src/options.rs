//! Mapper options.

use relkv_core::policy::DEFAULT_TOMBSTONE;
use relkv_core::{IndexSpec, MigrationError, NullPolicy, Result, Schema};

/// Options controlling one migration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MapperOptions {
	/// What to write for NULL attributes.
	pub null_policy: NullPolicy,
	/// Marker written under [`NullPolicy::Tombstone`].
	pub tombstone: String,
	/// Write a `{Table}:{id}` hash per row.
	pub row_hashes: bool,
	/// Attributes to maintain `idx:` sets for.
	pub indexes: Vec<IndexSpec>,
	/// Check foreign keys against the identities seen earlier in the pass.
	pub verify_references: bool,
	/// Issue a row's attribute writes concurrently.
	pub concurrent_row_writes: bool,
	/// Plan and report without writing.
	pub dry_run: bool,
}

impl Default for MapperOptions {
	fn default() -> Self {
		Self {
			null_policy: NullPolicy::default(),
			tombstone: DEFAULT_TOMBSTONE.to_string(),
			row_hashes: true,
			indexes: IndexSpec::defaults(),
			verify_references: true,
			concurrent_row_writes: false,
			dry_run: false,
		}
	}
}

impl MapperOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
		self.null_policy = policy;
		self
	}

	pub fn with_tombstone(mut self, tombstone: impl Into<String>) -> Self {
		self.tombstone = tombstone.into();
		self
	}

	pub fn with_row_hashes(mut self, enabled: bool) -> Self {
		self.row_hashes = enabled;
		self
	}

	pub fn with_indexes(mut self, indexes: Vec<IndexSpec>) -> Self {
		self.indexes = indexes;
		self
	}

	pub fn with_verify_references(mut self, enabled: bool) -> Self {
		self.verify_references = enabled;
		self
	}

	pub fn with_concurrent_row_writes(mut self, enabled: bool) -> Self {
		self.concurrent_row_writes = enabled;
		self
	}

	pub fn with_dry_run(mut self, enabled: bool) -> Self {
		self.dry_run = enabled;
		self
	}

	/// Text written for a NULL, or `None` when nothing is written.
	pub fn null_placeholder(&self) -> Option<&str> {
		self.null_policy.placeholder(&self.tombstone)
	}

	/// Indexed attributes of `table`, in configuration order.
	pub fn indexed_attributes<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a str> {
		self.indexes
			.iter()
			.filter(move |spec| spec.table == table)
			.map(|spec| spec.attribute.as_str())
	}

	/// Returns true if `table.attribute` has an index set.
	pub fn is_indexed(&self, table: &str, attribute: &str) -> bool {
		self.indexed_attributes(table).any(|a| a == attribute)
	}

	/// Checks every index names an attribute of `schema`.
	pub fn validate(&self, schema: &Schema) -> Result<()> {
		for spec in &self.indexes {
			let table = schema.get(&spec.table).ok_or_else(|| {
				MigrationError::Configuration(format!(
					"index {} names unknown table {}",
					spec, spec.table
				))
			})?;
			if !table.has_attribute(&spec.attribute) {
				return Err(MigrationError::Configuration(format!(
					"index {} names unknown attribute {}",
					spec, spec.attribute
				)));
			}
		}
		if self.null_policy == NullPolicy::Tombstone && self.tombstone.is_empty() {
			return Err(MigrationError::Configuration(
				"tombstone null policy needs a non-empty tombstone".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_defaults() {
		let options = MapperOptions::default();
		assert_eq!(options.null_policy, NullPolicy::Skip);
		assert_eq!(options.null_placeholder(), None);
		assert!(options.row_hashes);
		assert!(options.verify_references);
		assert!(!options.concurrent_row_writes);
		assert!(options.is_indexed("Order", "status"));
		assert!(!options.is_indexed("Order", "order_date"));
		let order: Vec<_> = options.indexed_attributes("Order").collect();
		assert_eq!(order, vec!["status", "customer_id"]);
	}

	#[rstest]
	fn test_validate() {
		let schema = Schema::ecommerce();
		MapperOptions::default().validate(&schema).unwrap();

		let bad = MapperOptions::default().with_indexes(vec![IndexSpec::new("Order", "colour")]);
		assert!(matches!(
			bad.validate(&schema),
			Err(MigrationError::Configuration(_))
		));

		let bad = MapperOptions::default().with_indexes(vec![IndexSpec::new("Order", "order_id")]);
		assert!(bad.validate(&schema).is_err());

		let bad = MapperOptions::default()
			.with_null_policy(NullPolicy::Tombstone)
			.with_tombstone("");
		assert!(bad.validate(&schema).is_err());
	}

	#[rstest]
	fn test_tombstone_placeholder() {
		let options = MapperOptions::default()
			.with_null_policy(NullPolicy::Tombstone)
			.with_tombstone("N/A");
		assert_eq!(options.null_placeholder(), Some("N/A"));
	}
}
