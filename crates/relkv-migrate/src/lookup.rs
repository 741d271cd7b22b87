//! Read-side lookups over the migrated keys.
//!
//! - direct: `(table, id, attribute)` to one value, a single `GET`
//! - row: `(table, id)` to the attribute map, from the row hash or by
//!   scanning `{T}:{id}:*`
//! - find: `(table, attribute, value)` to row identities, through the index
//!   set or by scanning `{T}:*:{attribute}`
//! - scan: one attribute across every row of a table
//! - reference follow: a child row's foreign key to the parent row

use indexmap::IndexMap;
use relkv_core::{IndexSpec, MigrationError, ParsedKey, Result, RowId, Schema, TableSchema, keys};
use relkv_kv::KvStore;
use tracing::{debug, warn};

/// Attribute map of one row, in schema column order.
pub type RowAttributes = IndexMap<String, String>;

/// A parent row reached through a foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
	pub table: String,
	pub id: RowId,
	pub attributes: RowAttributes,
}

/// Lookup procedures against a store holding a migrated schema.
pub struct Lookup<'a> {
	schema: &'a Schema,
	store: &'a dyn KvStore,
	indexes: Vec<IndexSpec>,
}

impl<'a> Lookup<'a> {
	/// Creates a lookup that finds rows by scanning only.
	pub fn new(schema: &'a Schema, store: &'a dyn KvStore) -> Self {
		Self {
			schema,
			store,
			indexes: Vec::new(),
		}
	}

	/// Declares which attributes have index sets, so [`Lookup::find`] can
	/// use them.
	pub fn with_indexes(mut self, indexes: Vec<IndexSpec>) -> Self {
		self.indexes = indexes;
		self
	}

	fn is_indexed(&self, table: &str, attribute: &str) -> bool {
		self.indexes
			.iter()
			.any(|spec| spec.table == table && spec.attribute == attribute)
	}

	fn attribute_of(&self, table: &str, attribute: &str) -> Result<&'a TableSchema> {
		let schema = self.schema.require(table)?;
		if schema.has_attribute(attribute) {
			Ok(schema)
		} else {
			Err(MigrationError::schema_mismatch(
				keys::attribute_pattern(table, attribute),
				format!("{} has no attribute {}", table, attribute),
			))
		}
	}

	/// Direct lookup of `{table}:{id}:{attribute}`.
	///
	/// `None` means the key is absent, which under the skip null policy is
	/// how a NULL reads back.
	pub async fn get_attribute(
		&self,
		table: &str,
		id: RowId,
		attribute: &str,
	) -> Result<Option<String>> {
		self.attribute_of(table, attribute)?;
		let key = keys::attribute_key(table, id, attribute);
		debug!(key = %key, "GET");
		self.store
			.get(&key)
			.await
			.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))
	}

	/// Row lookup. Reads the `{table}:{id}` hash and falls back to the
	/// attribute keys when no hash was written. `None` if the row has no keys
	/// at all.
	pub async fn get_row(&self, table: &str, id: RowId) -> Result<Option<RowAttributes>> {
		let schema = self.schema.require(table)?;
		let row_key = keys::row_key(table, id);
		let hash = self
			.store
			.hash_get_all(&row_key)
			.await
			.map_err(|e| MigrationError::sink_unavailable(row_key.as_str(), e))?;

		let found: Vec<(String, String)> = if !hash.is_empty() {
			hash
		} else {
			let pattern = keys::row_attributes_pattern(table, id);
			let attribute_keys = self
				.store
				.scan_keys(&pattern)
				.await
				.map_err(|e| MigrationError::sink_unavailable(pattern.as_str(), e))?;
			if !attribute_keys.is_empty() {
				warn!(key = %row_key, "No row hash, reading attribute keys");
			}

			let mut found = Vec::with_capacity(attribute_keys.len());
			for key in attribute_keys {
				let Some(ParsedKey::Attribute { attribute, .. }) = ParsedKey::parse(&key) else {
					continue;
				};
				let value = self
					.store
					.get(&key)
					.await
					.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))?;
				if let Some(value) = value {
					found.push((attribute, value));
				}
			}
			found
		};

		if found.is_empty() {
			return Ok(None);
		}
		Ok(Some(order_by_schema(schema, found)))
	}

	/// Row identities whose `attribute` equals `value`, from the index set
	/// `idx:{table}:{attribute}:{value}`.
	pub async fn find_by_index(
		&self,
		table: &str,
		attribute: &str,
		value: &str,
	) -> Result<Vec<RowId>> {
		self.attribute_of(table, attribute)?;
		let key = keys::index_key(table, attribute, value);
		let members = self
			.store
			.set_members(&key)
			.await
			.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))?;

		let mut ids = members
			.iter()
			.map(|member| {
				member.parse::<RowId>().map_err(|_| {
					MigrationError::schema_mismatch(
						key.as_str(),
						format!("index member {:?} is not a row identity", member),
					)
				})
			})
			.collect::<Result<Vec<_>>>()?;
		ids.sort_unstable();
		Ok(ids)
	}

	/// Row identities whose `attribute` equals `value`, by scanning every
	/// `{table}:*:{attribute}` key.
	pub async fn find_by_scan(
		&self,
		table: &str,
		attribute: &str,
		value: &str,
	) -> Result<Vec<RowId>> {
		Ok(self
			.scan_attribute(table, attribute)
			.await?
			.into_iter()
			.filter(|(_, v)| v == value)
			.map(|(id, _)| id)
			.collect())
	}

	/// Uses the index set when `table.attribute` is indexed, a scan otherwise.
	pub async fn find(&self, table: &str, attribute: &str, value: &str) -> Result<Vec<RowId>> {
		if self.is_indexed(table, attribute) {
			self.find_by_index(table, attribute, value).await
		} else {
			self.find_by_scan(table, attribute, value).await
		}
	}

	/// `(id, value)` for `attribute` across every row of `table`, sorted by
	/// id.
	pub async fn scan_attribute(&self, table: &str, attribute: &str) -> Result<Vec<(RowId, String)>> {
		self.attribute_of(table, attribute)?;
		let pattern = keys::attribute_pattern(table, attribute);
		let matched = self
			.store
			.scan_keys(&pattern)
			.await
			.map_err(|e| MigrationError::sink_unavailable(pattern.as_str(), e))?;

		let mut values = Vec::with_capacity(matched.len());
		for key in matched {
			let Some(id) = ParsedKey::parse(&key).and_then(|parsed| parsed.id()) else {
				continue;
			};
			let value = self
				.store
				.get(&key)
				.await
				.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))?;
			if let Some(value) = value {
				values.push((id, value));
			}
		}
		values.sort_by_key(|(id, _)| *id);
		Ok(values)
	}

	/// Follows the foreign key `column` of row `{table}:{id}` to its parent.
	///
	/// `None` if the child has no value for the column or the parent row has
	/// no keys.
	pub async fn follow_reference(
		&self,
		table: &str,
		id: RowId,
		column: &str,
	) -> Result<Option<ResolvedReference>> {
		let schema = self.schema.require(table)?;
		let fk = schema
			.get_column(column)
			.and_then(|c| c.references.as_ref())
			.ok_or_else(|| {
				MigrationError::schema_mismatch(
					keys::attribute_key(table, id, column),
					format!("{}.{} is not a foreign key", table, column),
				)
			})?;

		let Some(raw) = self.get_attribute(table, id, column).await? else {
			return Ok(None);
		};
		let parent_id = raw.parse::<RowId>().map_err(|_| {
			MigrationError::schema_mismatch(
				keys::attribute_key(table, id, column),
				format!("{:?} is not a row identity", raw),
			)
		})?;

		Ok(self
			.get_row(&fk.table, parent_id)
			.await?
			.map(|attributes| ResolvedReference {
				table: fk.table.clone(),
				id: parent_id,
				attributes,
			}))
	}
}

fn order_by_schema(schema: &TableSchema, found: Vec<(String, String)>) -> RowAttributes {
	let mut found: IndexMap<String, String> = found.into_iter().collect();
	let mut ordered = IndexMap::with_capacity(found.len());
	for column in schema.attributes() {
		if let Some(value) = found.shift_remove(&column.name) {
			ordered.insert(column.name.clone(), value);
		}
	}
	// Fields the schema does not know stay visible, after the known ones.
	ordered.extend(found);
	ordered
}
