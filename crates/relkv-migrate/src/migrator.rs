//! The migration pass.
//!
//! Tables are processed in schema order, rows in identity order, attributes
//! in column order. For every attribute of every row one key is written:
//!
//! ```text
//! {Table}:{id}:{attribute} -> stringified value
//! ```
//!
//! Optionally each row is also written as a `{Table}:{id}` hash, and
//! configured attributes get `idx:{Table}:{attribute}:{value}` sets of row
//! identities. Every write overwrites, so re-running the pass over unchanged
//! rows leaves the store unchanged. A failed pass is recovered by running it
//! again.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Instant;

use futures::future::try_join_all;
use relkv_core::{MigrationError, Result, Row, RowId, Schema, TableSchema, Value, keys};
use relkv_db::RowSource;
use relkv_kv::KvStore;
use tracing::{debug, info};

use crate::options::MapperOptions;
use crate::report::{MigrationReport, TableReport};

/// One attribute key write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeWrite {
	/// `SET key value`
	Set { key: String, value: String },
	/// `DEL key`, for NULL attributes under the skip policy so that an
	/// absent key always means NULL.
	Delete { key: String },
}

impl AttributeWrite {
	pub fn key(&self) -> &str {
		match self {
			AttributeWrite::Set { key, .. } | AttributeWrite::Delete { key } => key,
		}
	}
}

/// Writes planned for one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPlan {
	/// Attribute writes in column order.
	pub attributes: Vec<AttributeWrite>,
	/// Row hash key and its fields, when row hashes are enabled.
	pub hash: Option<(String, Vec<(String, String)>)>,
}

impl RowPlan {
	/// Number of `SET`s in the plan.
	pub fn set_count(&self) -> usize {
		self.attributes
			.iter()
			.filter(|w| matches!(w, AttributeWrite::Set { .. }))
			.count()
	}
}

/// The Row-to-KV mapper.
///
/// # Examples
///
/// ```
/// use relkv_core::Schema;
/// use relkv_db::MemorySource;
/// use relkv_kv::{KvStore, MemoryStore};
/// use relkv_migrate::{MapperOptions, Migrator};
///
/// # async fn example() -> relkv_core::Result<()> {
/// let migrator = Migrator::new(Schema::ecommerce(), MapperOptions::default())?;
/// let store = MemoryStore::new();
/// migrator.run(&MemorySource::seeded(), &store).await?;
///
/// assert_eq!(
///     store.get("Order:1001:total_amount").await.unwrap().as_deref(),
///     Some("4650.00")
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Migrator {
	schema: Schema,
	options: MapperOptions,
}

impl Migrator {
	/// Creates a mapper, validating the schema and the options against it.
	pub fn new(schema: Schema, options: MapperOptions) -> Result<Self> {
		schema.validate()?;
		options.validate(&schema)?;
		Ok(Self { schema, options })
	}

	pub fn schema(&self) -> &Schema {
		&self.schema
	}

	pub fn options(&self) -> &MapperOptions {
		&self.options
	}

	/// Plans the writes for one coerced row.
	pub fn plan_row(&self, row: &Row) -> RowPlan {
		let placeholder = self.options.null_placeholder();
		let mut attributes = Vec::with_capacity(row.values.len());
		let mut fields = Vec::with_capacity(row.values.len());

		for (attribute, value) in &row.values {
			let key = keys::attribute_key(&row.table, row.id, attribute);
			let encoded = value
				.encode()
				.or_else(|| placeholder.map(str::to_string));
			match encoded {
				Some(text) => {
					fields.push((attribute.clone(), text.clone()));
					attributes.push(AttributeWrite::Set { key, value: text });
				}
				None => attributes.push(AttributeWrite::Delete { key }),
			}
		}

		let hash = self
			.options
			.row_hashes
			.then(|| (keys::row_key(&row.table, row.id), fields));
		RowPlan { attributes, hash }
	}

	/// Runs one pass from `source` into `sink`.
	///
	/// Aborts on the first failure:
	/// - [`MigrationError::SourceUnavailable`] if a table cannot be read
	/// - [`MigrationError::SchemaMismatch`] if a row does not fit its table
	///   or references a parent row that was not migrated
	/// - [`MigrationError::SinkUnavailable`] if a write is rejected, naming
	///   the key
	pub async fn run(&self, source: &dyn RowSource, sink: &dyn KvStore) -> Result<MigrationReport> {
		let started = Instant::now();
		let mut report = MigrationReport::new(
			source.name(),
			sink.backend_name(),
			self.options.null_policy,
		);
		report.dry_run = self.options.dry_run;

		info!(
			source = source.name(),
			sink = sink.backend_name(),
			dry_run = self.options.dry_run,
			"Starting migration"
		);

		let mut seen: HashMap<String, HashSet<RowId>> = HashMap::new();
		for table in self.schema.tables() {
			let table_report = self.migrate_table(table, source, sink, &mut seen).await?;
			report.tables.push(table_report);
		}

		report.elapsed_ms = started.elapsed().as_millis() as u64;
		info!(
			rows = report.rows_read(),
			keys = report.keys_written(),
			elapsed_ms = report.elapsed_ms,
			"Migration finished"
		);
		Ok(report)
	}

	async fn migrate_table(
		&self,
		table: &TableSchema,
		source: &dyn RowSource,
		sink: &dyn KvStore,
		seen: &mut HashMap<String, HashSet<RowId>>,
	) -> Result<TableReport> {
		let raw_rows = source
			.fetch_rows(table)
			.await
			.map_err(|e| MigrationError::source_unavailable(&table.name, e))?;
		info!(table = %table.name, rows = raw_rows.len(), "Migrating table");

		let mut report = TableReport::new(&table.name);
		report.rows_read = raw_rows.len();

		let indexed: Vec<&str> = self.options.indexed_attributes(&table.name).collect();
		let mut index_sets: BTreeMap<(&str, String), BTreeSet<RowId>> = BTreeMap::new();
		let mut ids = HashSet::with_capacity(raw_rows.len());

		for raw in raw_rows {
			let row = table.coerce_row(raw)?;
			if !ids.insert(row.id) {
				return Err(MigrationError::schema_mismatch(
					keys::row_key(&table.name, row.id),
					format!("duplicate {} {} in source", table.primary_key, row.id),
				));
			}
			if self.options.verify_references {
				check_references(table, &row, seen)?;
			}

			let plan = self.plan_row(&row);
			report.attribute_keys += plan.set_count();
			report.null_attributes += row.values.values().filter(|v| v.is_null()).count();
			if let Some((_, fields)) = &plan.hash
				&& !fields.is_empty()
			{
				report.row_hashes += 1;
			}

			if !self.options.dry_run {
				self.write_row(sink, &plan).await?;
			}

			for attribute in &indexed {
				if let Some(value) = row.get(attribute).and_then(Value::encode) {
					index_sets
						.entry((*attribute, value))
						.or_default()
						.insert(row.id);
				}
			}
		}

		self.write_indexes(table, &indexed, index_sets, sink, &mut report)
			.await?;
		seen.insert(table.name.clone(), ids);

		info!(
			table = %table.name,
			attribute_keys = report.attribute_keys,
			row_hashes = report.row_hashes,
			index_keys = report.index_keys,
			"Table migrated"
		);
		Ok(report)
	}

	async fn write_row(&self, sink: &dyn KvStore, plan: &RowPlan) -> Result<()> {
		if self.options.concurrent_row_writes {
			try_join_all(plan.attributes.iter().map(|write| apply(sink, write))).await?;
		} else {
			for write in &plan.attributes {
				apply(sink, write).await?;
			}
		}

		if let Some((key, fields)) = &plan.hash {
			debug!(key = %key, fields = fields.len(), "HSET");
			sink.replace_hash(key, fields)
				.await
				.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))?;
		}
		Ok(())
	}

	async fn write_indexes(
		&self,
		table: &TableSchema,
		indexed: &[&str],
		index_sets: BTreeMap<(&str, String), BTreeSet<RowId>>,
		sink: &dyn KvStore,
		report: &mut TableReport,
	) -> Result<()> {
		let mut written = HashSet::with_capacity(index_sets.len());

		for ((attribute, value), ids) in index_sets {
			let key = keys::index_key(&table.name, attribute, &value);
			let members: Vec<String> = ids.iter().map(RowId::to_string).collect();
			report.index_keys += 1;
			report.index_memberships += members.len();

			if !self.options.dry_run {
				debug!(key = %key, members = members.len(), "SADD");
				sink.replace_set(&key, &members)
					.await
					.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))?;
			}
			written.insert(key);
		}

		// Sets whose value no row holds any more would otherwise keep
		// answering lookups.
		for attribute in indexed {
			let pattern = keys::index_pattern(&table.name, attribute);
			let existing = sink
				.scan_keys(&pattern)
				.await
				.map_err(|e| MigrationError::sink_unavailable(pattern.as_str(), e))?;

			for key in existing.into_iter().filter(|k| !written.contains(k)) {
				report.stale_index_keys += 1;
				if !self.options.dry_run {
					debug!(key = %key, "DEL stale index");
					sink.delete(&key)
						.await
						.map_err(|e| MigrationError::sink_unavailable(key.as_str(), e))?;
				}
			}
		}
		Ok(())
	}
}

async fn apply(sink: &dyn KvStore, write: &AttributeWrite) -> Result<()> {
	let result = match write {
		AttributeWrite::Set { key, value } => {
			debug!(key = %key, value = %value, "SET");
			sink.set(key, value).await
		}
		AttributeWrite::Delete { key } => {
			debug!(key = %key, "DEL null attribute");
			sink.delete(key).await.map(|_| ())
		}
	};
	result.map_err(|e| MigrationError::sink_unavailable(write.key(), e))
}

fn check_references(
	table: &TableSchema,
	row: &Row,
	seen: &HashMap<String, HashSet<RowId>>,
) -> Result<()> {
	for (column, fk) in table.foreign_keys() {
		let Some(value) = row.get(&column.name) else {
			continue;
		};
		if value.is_null() {
			continue;
		}

		let key = keys::attribute_key(&table.name, row.id, &column.name);
		let parent_id = value.as_integer().ok_or_else(|| {
			MigrationError::schema_mismatch(key.clone(), "foreign key is not an integer")
		})?;
		let exists = seen
			.get(&fk.table)
			.is_some_and(|ids| ids.contains(&parent_id));
		if !exists {
			return Err(MigrationError::schema_mismatch(
				key,
				format!(
					"references {} which does not exist",
					keys::row_key(&fk.table, parent_id)
				),
			));
		}
	}
	Ok(())
}
