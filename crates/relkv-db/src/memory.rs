//! In-memory row source.

use async_trait::async_trait;
use indexmap::IndexMap;
use relkv_core::{SourceRow, SourceValue, TableSchema};
use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};
use crate::seed;
use crate::source::RowSource;

/// Rows held in memory, keyed by table name.
///
/// Used for tests, for fixtures, and as the relational side of the demo.
#[derive(Debug, Default)]
pub struct MemorySource {
	tables: RwLock<IndexMap<String, Vec<SourceRow>>>,
}

impl MemorySource {
	/// Creates an empty source.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a source holding the bundled e-commerce seed rows.
	pub fn seeded() -> Self {
		Self::with_tables(seed::ecommerce())
	}

	/// Creates a source from prepared tables.
	pub fn with_tables(tables: IndexMap<String, Vec<SourceRow>>) -> Self {
		Self {
			tables: RwLock::new(tables),
		}
	}

	/// Appends a row to `table`, creating the table if needed.
	pub async fn push(&self, table: &str, row: SourceRow) {
		self.tables
			.write()
			.await
			.entry(table.to_string())
			.or_default()
			.push(row);
	}

	/// Replaces one column of the row whose `id_column` equals `id`.
	///
	/// Returns false if no such row exists.
	pub async fn update(
		&self,
		table: &str,
		id_column: &str,
		id: i64,
		column: &str,
		value: SourceValue,
	) -> bool {
		let mut tables = self.tables.write().await;
		let Some(rows) = tables.get_mut(table) else {
			return false;
		};
		match rows
			.iter_mut()
			.find(|row| row.get(id_column) == Some(&SourceValue::Int(id)))
		{
			Some(row) => {
				row.insert(column.to_string(), value);
				true
			}
			None => false,
		}
	}

	/// Number of rows held for `table`.
	pub async fn row_count(&self, table: &str) -> usize {
		self.tables
			.read()
			.await
			.get(table)
			.map_or(0, Vec::len)
	}
}

#[async_trait]
impl RowSource for MemorySource {
	fn name(&self) -> &str {
		"memory"
	}

	async fn fetch_rows(&self, table: &TableSchema) -> DbResult<Vec<SourceRow>> {
		let tables = self.tables.read().await;
		let rows = tables
			.get(&table.name)
			.ok_or_else(|| DbError::TableNotFound(table.name.clone()))?;

		let mut rows = rows.clone();
		rows.sort_by_key(|row| match row.get(&table.primary_key) {
			Some(SourceValue::Int(id)) => *id,
			_ => i64::MAX,
		});
		Ok(rows)
	}
}
