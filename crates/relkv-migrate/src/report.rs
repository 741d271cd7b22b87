//! Migration reports.

use relkv_core::NullPolicy;
use serde::Serialize;

/// Counters for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableReport {
	pub table: String,
	pub rows_read: usize,
	/// `{T}:{id}:{a}` keys written.
	pub attribute_keys: usize,
	/// NULL attributes read from the source, counted under every null
	/// policy whether they were deleted, written empty or tombstoned.
	pub null_attributes: usize,
	/// `{T}:{id}` hashes written.
	pub row_hashes: usize,
	/// `idx:` sets written.
	pub index_keys: usize,
	/// Identities added across all index sets.
	pub index_memberships: usize,
	/// Index sets deleted because no row holds their value any more.
	pub stale_index_keys: usize,
}

impl TableReport {
	pub fn new(table: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			..Default::default()
		}
	}

	/// Keys this table contributes to the store.
	pub fn keys_written(&self) -> usize {
		self.attribute_keys + self.row_hashes + self.index_keys
	}
}

/// Outcome of a migration pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
	/// Row source name.
	pub source: String,
	/// Key-value backend name.
	pub sink: String,
	pub null_policy: NullPolicy,
	pub dry_run: bool,
	/// Per-table counters in migration order.
	pub tables: Vec<TableReport>,
	pub elapsed_ms: u64,
}

impl MigrationReport {
	pub fn new(source: impl Into<String>, sink: impl Into<String>, null_policy: NullPolicy) -> Self {
		Self {
			source: source.into(),
			sink: sink.into(),
			null_policy,
			dry_run: false,
			tables: Vec::new(),
			elapsed_ms: 0,
		}
	}

	/// Counters for `table`.
	pub fn table(&self, table: &str) -> Option<&TableReport> {
		self.tables.iter().find(|t| t.table == table)
	}

	pub fn rows_read(&self) -> usize {
		self.tables.iter().map(|t| t.rows_read).sum()
	}

	pub fn attribute_keys(&self) -> usize {
		self.tables.iter().map(|t| t.attribute_keys).sum()
	}

	pub fn keys_written(&self) -> usize {
		self.tables.iter().map(TableReport::keys_written).sum()
	}
}
