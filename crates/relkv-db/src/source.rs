//! The row source abstraction.

use async_trait::async_trait;
use relkv_core::{SourceRow, TableSchema};

use crate::error::DbResult;

/// A relational store that can enumerate the rows of a table.
///
/// Rows are returned ordered by identity, each as an ordered map from column
/// name to raw value. Values are not coerced here; the mapper coerces them
/// against the schema so that unknown columns and type mismatches surface as
/// schema errors with the offending key.
#[async_trait]
pub trait RowSource: Send + Sync {
	/// Short name used in logs and reports.
	fn name(&self) -> &str;

	/// Reads every row of `table`.
	async fn fetch_rows(&self, table: &TableSchema) -> DbResult<Vec<SourceRow>>;
}
