//! Rows.

use indexmap::IndexMap;

use crate::value::{SourceValue, Value};

/// Row identity (the integer primary key).
pub type RowId = i64;

/// A row as handed over by a source: column name to raw value, in the
/// source's column order.
pub type SourceRow = IndexMap<String, SourceValue>;

/// A row coerced against its table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
	/// Key name of the table the row belongs to.
	pub table: String,
	/// Identity.
	pub id: RowId,
	/// Attribute values in schema order; the identity column is not included.
	pub values: IndexMap<String, Value>,
}

impl Row {
	pub fn new(table: impl Into<String>, id: RowId, values: IndexMap<String, Value>) -> Self {
		Self {
			table: table.into(),
			id,
			values,
		}
	}

	pub fn get(&self, attribute: &str) -> Option<&Value> {
		self.values.get(attribute)
	}

	/// Attributes holding a non-null value.
	pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.values
			.iter()
			.filter(|(_, v)| !v.is_null())
			.map(|(k, v)| (k.as_str(), v))
	}
}
