//! JSON fixtures.
//!
//! A fixture file holds either a single record or an array of records:
//!
//! ```json
//! [
//!   {"model": "Customer", "pk": 6, "fields": {"first_name": "Noura", "last_name": "Saleh", "email": "noura@example.com"}},
//!   {"model": "Order", "pk": 1008, "fields": {"customer_id": 6, "order_date": "2024-07-04"}}
//! ]
//! ```
//!
//! `model` is the table name as used in keys. Field values stay raw; they are
//! coerced against the schema during migration like any other source row.

use std::path::Path;

use indexmap::IndexMap;
use relkv_core::{Schema, SourceRow, SourceValue, TableSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DbError, DbResult};

/// One fixture record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureRecord {
	/// Table name (`Customer`, `Product`, `Order`).
	pub model: String,

	/// Identity. May be omitted when `fields` carries the primary key column.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pk: Option<Value>,

	/// Column values as a JSON object.
	pub fields: Value,
}

impl FixtureRecord {
	/// Converts the record into a raw source row for `table`.
	///
	/// The identity column comes first, followed by the fields in file order.
	pub fn to_source_row(&self, table: &TableSchema) -> DbResult<SourceRow> {
		let fields = self.fields.as_object().ok_or_else(|| DbError::ValidationError {
			field: "fields".to_string(),
			message: "Fields must be a JSON object".to_string(),
		})?;

		let mut row = SourceRow::new();
		match (&self.pk, fields.get(&table.primary_key)) {
			(Some(pk), _) => {
				row.insert(table.primary_key.clone(), json_to_source(pk, "pk")?);
			}
			(None, Some(_)) => {}
			(None, None) => {
				return Err(DbError::ValidationError {
					field: "pk".to_string(),
					message: format!(
						"{} record has neither pk nor {}",
						self.model, table.primary_key
					),
				});
			}
		}

		for (name, value) in fields {
			if self.pk.is_some() && name == &table.primary_key {
				continue;
			}
			row.insert(name.clone(), json_to_source(value, name)?);
		}
		Ok(row)
	}
}

fn json_to_source(value: &Value, field: &str) -> DbResult<SourceValue> {
	match value {
		Value::Null => Ok(SourceValue::Null),
		Value::Bool(b) => Ok(SourceValue::Int(i64::from(*b))),
		Value::Number(n) => n
			.as_i64()
			.map(SourceValue::Int)
			.or_else(|| n.as_f64().map(SourceValue::Float))
			.ok_or_else(|| DbError::ValidationError {
				field: field.to_string(),
				message: format!("number {} is out of range", n),
			}),
		Value::String(s) => Ok(SourceValue::Text(s.clone())),
		Value::Array(_) | Value::Object(_) => Err(DbError::ValidationError {
			field: field.to_string(),
			message: "nested values are not supported".to_string(),
		}),
	}
}

/// Parsed fixture records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureData {
	pub records: Vec<FixtureRecord>,
	/// File the records were read from, if any.
	pub source: Option<String>,
}

impl FixtureData {
	/// Groups the records into per-table rows, in schema order.
	///
	/// Fails if a record names a table the schema does not define.
	pub fn into_tables(self, schema: &Schema) -> DbResult<IndexMap<String, Vec<SourceRow>>> {
		let mut tables: IndexMap<String, Vec<SourceRow>> = schema
			.tables()
			.iter()
			.map(|t| (t.name.clone(), Vec::new()))
			.collect();

		for record in &self.records {
			let table = schema
				.get(&record.model)
				.ok_or_else(|| DbError::ValidationError {
					field: "model".to_string(),
					message: format!("unknown table '{}'", record.model),
				})?;
			let row = record.to_source_row(table)?;
			if let Some(rows) = tables.get_mut(&table.name) {
				rows.push(row);
			}
		}
		Ok(tables)
	}

	/// Appends the records of `other`.
	pub fn extend(&mut self, other: FixtureData) {
		self.records.extend(other.records);
	}
}

/// Parser for JSON fixture files.
#[derive(Debug, Default)]
pub struct FixtureParser;

impl FixtureParser {
	/// Creates a new fixture parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a fixture file.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - The file does not have a `.json` extension
	/// - The file cannot be read
	/// - The file content is invalid
	pub fn parse_file(&self, path: &Path) -> DbResult<FixtureData> {
		let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
		if !extension.eq_ignore_ascii_case("json") {
			return Err(DbError::UnsupportedExtension(if extension.is_empty() {
				"(none)".to_string()
			} else {
				extension.to_string()
			}));
		}

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				DbError::FileNotFound(path.display().to_string())
			} else {
				DbError::IoError(e)
			}
		})?;

		let mut data = self.parse_str(&content)?;
		data.source = Some(path.display().to_string());
		Ok(data)
	}

	/// Parses several files into one record list, in the given order.
	pub fn parse_files<P: AsRef<Path>>(&self, paths: &[P]) -> DbResult<FixtureData> {
		let mut all = FixtureData::default();
		for path in paths {
			all.extend(self.parse_file(path.as_ref())?);
		}
		Ok(all)
	}

	/// Parses fixture JSON from a string.
	pub fn parse_str(&self, content: &str) -> DbResult<FixtureData> {
		let value: Value = serde_json::from_str(content)?;

		let records = match value {
			Value::Array(items) => {
				let mut records = Vec::with_capacity(items.len());
				for (idx, item) in items.into_iter().enumerate() {
					let record: FixtureRecord = serde_json::from_value(item).map_err(|e| {
						DbError::ParseError(format!("Invalid record at index {}: {}", idx, e))
					})?;
					self.validate_record(&record)?;
					records.push(record);
				}
				records
			}
			Value::Object(_) => {
				let record: FixtureRecord = serde_json::from_value(value)?;
				self.validate_record(&record)?;
				vec![record]
			}
			_ => return Err(DbError::ParseError("Expected array or object".to_string())),
		};

		Ok(FixtureData {
			records,
			source: None,
		})
	}

	fn validate_record(&self, record: &FixtureRecord) -> DbResult<()> {
		if record.model.is_empty() || record.model.contains(':') {
			return Err(DbError::ValidationError {
				field: "model".to_string(),
				message: format!("'{}' is not a table name", record.model),
			});
		}
		if !record.fields.is_object() {
			return Err(DbError::ValidationError {
				field: "fields".to_string(),
				message: "Fields must be a JSON object".to_string(),
			});
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::*;
	use std::io::Write;

	const FIXTURE: &str = r#"[
		{"model": "Customer", "pk": 6, "fields": {"first_name": "Noura", "last_name": "Saleh", "email": "noura@example.com", "phone": null}},
		{"model": "Order", "fields": {"order_id": 1008, "customer_id": 6, "order_date": "2024-07-04", "total_amount": 99.5}}
	]"#;

	#[fixture]
	fn schema() -> Schema {
		Schema::ecommerce()
	}

	#[rstest]
	fn test_parse_array(schema: Schema) {
		let data = FixtureParser::new().parse_str(FIXTURE).unwrap();
		assert_eq!(data.records.len(), 2);

		let tables = data.into_tables(&schema).unwrap();
		let customers = &tables["Customer"];
		assert_eq!(customers.len(), 1);
		assert_eq!(customers[0].get_index(0).unwrap().0, "customer_id");
		assert_eq!(customers[0]["customer_id"], SourceValue::Int(6));
		assert_eq!(customers[0]["phone"], SourceValue::Null);

		let orders = &tables["Order"];
		assert_eq!(orders[0]["order_id"], SourceValue::Int(1008));
		assert_eq!(orders[0]["total_amount"], SourceValue::Float(99.5));
		assert!(tables["Product"].is_empty());
	}

	#[rstest]
	fn test_parse_single_object() {
		let data = FixtureParser::new()
			.parse_str(r#"{"model": "Product", "pk": 200, "fields": {"product_name": "Cable"}}"#)
			.unwrap();
		assert_eq!(data.records.len(), 1);
	}

	#[rstest]
	fn test_unknown_model(schema: Schema) {
		let data = FixtureParser::new()
			.parse_str(r#"[{"model": "Invoice", "pk": 1, "fields": {}}]"#)
			.unwrap();
		let result = data.into_tables(&schema);
		assert!(matches!(result, Err(DbError::ValidationError { field, .. }) if field == "model"));
	}

	#[rstest]
	fn test_missing_identity(schema: Schema) {
		let data = FixtureParser::new()
			.parse_str(r#"[{"model": "Product", "fields": {"product_name": "Cable"}}]"#)
			.unwrap();
		assert!(data.into_tables(&schema).is_err());
	}

	#[rstest]
	fn test_invalid_records() {
		let parser = FixtureParser::new();
		assert!(matches!(
			parser.parse_str(r#"[{"model": "Product", "pk": 1, "fields": []}]"#),
			Err(DbError::ValidationError { .. })
		));
		assert!(matches!(
			parser.parse_str(r#"[{"pk": 1, "fields": {}}]"#),
			Err(DbError::ParseError(_))
		));
		assert!(matches!(parser.parse_str("42"), Err(DbError::ParseError(_))));
	}

	#[rstest]
	fn test_parse_file() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		file.write_all(FIXTURE.as_bytes()).unwrap();

		let data = FixtureParser::new().parse_file(file.path()).unwrap();
		assert_eq!(data.records.len(), 2);
		assert_eq!(data.source, Some(file.path().display().to_string()));
	}

	#[rstest]
	fn test_parse_file_errors() {
		let parser = FixtureParser::new();
		assert!(matches!(
			parser.parse_file(Path::new("/nonexistent/fixture.json")),
			Err(DbError::FileNotFound(_))
		));
		assert!(matches!(
			parser.parse_file(Path::new("fixture.yaml")),
			Err(DbError::UnsupportedExtension(ext)) if ext == "yaml"
		));
	}
}
