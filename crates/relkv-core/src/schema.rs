//! Table definitions.
//!
//! A [`Schema`] is an ordered list of [`TableSchema`]s. The order is the
//! migration order, so a table referenced by a foreign key must be declared
//! before the table holding the reference ([`Schema::validate`] enforces it).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, Result};
use crate::keys;
use crate::row::{Row, SourceRow};
use crate::value::{SourceValue, Value};

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
	Integer,
	Text,
	/// Fixed-point number with `scale` fractional digits.
	Decimal {
		scale: u32,
	},
	/// Calendar date, encoded as ISO-8601 `YYYY-MM-DD`.
	Date,
}

impl ColumnType {
	/// SQLite column declaration for this type.
	pub fn sql_type(&self) -> String {
		match self {
			ColumnType::Integer => "INTEGER".to_string(),
			ColumnType::Text => "TEXT".to_string(),
			ColumnType::Decimal { scale } => format!("DECIMAL(10,{})", scale),
			ColumnType::Date => "DATE".to_string(),
		}
	}
}

/// Reference from a column to the identity of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
	/// Referenced table name.
	pub table: String,
	/// Referenced column (the parent's primary key).
	pub column: String,
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
	pub name: String,
	pub column_type: ColumnType,
	pub nullable: bool,
	pub unique: bool,
	pub non_negative: bool,
	/// Default applied by the source store when an insert omits the column.
	pub default: Option<SourceValue>,
	pub references: Option<ForeignKey>,
}

impl ColumnDef {
	/// Creates a nullable column with no constraints.
	pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
		Self {
			name: name.into(),
			column_type,
			nullable: true,
			unique: false,
			non_negative: false,
			default: None,
			references: None,
		}
	}

	/// Marks the column NOT NULL.
	pub fn not_null(mut self) -> Self {
		self.nullable = false;
		self
	}

	/// Marks the column UNIQUE.
	pub fn unique(mut self) -> Self {
		self.unique = true;
		self
	}

	/// Rejects negative integers.
	pub fn non_negative(mut self) -> Self {
		self.non_negative = true;
		self
	}

	/// Sets the column default.
	pub fn default_value(mut self, value: impl Into<SourceValue>) -> Self {
		self.default = Some(value.into());
		self
	}

	/// Adds a foreign key to `table.column`.
	pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
		self.references = Some(ForeignKey {
			table: table.into(),
			column: column.into(),
		});
		self
	}
}

/// One source table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
	/// Name used in keys (`Customer`, `Product`, `Order`).
	pub name: String,
	/// Relation name in the source store. Differs from `name` when the key
	/// name is a reserved SQL word (`Order` is stored as `Order_`).
	pub relation: String,
	/// Identity column.
	pub primary_key: String,
	/// All columns in declaration order, primary key included.
	pub columns: Vec<ColumnDef>,
}

impl TableSchema {
	/// Creates a table whose relation name equals its key name.
	pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
		let name = name.into();
		let primary_key = primary_key.into();
		Self {
			relation: name.clone(),
			columns: vec![ColumnDef::new(primary_key.clone(), ColumnType::Integer).not_null()],
			name,
			primary_key,
		}
	}

	/// Overrides the source relation name.
	pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
		self.relation = relation.into();
		self
	}

	/// Appends a column.
	pub fn column(mut self, column: ColumnDef) -> Self {
		self.columns.push(column);
		self
	}

	/// Looks up a column by name.
	pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
		self.columns.iter().find(|c| c.name == name)
	}

	/// Non-identity columns, in declaration order. These are the attributes
	/// projected into `Table:id:attribute` keys.
	pub fn attributes(&self) -> impl Iterator<Item = &ColumnDef> {
		self.columns.iter().filter(|c| c.name != self.primary_key)
	}

	/// Returns true if `name` is a non-identity column.
	pub fn has_attribute(&self, name: &str) -> bool {
		name != self.primary_key && self.get_column(name).is_some()
	}

	/// Columns carrying a foreign key.
	pub fn foreign_keys(&self) -> impl Iterator<Item = (&ColumnDef, &ForeignKey)> {
		self.columns
			.iter()
			.filter_map(|c| c.references.as_ref().map(|fk| (c, fk)))
	}

	/// Coerces a raw source row into a typed [`Row`].
	///
	/// Columns the source omitted take their default (or NULL). Fails with
	/// [`MigrationError::SchemaMismatch`] when the row has no usable identity,
	/// carries a column the schema does not know, violates NOT NULL or a
	/// non-negative constraint, or holds a value that cannot be read as the
	/// column type.
	pub fn coerce_row(&self, mut raw: SourceRow) -> Result<Row> {
		let id = match raw.get(&self.primary_key) {
			Some(SourceValue::Int(id)) => *id,
			Some(SourceValue::Float(f)) if f.fract() == 0.0 => *f as i64,
			Some(SourceValue::Text(s)) => s.trim().parse::<i64>().map_err(|_| {
				MigrationError::schema_mismatch(
					format!("{}:{}", self.name, s),
					format!("identity {} is not an integer", self.primary_key),
				)
			})?,
			other => {
				return Err(MigrationError::schema_mismatch(
					self.name.clone(),
					format!(
						"row has no usable identity {} (got {:?})",
						self.primary_key, other
					),
				));
			}
		};

		if let Some(unknown) = raw.keys().find(|name| self.get_column(name).is_none()) {
			return Err(MigrationError::schema_mismatch(
				keys::attribute_key(&self.name, id, unknown),
				format!("column {} is not part of table {}", unknown, self.name),
			));
		}

		let mut values = IndexMap::new();
		for column in self.attributes() {
			let key = || keys::attribute_key(&self.name, id, &column.name);
			let source_value = raw
				.shift_remove(&column.name)
				.or_else(|| column.default.clone())
				.unwrap_or(SourceValue::Null);

			let value = Value::coerce(source_value, &column.column_type)
				.map_err(|message| MigrationError::schema_mismatch(key(), message))?;

			if value.is_null() && !column.nullable {
				return Err(MigrationError::schema_mismatch(
					key(),
					"NULL in NOT NULL column",
				));
			}
			if column.non_negative
				&& let Value::Integer(i) = value
				&& i < 0
			{
				return Err(MigrationError::schema_mismatch(
					key(),
					format!("negative value {} in non-negative column", i),
				));
			}

			values.insert(column.name.clone(), value);
		}

		Ok(Row::new(self.name.clone(), id, values))
	}

	/// `CREATE TABLE` statement for SQLite.
	pub fn create_table_sql(&self) -> String {
		let mut parts: Vec<String> = self
			.columns
			.iter()
			.map(|column| {
				let mut def = format!("\"{}\" {}", column.name, column.column_type.sql_type());
				if column.name == self.primary_key {
					def.push_str(" PRIMARY KEY");
				}
				if !column.nullable && column.name != self.primary_key {
					def.push_str(" NOT NULL");
				}
				if column.unique {
					def.push_str(" UNIQUE");
				}
				if let Some(default) = &column.default {
					match default {
						SourceValue::Int(i) => def.push_str(&format!(" DEFAULT {}", i)),
						SourceValue::Float(f) => def.push_str(&format!(" DEFAULT {}", f)),
						SourceValue::Text(s) => {
							def.push_str(&format!(" DEFAULT '{}'", s.replace('\'', "''")))
						}
						SourceValue::Null => {}
					}
				}
				if column.non_negative {
					def.push_str(&format!(" CHECK (\"{}\" >= 0)", column.name));
				}
				def
			})
			.collect();

		for (column, fk) in self.foreign_keys() {
			parts.push(format!(
				"FOREIGN KEY (\"{}\") REFERENCES \"{}\"(\"{}\")",
				column.name, fk.table, fk.column
			));
		}

		format!(
			"CREATE TABLE IF NOT EXISTS \"{}\" (\n\t{}\n)",
			self.relation,
			parts.join(",\n\t")
		)
	}
}

/// Ordered set of tables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
	tables: Vec<TableSchema>,
}

impl Schema {
	/// Creates an empty schema.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a table; tables migrate in the order they are added.
	pub fn table(mut self, table: TableSchema) -> Self {
		self.tables.push(table);
		self
	}

	/// Tables in migration order.
	pub fn tables(&self) -> &[TableSchema] {
		&self.tables
	}

	/// Looks up a table by key name.
	pub fn get(&self, name: &str) -> Option<&TableSchema> {
		self.tables.iter().find(|t| t.name == name)
	}

	/// Looks up a table by key name, failing with a schema mismatch.
	pub fn require(&self, name: &str) -> Result<&TableSchema> {
		self.get(name)
			.ok_or_else(|| MigrationError::schema_mismatch(name, "unknown table"))
	}

	/// Checks that every foreign key points at an earlier table's identity.
	pub fn validate(&self) -> Result<()> {
		for (position, table) in self.tables.iter().enumerate() {
			for (column, fk) in table.foreign_keys() {
				let parent = self.tables[..position]
					.iter()
					.find(|t| t.name == fk.table)
					.ok_or_else(|| {
						MigrationError::Configuration(format!(
							"{}.{} references {} which is not declared before {}",
							table.name, column.name, fk.table, table.name
						))
					})?;
				if parent.primary_key != fk.column {
					return Err(MigrationError::Configuration(format!(
						"{}.{} must reference the identity of {} ({}), not {}",
						table.name, column.name, parent.name, parent.primary_key, fk.column
					)));
				}
			}
		}
		Ok(())
	}

	/// The bundled e-commerce schema: `Customer`, `Product`, `Order`.
	pub fn ecommerce() -> Self {
		let customer = TableSchema::new("Customer", "customer_id")
			.column(ColumnDef::new("first_name", ColumnType::Text).not_null())
			.column(ColumnDef::new("last_name", ColumnType::Text).not_null())
			.column(ColumnDef::new("email", ColumnType::Text).not_null().unique())
			.column(ColumnDef::new("phone", ColumnType::Text))
			.column(ColumnDef::new("city", ColumnType::Text))
			.column(ColumnDef::new("country", ColumnType::Text))
			.column(ColumnDef::new("created_at", ColumnType::Date));

		let product = TableSchema::new("Product", "product_id")
			.column(ColumnDef::new("product_name", ColumnType::Text).not_null())
			.column(ColumnDef::new("category", ColumnType::Text))
			.column(ColumnDef::new("price", ColumnType::Decimal { scale: 2 }).not_null())
			.column(
				ColumnDef::new("stock_quantity", ColumnType::Integer)
					.non_negative()
					.default_value(0i64),
			)
			.column(ColumnDef::new("description", ColumnType::Text));

		let order = TableSchema::new("Order", "order_id")
			.with_relation("Order_")
			.column(
				ColumnDef::new("customer_id", ColumnType::Integer)
					.not_null()
					.references("Customer", "customer_id"),
			)
			.column(ColumnDef::new("order_date", ColumnType::Date).not_null())
			.column(ColumnDef::new("status", ColumnType::Text).default_value("pending"))
			.column(ColumnDef::new("total_amount", ColumnType::Decimal { scale: 2 }))
			.column(ColumnDef::new("shipping_address", ColumnType::Text));

		Schema::new().table(customer).table(product).table(order)
	}
}
