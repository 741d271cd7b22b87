//! SQLite row source backed by a sqlx pool.

use std::str::FromStr;

use async_trait::async_trait;
use relkv_core::{Schema, SourceRow, SourceValue, TableSchema};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as SqlxRow, SqlitePool, TypeInfo, ValueRef};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::source::RowSource;

/// SQLite source.
pub struct SqliteSource {
	pool: SqlitePool,
}

impl SqliteSource {
	/// Wraps an existing pool.
	pub fn from_pool(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Opens `url`, creating the database file if it does not exist.
	///
	/// In-memory databases are private to each connection, so the pool is
	/// limited to a single connection for `sqlite::memory:` URLs.
	pub async fn connect(url: &str) -> DbResult<Self> {
		let options = SqliteConnectOptions::from_str(url)?
			.create_if_missing(true)
			.foreign_keys(true);
		let in_memory = url.contains(":memory:") || url.contains("mode=memory");
		let max_connections = if in_memory { 1 } else { 5 };
		let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
		if in_memory {
			// Closing the only connection would discard the database.
			pool_options = pool_options.idle_timeout(None).max_lifetime(None);
		}
		let pool = pool_options.connect_with(options).await?;
		debug!(url, max_connections, "Opened SQLite pool");
		Ok(Self { pool })
	}

	pub fn pool(&self) -> &SqlitePool {
		&self.pool
	}

	/// Creates every table of `schema` (dropping existing ones, children
	/// first) and inserts the given rows.
	pub async fn bootstrap<'a, I>(&self, schema: &Schema, data: I) -> DbResult<()>
	where
		I: IntoIterator<Item = (&'a str, &'a [SourceRow])>,
	{
		let mut tx = self.pool.begin().await?;

		for table in schema.tables().iter().rev() {
			let sql = format!("DROP TABLE IF EXISTS \"{}\"", table.relation);
			sqlx::query(&sql).execute(&mut *tx).await?;
		}
		for table in schema.tables() {
			sqlx::query(&table.create_table_sql()).execute(&mut *tx).await?;
		}

		for (name, rows) in data {
			let table = schema
				.get(name)
				.ok_or_else(|| DbError::TableNotFound(name.to_string()))?;
			for row in rows {
				let sql = insert_sql(table, row);
				let mut query = sqlx::query(&sql);
				for value in row.values() {
					query = match value {
						SourceValue::Null => query.bind(None::<i64>),
						SourceValue::Int(i) => query.bind(*i),
						SourceValue::Float(f) => query.bind(*f),
						SourceValue::Text(s) => query.bind(s.as_str()),
					};
				}
				query.execute(&mut *tx).await?;
			}
			info!(table = %table.name, rows = rows.len(), "Seeded table");
		}

		tx.commit().await?;
		Ok(())
	}

	/// Creates the bundled e-commerce schema and seed rows.
	pub async fn bootstrap_ecommerce(&self) -> DbResult<()> {
		let seed = crate::seed::ecommerce();
		self.bootstrap(
			&Schema::ecommerce(),
			seed.iter().map(|(name, rows)| (name.as_str(), rows.as_slice())),
		)
		.await
	}

	fn convert_row(table: &TableSchema, sqlite_row: &SqliteRow) -> DbResult<SourceRow> {
		let mut row = SourceRow::new();
		for column in sqlite_row.columns() {
			let index = column.ordinal();
			let raw = sqlite_row.try_get_raw(index)?;

			// The storage class of the value, not the declared column type:
			// a DECIMAL column holds INTEGER for whole amounts.
			let value = if raw.is_null() {
				SourceValue::Null
			} else {
				let storage = raw.type_info().name().to_uppercase();
				match storage.as_str() {
					"INTEGER" | "BOOLEAN" => {
						SourceValue::Int(sqlite_row.try_get_unchecked::<i64, _>(index)?)
					}
					"REAL" => SourceValue::Float(sqlite_row.try_get_unchecked::<f64, _>(index)?),
					"TEXT" | "DATE" | "DATETIME" | "TIME" => {
						SourceValue::Text(sqlite_row.try_get_unchecked::<String, _>(index)?)
					}
					other => {
						return Err(DbError::UnsupportedValue {
							table: table.name.clone(),
							column: column.name().to_string(),
							type_name: other.to_string(),
						});
					}
				}
			};
			row.insert(column.name().to_string(), value);
		}
		Ok(row)
	}
}

fn insert_sql(table: &TableSchema, row: &SourceRow) -> String {
	let columns: Vec<String> = row.keys().map(|c| format!("\"{}\"", c)).collect();
	let placeholders = vec!["?"; columns.len()].join(", ");
	format!(
		"INSERT INTO \"{}\" ({}) VALUES ({})",
		table.relation,
		columns.join(", "),
		placeholders
	)
}

#[async_trait]
impl RowSource for SqliteSource {
	fn name(&self) -> &str {
		"sqlite"
	}

	async fn fetch_rows(&self, table: &TableSchema) -> DbResult<Vec<SourceRow>> {
		let sql = format!(
			"SELECT * FROM \"{}\" ORDER BY \"{}\"",
			table.relation, table.primary_key
		);
		let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
		debug!(table = %table.name, rows = rows.len(), "Fetched rows");
		rows.iter()
			.map(|row| Self::convert_row(table, row))
			.collect()
	}
}
