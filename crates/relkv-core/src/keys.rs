//! Key naming convention.
//!
//! The layout is authoritative and case-sensitive:
//!
//! | Kind | Layout | Redis type |
//! |---|---|---|
//! | attribute | `{Table}:{id}:{attribute}` | string |
//! | row | `{Table}:{id}` | hash |
//! | index | `idx:{Table}:{attribute}:{value}` | set of ids |
//!
//! Table and attribute names are identifiers and never contain `:`. Index
//! values may, so [`ParsedKey::parse`] keeps everything after the third
//! separator as the value.

use crate::row::RowId;

/// Prefix of every index key.
pub const INDEX_PREFIX: &str = "idx";

/// `{table}:{id}:{attribute}`
pub fn attribute_key(table: &str, id: RowId, attribute: &str) -> String {
	format!("{}:{}:{}", table, id, attribute)
}

/// `{table}:{id}`
pub fn row_key(table: &str, id: RowId) -> String {
	format!("{}:{}", table, id)
}

/// `idx:{table}:{attribute}:{value}`
pub fn index_key(table: &str, attribute: &str, value: &str) -> String {
	format!("{}:{}:{}:{}", INDEX_PREFIX, table, attribute, value)
}

/// Glob matching one attribute across every row of a table.
pub fn attribute_pattern(table: &str, attribute: &str) -> String {
	format!("{}:*:{}", escape_glob(table), escape_glob(attribute))
}

/// Glob matching every attribute key of one row.
pub fn row_attributes_pattern(table: &str, id: RowId) -> String {
	format!("{}:{}:*", escape_glob(table), id)
}

/// Glob matching every index key of one table attribute.
pub fn index_pattern(table: &str, attribute: &str) -> String {
	format!(
		"{}:{}:{}:*",
		INDEX_PREFIX,
		escape_glob(table),
		escape_glob(attribute)
	)
}

/// Escapes Redis glob metacharacters (`*`, `?`, `[`, `]`, `\`).
pub fn escape_glob(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		if matches!(c, '*' | '?' | '[' | ']' | '\\') {
			escaped.push('\\');
		}
		escaped.push(c);
	}
	escaped
}

/// A key decomposed according to the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedKey {
	Attribute {
		table: String,
		id: RowId,
		attribute: String,
	},
	Row {
		table: String,
		id: RowId,
	},
	Index {
		table: String,
		attribute: String,
		value: String,
	},
}

impl ParsedKey {
	/// Parses a key. Returns `None` for keys outside the convention.
	///
	/// # Examples
	///
	/// ```
	/// use relkv_core::ParsedKey;
	///
	/// assert_eq!(
	///     ParsedKey::parse("Order:1001:status"),
	///     Some(ParsedKey::Attribute {
	///         table: "Order".to_string(),
	///         id: 1001,
	///         attribute: "status".to_string(),
	///     })
	/// );
	/// assert_eq!(ParsedKey::parse("session:abc"), None);
	/// ```
	pub fn parse(key: &str) -> Option<Self> {
		if let Some(rest) = key
			.strip_prefix(INDEX_PREFIX)
			.and_then(|r| r.strip_prefix(':'))
		{
			let mut parts = rest.splitn(3, ':');
			let table = parts.next().filter(|s| !s.is_empty())?;
			let attribute = parts.next().filter(|s| !s.is_empty())?;
			let value = parts.next()?;
			return Some(ParsedKey::Index {
				table: table.to_string(),
				attribute: attribute.to_string(),
				value: value.to_string(),
			});
		}

		let mut parts = key.split(':');
		let table = parts.next().filter(|s| !s.is_empty())?;
		let id = parts.next()?.parse::<RowId>().ok()?;
		match (parts.next(), parts.next()) {
			(None, _) => Some(ParsedKey::Row {
				table: table.to_string(),
				id,
			}),
			(Some(attribute), None) if !attribute.is_empty() => Some(ParsedKey::Attribute {
				table: table.to_string(),
				id,
				attribute: attribute.to_string(),
			}),
			_ => None,
		}
	}

	/// Table the key belongs to.
	pub fn table(&self) -> &str {
		match self {
			ParsedKey::Attribute { table, .. }
			| ParsedKey::Row { table, .. }
			| ParsedKey::Index { table, .. } => table,
		}
	}

	/// Row identity, for attribute and row keys.
	pub fn id(&self) -> Option<RowId> {
		match self {
			ParsedKey::Attribute { id, .. } | ParsedKey::Row { id, .. } => Some(*id),
			ParsedKey::Index { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_builders() {
		assert_eq!(attribute_key("Customer", 1, "first_name"), "Customer:1:first_name");
		assert_eq!(row_key("Product", 101), "Product:101");
		assert_eq!(
			index_key("Product", "category", "Electronics"),
			"idx:Product:category:Electronics"
		);
		assert_eq!(attribute_pattern("Customer", "email"), "Customer:*:email");
		assert_eq!(row_attributes_pattern("Order", 1001), "Order:1001:*");
		assert_eq!(index_pattern("Order", "status"), "idx:Order:status:*");
	}

	#[rstest]
	fn test_escape_glob() {
		assert_eq!(escape_glob("a*b?c[d]"), "a\\*b\\?c\\[d\\]");
		assert_eq!(escape_glob("plain"), "plain");
	}

	#[rstest]
	#[case("Customer:1", Some(ParsedKey::Row { table: "Customer".into(), id: 1 }))]
	#[case(
		"idx:Order:order_date:2024-06-01 10:00",
		Some(ParsedKey::Index {
			table: "Order".into(),
			attribute: "order_date".into(),
			value: "2024-06-01 10:00".into(),
		})
	)]
	#[case("idx:Order:status:", Some(ParsedKey::Index {
		table: "Order".into(),
		attribute: "status".into(),
		value: "".into(),
	}))]
	#[case("Customer:abc:email", None)]
	#[case("Customer:1:email:extra", None)]
	#[case("Customer:1:", None)]
	#[case(":1:email", None)]
	#[case("idx:Order", None)]
	fn test_parse(#[case] key: &str, #[case] expected: Option<ParsedKey>) {
		assert_eq!(ParsedKey::parse(key), expected);
	}

	#[rstest]
	fn test_parse_round_trips_builders() {
		let parsed = ParsedKey::parse(&attribute_key("Order", 1003, "status")).unwrap();
		assert_eq!(parsed.table(), "Order");
		assert_eq!(parsed.id(), Some(1003));

		let parsed = ParsedKey::parse(&index_key("Order", "status", "shipped")).unwrap();
		assert_eq!(parsed.id(), None);
	}
}
