//! Mapping policies shared by the mapper and its configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder written for NULL under [`NullPolicy::Tombstone`] unless
/// configured otherwise.
pub const DEFAULT_TOMBSTONE: &str = "<null>";

/// What to write for a NULL column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
	/// Write nothing. The attribute key is absent and the row hash has no
	/// field for it.
	#[default]
	Skip,
	/// Write an empty string.
	Empty,
	/// Write the configured tombstone text.
	Tombstone,
}

impl NullPolicy {
	/// Text written for a NULL, or `None` when nothing is written.
	pub fn placeholder<'a>(&self, tombstone: &'a str) -> Option<&'a str> {
		match self {
			NullPolicy::Skip => None,
			NullPolicy::Empty => Some(""),
			NullPolicy::Tombstone => Some(tombstone),
		}
	}
}

impl fmt::Display for NullPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			NullPolicy::Skip => "skip",
			NullPolicy::Empty => "empty",
			NullPolicy::Tombstone => "tombstone",
		})
	}
}

impl FromStr for NullPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"skip" => Ok(NullPolicy::Skip),
			"empty" => Ok(NullPolicy::Empty),
			"tombstone" => Ok(NullPolicy::Tombstone),
			other => Err(format!(
				"unknown null policy '{}' (expected skip, empty or tombstone)",
				other
			)),
		}
	}
}

/// A secondary index to maintain: one set per distinct value of
/// `table.attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexSpec {
	pub table: String,
	pub attribute: String,
}

impl IndexSpec {
	pub fn new(table: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self {
			table: table.into(),
			attribute: attribute.into(),
		}
	}

	/// Indexes maintained for the bundled e-commerce schema.
	pub fn defaults() -> Vec<IndexSpec> {
		vec![
			IndexSpec::new("Product", "category"),
			IndexSpec::new("Order", "status"),
			IndexSpec::new("Order", "customer_id"),
		]
	}
}

impl fmt::Display for IndexSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.table, self.attribute)
	}
}

impl FromStr for IndexSpec {
	type Err = String;

	/// Parses `Table.attribute`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.split_once('.') {
			Some((table, attribute))
				if !table.is_empty() && !attribute.is_empty() && !attribute.contains('.') =>
			{
				Ok(IndexSpec::new(table.trim(), attribute.trim()))
			}
			_ => Err(format!("invalid index '{}' (expected Table.attribute)", s)),
		}
	}
}

impl Serialize for IndexSpec {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for IndexSpec {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}
