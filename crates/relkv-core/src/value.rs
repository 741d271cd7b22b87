//! Column values.
//!
//! Sources hand over loosely typed [`SourceValue`]s (whatever the storage
//! engine returned); the schema coerces them into typed [`Value`]s, and the
//! typed value decides the textual encoding written to the key-value store.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// Value exactly as read from a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceValue {
	Null,
	Int(i64),
	Float(f64),
	Text(String),
}

impl SourceValue {
	/// Returns true for SQL NULL.
	pub fn is_null(&self) -> bool {
		matches!(self, SourceValue::Null)
	}
}

impl From<&str> for SourceValue {
	fn from(s: &str) -> Self {
		SourceValue::Text(s.to_string())
	}
}

impl From<String> for SourceValue {
	fn from(s: String) -> Self {
		SourceValue::Text(s)
	}
}

impl From<i64> for SourceValue {
	fn from(i: i64) -> Self {
		SourceValue::Int(i)
	}
}

impl From<i32> for SourceValue {
	fn from(i: i32) -> Self {
		SourceValue::Int(i as i64)
	}
}

impl From<f64> for SourceValue {
	fn from(f: f64) -> Self {
		SourceValue::Float(f)
	}
}

impl<T: Into<SourceValue>> From<Option<T>> for SourceValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(SourceValue::Null, Into::into)
	}
}

/// Value coerced to its column type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
	Null,
	Integer(i64),
	Text(String),
	Decimal(Decimal),
	Date(NaiveDate),
}

impl Value {
	/// Coerces a raw source value into the given column type.
	///
	/// Decimals are rescaled to the column scale so `4650` and `4650.0` both
	/// become `4650.00` for a scale of 2. Text with more significant
	/// fractional digits than the scale is rejected rather than rounded.
	///
	/// # Examples
	///
	/// ```
	/// use relkv_core::{ColumnType, SourceValue, Value};
	///
	/// let value = Value::coerce(SourceValue::Int(4650), &ColumnType::Decimal { scale: 2 }).unwrap();
	/// assert_eq!(value.encode().as_deref(), Some("4650.00"));
	/// ```
	pub fn coerce(raw: SourceValue, ty: &ColumnType) -> Result<Value, String> {
		if raw.is_null() {
			return Ok(Value::Null);
		}

		match ty {
			ColumnType::Integer => match raw {
				SourceValue::Int(i) => Ok(Value::Integer(i)),
				SourceValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
					Ok(Value::Integer(f as i64))
				}
				SourceValue::Text(s) => s
					.trim()
					.parse::<i64>()
					.map(Value::Integer)
					.map_err(|e| format!("cannot read {:?} as integer: {}", s, e)),
				other => Err(format!("cannot read {:?} as integer", other)),
			},
			ColumnType::Text => match raw {
				SourceValue::Text(s) => Ok(Value::Text(s)),
				SourceValue::Int(i) => Ok(Value::Text(i.to_string())),
				SourceValue::Float(f) => Ok(Value::Text(f.to_string())),
				SourceValue::Null => Ok(Value::Null),
			},
			ColumnType::Decimal { scale } => coerce_decimal(raw, *scale).map(Value::Decimal),
			ColumnType::Date => match raw {
				SourceValue::Text(s) => parse_date(&s).map(Value::Date),
				other => Err(format!("cannot read {:?} as date", other)),
			},
		}
	}

	/// Returns true for NULL.
	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	/// Stable textual encoding written to the key-value store.
	///
	/// Returns `None` for NULL; what happens to nulls is the mapper's
	/// null policy, not the value's.
	pub fn encode(&self) -> Option<String> {
		match self {
			Value::Null => None,
			Value::Integer(i) => Some(i.to_string()),
			Value::Text(s) => Some(s.clone()),
			Value::Decimal(d) => Some(d.to_string()),
			Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
		}
	}

	/// Integer payload, if this is an integer.
	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Value::Integer(i) => Some(*i),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.encode() {
			Some(text) => f.write_str(&text),
			None => f.write_str("NULL"),
		}
	}
}

fn coerce_decimal(raw: SourceValue, scale: u32) -> Result<Decimal, String> {
	let mut value = match raw {
		SourceValue::Int(i) => Decimal::from(i),
		SourceValue::Float(f) => Decimal::from_f64_retain(f)
			.ok_or_else(|| format!("cannot read {} as decimal", f))?
			.round_dp(scale),
		SourceValue::Text(s) => {
			let parsed = s
				.trim()
				.parse::<Decimal>()
				.map_err(|e| format!("cannot read {:?} as decimal: {}", s, e))?;
			if parsed.normalize().scale() > scale {
				return Err(format!(
					"{:?} has more than {} fractional digits",
					s, scale
				));
			}
			parsed
		}
		SourceValue::Null => return Err("unexpected NULL".to_string()),
	};
	value.rescale(scale);
	Ok(value)
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
	let text = text.trim();
	NaiveDate::parse_from_str(text, "%Y-%m-%d")
		.or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
		.or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
		.or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
		.map_err(|e| format!("cannot read {:?} as ISO-8601 date: {}", text, e))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const MONEY: ColumnType = ColumnType::Decimal { scale: 2 };

	#[rstest]
	#[case(SourceValue::Int(4650), "4650.00")]
	#[case(SourceValue::Float(4650.0), "4650.00")]
	#[case(SourceValue::Float(0.1), "0.10")]
	#[case(SourceValue::Text("150.5".to_string()), "150.50")]
	#[case(SourceValue::Text(" 2200.00 ".to_string()), "2200.00")]
	fn test_decimal_keeps_two_places(#[case] raw: SourceValue, #[case] expected: &str) {
		let value = Value::coerce(raw, &MONEY).unwrap();
		assert_eq!(value.encode().unwrap(), expected);
	}

	#[rstest]
	fn test_decimal_rejects_extra_precision() {
		let result = Value::coerce(SourceValue::Text("1.005".to_string()), &MONEY);
		assert!(result.is_err());
	}

	#[rstest]
	fn test_decimal_accepts_trailing_zeros() {
		let value = Value::coerce(SourceValue::Text("12.5000".to_string()), &MONEY).unwrap();
		assert_eq!(value.encode().unwrap(), "12.50");
	}

	#[rstest]
	fn test_integer_from_integral_float() {
		let value = Value::coerce(SourceValue::Float(25.0), &ColumnType::Integer).unwrap();
		assert_eq!(value, Value::Integer(25));
	}

	#[rstest]
	fn test_integer_rejects_fraction() {
		assert!(Value::coerce(SourceValue::Float(2.5), &ColumnType::Integer).is_err());
	}

	#[rstest]
	#[case("2024-06-01")]
	#[case("2024-06-01 10:30:00")]
	#[case("2024-06-01T10:30:00")]
	#[case("2024-06-01T10:30:00.250")]
	#[case("2024-06-01T10:30:00Z")]
	#[case("2024-06-01T23:30:00-05:00")]
	#[case("2024-06-01T01:30:00+03:00")]
	fn test_date_encoding(#[case] raw: &str) {
		let value = Value::coerce(SourceValue::from(raw), &ColumnType::Date).unwrap();
		assert_eq!(value.encode().unwrap(), "2024-06-01");
	}

	#[rstest]
	fn test_date_rejects_garbage() {
		assert!(Value::coerce(SourceValue::from("June 1st"), &ColumnType::Date).is_err());
		assert!(Value::coerce(SourceValue::from("2024-06-01T25:00:00"), &ColumnType::Date).is_err());
		assert!(Value::coerce(SourceValue::Int(20240601), &ColumnType::Date).is_err());
	}

	#[rstest]
	fn test_null_passes_through_every_type() {
		for ty in [ColumnType::Integer, ColumnType::Text, MONEY, ColumnType::Date] {
			let value = Value::coerce(SourceValue::Null, &ty).unwrap();
			assert!(value.is_null());
			assert_eq!(value.encode(), None);
		}
	}

	#[rstest]
	fn test_text_is_verbatim() {
		let value =
			Value::coerce(SourceValue::from("+966501234567"), &ColumnType::Text).unwrap();
		assert_eq!(value.encode().unwrap(), "+966501234567");
	}

	#[rstest]
	fn test_option_conversion() {
		assert_eq!(SourceValue::from(None::<&str>), SourceValue::Null);
		assert_eq!(SourceValue::from(Some(7i64)), SourceValue::Int(7));
	}
}
