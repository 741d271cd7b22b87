//! Settings builder
//!
//! Collects [`ConfigSource`]s, merges them lowest priority first and hands
//! out the merged tree either key by key or as a typed struct.

use crate::error::{SettingsError, SettingsResult};
use crate::sources::ConfigSource;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Builder merging configuration sources by priority.
///
/// # Examples
///
/// ```
/// use relkv_conf::builder::SettingsBuilder;
/// use relkv_conf::sources::{DefaultSource, EnvSource};
/// use serde_json::json;
///
/// let merged = SettingsBuilder::new()
///     .add_source(DefaultSource::new().with_value("logging", json!({ "level": "info" })))
///     .add_source(EnvSource::new("RELKV_DOCTEST_"))
///     .build()
///     .unwrap();
/// assert_eq!(merged.get::<String>("logging.level").unwrap(), "info");
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Loads every source and merges them. Sources of equal priority are
	/// applied in the order they were added.
	pub fn build(mut self) -> SettingsResult<MergedSettings> {
		self.sources.sort_by_key(|source| source.priority());

		let mut merged = serde_json::Map::new();
		for source in &self.sources {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			debug!(
				source = %source.description(),
				keys = values.len(),
				"Loaded settings source"
			);
			for (key, value) in values {
				merge_value(&mut merged, key, value);
			}
		}

		Ok(MergedSettings {
			data: merged.into_iter().collect(),
		})
	}
}

/// Objects merge key by key; anything else replaces the lower layer.
fn merge_value(target: &mut serde_json::Map<String, Value>, key: String, value: Value) {
	if let Value::Object(incoming) = value {
		if let Some(Value::Object(existing)) = target.get_mut(&key) {
			for (k, v) in incoming {
				merge_value(existing, k, v);
			}
			return;
		}
		target.insert(key, Value::Object(incoming));
		return;
	}
	target.insert(key, value);
}

/// The merged settings tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSettings {
	data: IndexMap<String, Value>,
}

impl MergedSettings {
	pub fn as_map(&self) -> &IndexMap<String, Value> {
		&self.data
	}

	/// Raw value at a dotted path such as `sink.backend`.
	pub fn get_raw(&self, path: &str) -> Option<&Value> {
		let mut segments = path.split('.');
		let first = segments.next()?;
		let mut current = self.data.get(first)?;
		for segment in segments {
			current = current.as_object()?.get(segment)?;
		}
		Some(current)
	}

	/// Typed value at a dotted path.
	pub fn get<T: DeserializeOwned>(&self, path: &str) -> SettingsResult<T> {
		let value = self
			.get_raw(path)
			.ok_or_else(|| SettingsError::MissingKey(path.to_string()))?;
		serde_json::from_value(value.clone()).map_err(|e| SettingsError::Deserialize {
			key: path.to_string(),
			message: e.to_string(),
		})
	}

	/// Deserializes the whole tree.
	pub fn into_typed<T: DeserializeOwned>(self) -> SettingsResult<T> {
		let object: serde_json::Map<String, Value> = self.data.into_iter().collect();
		serde_json::from_value(Value::Object(object)).map_err(|e| SettingsError::Deserialize {
			key: "<root>".to_string(),
			message: e.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::SourceError;
	use crate::sources::DefaultSource;
	use rstest::rstest;
	use serde_json::json;

	struct FixedSource {
		values: Value,
		priority: u8,
	}

	impl ConfigSource for FixedSource {
		fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
			Ok(self
				.values
				.as_object()
				.map(|m| m.clone().into_iter().collect())
				.unwrap_or_default())
		}

		fn priority(&self) -> u8 {
			self.priority
		}

		fn description(&self) -> String {
			format!("fixed ({})", self.priority)
		}
	}

	struct BrokenSource;

	impl ConfigSource for BrokenSource {
		fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
			Err(SourceError::Parse("unterminated string".to_string()))
		}

		fn priority(&self) -> u8 {
			50
		}

		fn description(&self) -> String {
			"broken".to_string()
		}
	}

	#[rstest]
	fn test_priority_beats_insertion_order() {
		let merged = SettingsBuilder::new()
			.add_source(FixedSource {
				values: json!({ "sink": { "backend": "redis" } }),
				priority: 100,
			})
			.add_source(FixedSource {
				values: json!({ "sink": { "backend": "memory", "urls": ["redis://a:1"] } }),
				priority: 50,
			})
			.build()
			.unwrap();

		assert_eq!(merged.get::<String>("sink.backend").unwrap(), "redis");
		assert_eq!(
			merged.get::<Vec<String>>("sink.urls").unwrap(),
			vec!["redis://a:1"]
		);
	}

	#[rstest]
	fn test_arrays_replace() {
		let merged = SettingsBuilder::new()
			.add_source(DefaultSource::new().with_value("mapper", json!({ "indexes": ["A.b", "C.d"] })))
			.add_source(FixedSource {
				values: json!({ "mapper": { "indexes": ["E.f"] } }),
				priority: 50,
			})
			.build()
			.unwrap();
		assert_eq!(merged.get_raw("mapper.indexes"), Some(&json!(["E.f"])));
	}

	#[rstest]
	fn test_get_errors() {
		let merged = SettingsBuilder::new()
			.add_source(DefaultSource::new().with_value("logging", json!({ "level": "info" })))
			.build()
			.unwrap();

		assert!(matches!(
			merged.get::<String>("logging.format"),
			Err(SettingsError::MissingKey(_))
		));
		assert!(matches!(
			merged.get::<u32>("logging.level"),
			Err(SettingsError::Deserialize { .. })
		));
		assert!(merged.get_raw("logging.level.deeper").is_none());
	}

	#[rstest]
	fn test_source_failure_names_source() {
		let err = SettingsBuilder::new()
			.add_source(BrokenSource)
			.build()
			.unwrap_err();
		match err {
			SettingsError::Source { source_name, .. } => assert_eq!(source_name, "broken"),
			other => panic!("unexpected error: {:?}", other),
		}
	}
}
