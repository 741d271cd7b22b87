//! Configuration sources for layered settings
//!
//! Sources are merged in priority order (environment variables > TOML file >
//! defaults). Nested sections are JSON objects, so `[sink] backend = "redis"`
//! in a file and `RELKV_SINK__BACKEND=redis` in the environment land on the
//! same setting.

use crate::error::SourceError;
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the environment variables read by [`EnvSource::relkv`].
pub const ENV_PREFIX: &str = "RELKV_";

/// Separator between section and key in environment variable names.
pub const ENV_NESTING: &str = "__";

/// Settings whose environment values are comma-separated lists.
const LIST_KEYS: &[&str] = &["urls", "fixtures", "indexes"];

/// Settings whose environment values are taken verbatim, so `0`, `no` or
/// `off` stay text.
const STRING_KEYS: &[&str] = &[
	"database_url",
	"backend",
	"null_policy",
	"tombstone",
	"level",
	"format",
];

/// Trait for configuration sources
pub trait ConfigSource: Send + Sync {
	/// Load configuration from this source
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError>;

	/// Get the priority of this source (higher = more important)
	fn priority(&self) -> u8;

	/// Get a description of this source
	fn description(&self) -> String;
}

/// Environment variable configuration source
pub struct EnvSource {
	prefix: String,
}

impl EnvSource {
	/// Reads variables starting with `prefix`.
	///
	/// # Examples
	///
	/// ```
	/// use relkv_conf::sources::EnvSource;
	///
	/// let source = EnvSource::new("APP_");
	/// ```
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	/// Reads `RELKV_*` variables.
	pub fn relkv() -> Self {
		Self::new(ENV_PREFIX)
	}

	/// Loads from explicit `(name, value)` pairs instead of the process
	/// environment.
	pub fn load_from<I>(&self, vars: I) -> IndexMap<String, Value>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		let mut config = serde_json::Map::new();

		for (name, value) in vars {
			let Some(stripped) = name.strip_prefix(&self.prefix) else {
				continue;
			};
			let path: Vec<String> = stripped
				.split(ENV_NESTING)
				.map(str::to_lowercase)
				.collect();
			if path.iter().any(String::is_empty) {
				continue;
			}

			let leaf = path.last().map(String::as_str).unwrap_or_default();
			insert_path(&mut config, &path, parse_env_value(leaf, &value));
		}

		config.into_iter().collect()
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::relkv()
	}
}

impl ConfigSource for EnvSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.load_from(std::env::vars()))
	}

	fn priority(&self) -> u8 {
		100 // Highest priority
	}

	fn description(&self) -> String {
		format!("Environment variables (prefix: {})", self.prefix)
	}
}

fn parse_env_value(leaf: &str, value: &str) -> Value {
	if LIST_KEYS.contains(&leaf) {
		let items = value
			.split(',')
			.map(str::trim)
			.filter(|item| !item.is_empty())
			.map(|item| Value::String(item.to_string()))
			.collect();
		return Value::Array(items);
	}
	if STRING_KEYS.contains(&leaf) {
		return Value::String(value.to_string());
	}

	match value.trim().to_lowercase().as_str() {
		"true" | "yes" | "on" => return Value::Bool(true),
		"false" | "no" | "off" => return Value::Bool(false),
		_ => {}
	}
	if let Ok(num) = value.parse::<i64>() {
		Value::Number(num.into())
	} else {
		Value::String(value.to_string())
	}
}

fn insert_path(config: &mut serde_json::Map<String, Value>, path: &[String], value: Value) {
	let Some((last, parents)) = path.split_last() else {
		return;
	};
	let mut current = config;
	for segment in parents {
		let entry = current
			.entry(segment.clone())
			.or_insert_with(|| Value::Object(serde_json::Map::new()));
		if !entry.is_object() {
			*entry = Value::Object(serde_json::Map::new());
		}
		let Value::Object(next) = entry else {
			return;
		};
		current = next;
	}
	current.insert(last.clone(), value);
}

/// TOML file configuration source
pub struct TomlFileSource {
	path: PathBuf,
	required: bool,
}

impl TomlFileSource {
	/// A TOML file that is skipped when it does not exist.
	///
	/// # Examples
	///
	/// ```
	/// use relkv_conf::sources::TomlFileSource;
	///
	/// let source = TomlFileSource::new("relkv.toml");
	/// ```
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}

	/// A TOML file that must exist.
	pub fn required(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ConfigSource for TomlFileSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		if !self.path.exists() {
			if self.required {
				return Err(SourceError::InvalidSource(format!(
					"{} does not exist",
					self.path.display()
				)));
			}
			return Ok(IndexMap::new());
		}

		let content = fs::read_to_string(&self.path)?;
		let toml_value: toml::Value = toml::from_str(&content)?;
		let json_value = serde_json::to_value(toml_value)?;

		let map = json_value
			.as_object()
			.ok_or_else(|| SourceError::Parse("Expected table at root".to_string()))?;

		Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
	}

	fn priority(&self) -> u8 {
		50 // Medium priority
	}

	fn description(&self) -> String {
		format!("TOML file: {}", self.path.display())
	}
}

/// Default values configuration source
#[derive(Default)]
pub struct DefaultSource {
	values: IndexMap<String, Value>,
}

impl DefaultSource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a default value for a top-level key
	///
	/// # Examples
	///
	/// ```
	/// use relkv_conf::sources::DefaultSource;
	/// use serde_json::json;
	///
	/// let source = DefaultSource::new()
	///     .with_value("sink", json!({ "backend": "memory" }));
	/// ```
	pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
		self.values.insert(key.into(), value);
		self
	}

	/// Takes every top-level field of a serialized object as a default.
	pub fn from_object(value: Value) -> Result<Self, SourceError> {
		match value {
			Value::Object(map) => Ok(Self {
				values: map.into_iter().collect(),
			}),
			other => Err(SourceError::Parse(format!(
				"Expected object for defaults, got {}",
				other
			))),
		}
	}
}

impl ConfigSource for DefaultSource {
	fn load(&self) -> Result<IndexMap<String, Value>, SourceError> {
		Ok(self.values.clone())
	}

	fn priority(&self) -> u8 {
		0 // Lowest priority
	}

	fn description(&self) -> String {
		"Default values".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;
	use std::io::Write;
	use tempfile::TempDir;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_env_nesting() {
		let config = EnvSource::relkv().load_from(vars(&[
			("RELKV_SINK__BACKEND", "redis-cluster"),
			("RELKV_SINK__URLS", "redis://10.0.0.1:7000, redis://10.0.0.2:7001"),
			("RELKV_MAPPER__ROW_HASHES", "false"),
			("RELKV_MAPPER__INDEXES", "Order.status"),
			("RELKV_SOURCE__DATABASE_URL", "sqlite://shop.db"),
			("HOME", "/root"),
		]));

		assert_eq!(config.len(), 3);
		assert_eq!(
			config["sink"],
			json!({
				"backend": "redis-cluster",
				"urls": ["redis://10.0.0.1:7000", "redis://10.0.0.2:7001"]
			})
		);
		assert_eq!(config["mapper"]["row_hashes"], json!(false));
		assert_eq!(config["mapper"]["indexes"], json!(["Order.status"]));
		assert_eq!(config["source"]["database_url"], json!("sqlite://shop.db"));
	}

	#[rstest]
	fn test_env_ignores_empty_segments() {
		let config = EnvSource::relkv().load_from(vars(&[
			("RELKV_", "x"),
			("RELKV_SINK__", "x"),
			("RELKV_LOGGING__LEVEL", "debug"),
		]));
		assert_eq!(config.len(), 1);
		assert_eq!(config["logging"]["level"], json!("debug"));
	}

	#[rstest]
	#[case("row_hashes", "true", json!(true))]
	#[case("verify_references", "off", json!(false))]
	#[case("row_hashes", "42", json!(42))]
	#[case("tombstone", "<null>", json!("<null>"))]
	#[case("tombstone", "0", json!("0"))]
	#[case("tombstone", "no", json!("no"))]
	#[case("level", "off", json!("off"))]
	#[case("database_url", "sqlite://1.db", json!("sqlite://1.db"))]
	fn test_env_scalar_parsing(#[case] leaf: &str, #[case] raw: &str, #[case] expected: Value) {
		assert_eq!(parse_env_value(leaf, raw), expected);
	}

	#[rstest]
	fn test_toml_source() {
		let temp_dir = TempDir::new().unwrap();
		let config_path = temp_dir.path().join("relkv.toml");

		let mut file = fs::File::create(&config_path).unwrap();
		writeln!(
			file,
			r#"
[sink]
backend = "redis"
urls = ["redis://localhost:6379"]

[mapper]
null_policy = "tombstone"
"#
		)
		.unwrap();

		let config = TomlFileSource::new(&config_path).load().unwrap();
		assert_eq!(config["sink"]["backend"], json!("redis"));
		assert_eq!(config["mapper"]["null_policy"], json!("tombstone"));
	}

	#[rstest]
	fn test_missing_toml_file() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("absent.toml");

		assert!(TomlFileSource::new(&path).load().unwrap().is_empty());
		assert!(matches!(
			TomlFileSource::required(&path).load(),
			Err(SourceError::InvalidSource(_))
		));
	}

	#[rstest]
	fn test_default_source_from_object() {
		let source = DefaultSource::from_object(json!({ "a": 1, "b": { "c": true } })).unwrap();
		let config = source.load().unwrap();
		assert_eq!(config["b"]["c"], json!(true));
		assert!(DefaultSource::from_object(json!([1, 2])).is_err());
	}

	#[rstest]
	fn test_source_priority() {
		assert_eq!(EnvSource::relkv().priority(), 100);
		assert_eq!(TomlFileSource::new("relkv.toml").priority(), 50);
		assert_eq!(DefaultSource::new().priority(), 0);
	}
}
