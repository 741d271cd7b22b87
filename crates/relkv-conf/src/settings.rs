//! Typed relkv settings.
//!
//! ```toml
//! [source]
//! database_url = "sqlite://shop.db"
//! bootstrap = false
//!
//! [sink]
//! backend = "redis-cluster"
//! urls = ["redis://127.0.0.1:7000", "redis://127.0.0.1:7001"]
//!
//! [mapper]
//! null_policy = "tombstone"
//! indexes = ["Order.status"]
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```

use crate::builder::SettingsBuilder;
use crate::error::{SettingsError, SettingsResult, SourceError};
use crate::sources::{DefaultSource, EnvSource, TomlFileSource};
use relkv_core::policy::DEFAULT_TOMBSTONE;
use relkv_core::{IndexSpec, NullPolicy, Schema};
use relkv_migrate::MapperOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_LEVELS: &[&str] = &["off", "trace", "debug", "info", "warn", "error"];

/// Where rows are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
	/// sqlx connection URL of the relational store.
	pub database_url: String,
	/// Create the e-commerce tables and seed rows before reading. Unset means
	/// only in-memory databases are seeded; a file database is never
	/// overwritten unless this is `true`.
	pub bootstrap: Option<bool>,
	/// JSON fixture files loaded instead of the bundled seed rows.
	pub fixtures: Vec<PathBuf>,
}

impl Default for SourceSettings {
	fn default() -> Self {
		Self {
			database_url: "sqlite::memory:".to_string(),
			bootstrap: None,
			fixtures: Vec::new(),
		}
	}
}

impl SourceSettings {
	/// Whether `database_url` names a private in-memory SQLite database.
	pub fn is_in_memory(&self) -> bool {
		self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
	}

	/// Whether the source is seeded before reading.
	pub fn should_bootstrap(&self) -> bool {
		self.bootstrap.unwrap_or_else(|| self.is_in_memory())
	}
}

/// Key-value backend kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkBackend {
	#[default]
	Memory,
	Redis,
	RedisCluster,
}

impl SinkBackend {
	pub fn as_str(&self) -> &'static str {
		match self {
			SinkBackend::Memory => "memory",
			SinkBackend::Redis => "redis",
			SinkBackend::RedisCluster => "redis-cluster",
		}
	}
}

impl fmt::Display for SinkBackend {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for SinkBackend {
	type Err = SettingsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"memory" => Ok(SinkBackend::Memory),
			"redis" => Ok(SinkBackend::Redis),
			"redis-cluster" | "cluster" => Ok(SinkBackend::RedisCluster),
			other => Err(SettingsError::validation(
				"sink.backend",
				format!("unknown backend {:?}", other),
			)),
		}
	}
}

/// Where keys are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkSettings {
	pub backend: SinkBackend,
	/// Redis URLs. A single node uses the first one; a cluster uses them all
	/// as seed nodes.
	pub urls: Vec<String>,
}

impl Default for SinkSettings {
	fn default() -> Self {
		Self {
			backend: SinkBackend::default(),
			urls: vec!["redis://127.0.0.1:7000".to_string()],
		}
	}
}

/// Mapper options as they appear in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperSettings {
	pub null_policy: NullPolicy,
	pub tombstone: String,
	pub row_hashes: bool,
	pub indexes: Vec<IndexSpec>,
	pub verify_references: bool,
	pub concurrent_row_writes: bool,
}

impl Default for MapperSettings {
	fn default() -> Self {
		Self {
			null_policy: NullPolicy::default(),
			tombstone: DEFAULT_TOMBSTONE.to_string(),
			row_hashes: true,
			indexes: IndexSpec::defaults(),
			verify_references: true,
			concurrent_row_writes: false,
		}
	}
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Pretty,
	Json,
}

impl FromStr for LogFormat {
	type Err = SettingsError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"pretty" => Ok(LogFormat::Pretty),
			"json" => Ok(LogFormat::Json),
			other => Err(SettingsError::validation(
				"logging.format",
				format!("unknown format {:?}", other),
			)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
	/// Default `tracing` level, overridden by `RUST_LOG`.
	pub level: String,
	pub format: LogFormat,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			format: LogFormat::default(),
		}
	}
}

/// All relkv settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	pub source: SourceSettings,
	pub sink: SinkSettings,
	pub mapper: MapperSettings,
	pub logging: LoggingSettings,
}

impl Settings {
	/// Builder preloaded with the defaults, `config_path` (which must exist
	/// when given) and `RELKV_*` environment variables.
	pub fn builder(config_path: Option<&Path>) -> SettingsResult<SettingsBuilder> {
		let defaults = serde_json::to_value(Settings::default())
			.map_err(SourceError::from)
			.and_then(DefaultSource::from_object)
			.map_err(|error| SettingsError::Source {
				source_name: "Default values".to_string(),
				error,
			})?;

		let mut builder = SettingsBuilder::new().add_source(defaults);
		if let Some(path) = config_path {
			builder = builder.add_source(TomlFileSource::required(path));
		}
		Ok(builder.add_source(EnvSource::relkv()))
	}

	/// Loads settings from every layer.
	pub fn load(config_path: Option<&Path>) -> SettingsResult<Settings> {
		Self::builder(config_path)?.build()?.into_typed()
	}

	/// Mapper options for a pass (never a dry run).
	pub fn mapper_options(&self) -> MapperOptions {
		MapperOptions::default()
			.with_null_policy(self.mapper.null_policy)
			.with_tombstone(self.mapper.tombstone.clone())
			.with_row_hashes(self.mapper.row_hashes)
			.with_indexes(self.mapper.indexes.clone())
			.with_verify_references(self.mapper.verify_references)
			.with_concurrent_row_writes(self.mapper.concurrent_row_writes)
	}

	/// Checks the settings against `schema`.
	pub fn validate(&self, schema: &Schema) -> SettingsResult<()> {
		if self.source.database_url.trim().is_empty() {
			return Err(SettingsError::validation(
				"source.database_url",
				"must not be empty",
			));
		}

		if self.sink.backend != SinkBackend::Memory {
			if self.sink.urls.is_empty() {
				return Err(SettingsError::validation(
					"sink.urls",
					format!("{} needs at least one URL", self.sink.backend),
				));
			}
			if let Some(bad) = self
				.sink
				.urls
				.iter()
				.find(|url| !url.starts_with("redis://") && !url.starts_with("rediss://"))
			{
				return Err(SettingsError::validation(
					"sink.urls",
					format!("{:?} is not a redis:// URL", bad),
				));
			}
		}

		self.mapper_options()
			.validate(schema)
			.map_err(|e| SettingsError::validation("mapper", e.to_string()))?;

		if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
			return Err(SettingsError::validation(
				"logging.level",
				format!(
					"{:?} is not one of {}",
					self.logging.level,
					LOG_LEVELS.join(", ")
				),
			));
		}
		Ok(())
	}
}
