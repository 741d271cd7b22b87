//! Layered settings for relkv.
//!
//! Settings are merged from three layers, highest priority last:
//!
//! 1. built-in defaults ([`Settings::default`])
//! 2. a TOML file passed with `--config`
//! 3. `RELKV_*` environment variables, with `__` between section and key
//!    (`RELKV_SINK__BACKEND=redis-cluster`)

pub mod builder;
pub mod error;
pub mod settings;
pub mod sources;

pub use builder::{MergedSettings, SettingsBuilder};
pub use error::{SettingsError, SettingsResult, SourceError};
pub use settings::{
	LogFormat, LoggingSettings, MapperSettings, Settings, SinkBackend, SinkSettings,
	SourceSettings,
};
pub use sources::{ConfigSource, DefaultSource, EnvSource, TomlFileSource};
