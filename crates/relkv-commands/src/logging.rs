//! Log output for the binary.

use crate::error::{CommandError, CommandResult};
use relkv_conf::{LogFormat, LoggingSettings};
use tracing_subscriber::EnvFilter;

/// Level after applying `-v` flags: one raises to `debug`, two or more to
/// `trace`.
pub fn effective_level(settings: &LoggingSettings, verbosity: u8) -> String {
	match verbosity {
		0 => settings.level.to_lowercase(),
		1 => "debug".to_string(),
		_ => "trace".to_string(),
	}
}

/// Installs the global subscriber. `RUST_LOG`, when set, wins over both the
/// settings and the verbosity flags. Logs go to stderr so command output on
/// stdout stays parseable.
pub fn init_logging(settings: &LoggingSettings, verbosity: u8) -> CommandResult<()> {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(effective_level(settings, verbosity)));
	let builder = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr);

	let installed = match settings.format {
		LogFormat::Json => builder.json().try_init(),
		LogFormat::Pretty => builder.with_target(false).try_init(),
	};
	installed.map_err(|e| CommandError::ExecutionError(format!("failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(0, "warn")]
	#[case(1, "debug")]
	#[case(3, "trace")]
	fn test_effective_level(#[case] verbosity: u8, #[case] expected: &str) {
		let settings = LoggingSettings {
			level: "WARN".to_string(),
			format: LogFormat::Pretty,
		};
		assert_eq!(effective_level(&settings, verbosity), expected);
	}
}
