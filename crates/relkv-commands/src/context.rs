//! Command execution context

use crate::cli::Cli;
use crate::error::CommandResult;
use colored::Colorize;
use relkv_conf::{Settings, SinkBackend};
use relkv_core::Schema;

/// Settings, schema and verbosity shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
	pub settings: Settings,
	pub schema: Schema,
	pub verbosity: u8,
}

impl CommandContext {
	/// Validates `settings` against the e-commerce schema.
	pub fn new(settings: Settings, verbosity: u8) -> CommandResult<Self> {
		let schema = Schema::ecommerce();
		settings.validate(&schema)?;
		Ok(Self {
			settings,
			schema,
			verbosity,
		})
	}

	/// Loads settings from `--config` and the environment, then applies the
	/// command-line overrides.
	pub fn from_cli(cli: &Cli) -> CommandResult<Self> {
		let mut settings = Settings::load(cli.config.as_deref())?;
		if let Some(backend) = cli.backend {
			settings.sink.backend = backend;
		}
		if !cli.urls.is_empty() {
			settings.sink.urls = cli.urls.clone();
		}
		Self::new(settings, cli.verbosity)
	}

	pub fn backend(&self) -> SinkBackend {
		self.settings.sink.backend
	}

	pub fn info(&self, message: &str) {
		println!("{} {}", "[INFO]".cyan(), message);
	}

	pub fn success(&self, message: &str) {
		println!("{} {}", "[SUCCESS]".green(), message);
	}

	pub fn warning(&self, message: &str) {
		eprintln!("{} {}", "[WARNING]".yellow(), message);
	}

	pub fn verbose(&self, message: &str) {
		if self.verbosity > 0 {
			println!("{} {}", "[VERBOSE]".dimmed(), message);
		}
	}
}
