//! Command-line definition.

use clap::{Parser, Subcommand};
use relkv_conf::SinkBackend;
use relkv_core::RowId;
use std::path::PathBuf;

/// relkv command-line interface
#[derive(Debug, Parser)]
#[command(name = "relkv")]
#[command(about = "Copy relational rows into Redis as Table:id:attribute keys", long_about = None)]
#[command(version)]
pub struct Cli {
	/// Subcommand to execute
	#[command(subcommand)]
	pub command: Commands,

	/// Settings file (TOML)
	#[arg(short, long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Key-value backend: memory, redis or redis-cluster (overrides settings)
	#[arg(long, global = true, value_name = "BACKEND")]
	pub backend: Option<SinkBackend>,

	/// Redis URL; repeat for cluster seed nodes (overrides settings)
	#[arg(long = "url", global = true, value_name = "URL")]
	pub urls: Vec<String>,

	/// Verbosity level (can be repeated for more output)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbosity: u8,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
	/// Copy every row of the source into the key-value store
	Migrate {
		/// Plan and report without writing
		#[arg(long)]
		dry_run: bool,

		/// Print the report as JSON
		#[arg(long)]
		json: bool,
	},

	/// Read one attribute: GET {table}:{id}:{attribute}
	Get {
		#[arg(value_name = "TABLE")]
		table: String,
		#[arg(value_name = "ID")]
		id: RowId,
		#[arg(value_name = "ATTRIBUTE")]
		attribute: String,
	},

	/// Read every attribute of one row
	Row {
		#[arg(value_name = "TABLE")]
		table: String,
		#[arg(value_name = "ID")]
		id: RowId,
	},

	/// Find rows whose attribute equals a value
	Find {
		#[arg(value_name = "TABLE")]
		table: String,
		#[arg(value_name = "ATTRIBUTE")]
		attribute: String,
		#[arg(value_name = "VALUE")]
		value: String,

		/// Scan attribute keys even when an index set exists
		#[arg(long)]
		scan: bool,
	},

	/// List one attribute across every row of a table
	Scan {
		#[arg(value_name = "TABLE")]
		table: String,
		#[arg(value_name = "ATTRIBUTE")]
		attribute: String,
	},

	/// Follow a foreign key from a row to its parent row
	Join {
		#[arg(value_name = "TABLE")]
		table: String,
		#[arg(value_name = "ID")]
		id: RowId,
		#[arg(value_name = "FK_COLUMN")]
		fk_column: String,
	},

	/// List keys matching a glob pattern
	Keys {
		#[arg(value_name = "PATTERN", default_value = "*")]
		pattern: String,
	},

	/// Show the cluster slot layout and where the stored keys would live
	ClusterInfo {
		/// Number of masters in the layout
		#[arg(long, default_value_t = 4)]
		masters: usize,

		/// Port of the first master
		#[arg(long, default_value_t = 7000)]
		base_port: u16,
	},

	/// Create a SQLite database holding the bundled e-commerce rows
	Seed {
		#[arg(value_name = "SQLITE_PATH")]
		path: PathBuf,
	},

	/// Run the whole walkthrough in memory
	Demo,
}
