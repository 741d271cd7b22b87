//! # relkv-commands
//!
//! The `relkv` command-line tool.
//!
//! ## Commands
//!
//! - `migrate`: copy every source row into the key-value store
//! - `get`, `row`, `find`, `scan`, `join`: read mapped rows back
//! - `keys`: list stored keys matching a glob pattern
//! - `cluster-info`: hash-slot layout and key distribution
//! - `seed`: write the e-commerce sample database to a SQLite file
//! - `demo`: in-memory walkthrough of all of the above
//!
//! ## Usage
//!
//! ```bash
//! relkv demo
//! relkv --backend redis --url redis://127.0.0.1:6379 migrate
//! relkv --backend redis --url redis://127.0.0.1:6379 find Order status delivered
//! ```

pub mod cli;
pub mod commands;
pub mod context;
pub mod error;
pub mod logging;
pub mod output;

pub use cli::{Cli, Commands};
pub use commands::{execute, open_sink, open_source};
pub use context::CommandContext;
pub use error::{CommandError, CommandResult};
pub use logging::{effective_level, init_logging};
