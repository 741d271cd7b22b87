//! relkv
//!
//! Copies Customer, Product and Order rows into Redis as
//! `Table:id:attribute` keys and reads them back.

use clap::Parser;
use colored::Colorize;
use relkv_commands::{Cli, CommandContext, execute, init_logging};
use std::process;

#[tokio::main]
async fn main() {
	if let Err(e) = run().await {
		eprintln!("{} {:#}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

async fn run() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let ctx = CommandContext::from_cli(&cli)?;
	init_logging(&ctx.settings.logging, cli.verbosity)?;
	execute(&ctx, &cli.command).await?;
	Ok(())
}
