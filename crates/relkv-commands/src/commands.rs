//! Command implementations.
//!
//! Lookups against the `memory` backend run a migration first, since an
//! in-process store starts empty on every invocation.

use crate::cli::Commands;
use crate::context::CommandContext;
use crate::error::{CommandError, CommandResult};
use crate::output;
use colored::Colorize;
use relkv_conf::SinkBackend;
use relkv_core::{RowId, Schema, keys};
use relkv_db::{FixtureParser, MemorySource, RowSource, SqliteSource};
use relkv_kv::{KvStore, MemoryStore, RedisStore, SlotLayout};
use relkv_migrate::{Lookup, MigrationReport, Migrator};
use std::path::Path;
use tracing::info;

/// Runs `command`.
pub async fn execute(ctx: &CommandContext, command: &Commands) -> CommandResult<()> {
	match command {
		Commands::Migrate { dry_run, json } => migrate(ctx, *dry_run, *json).await,
		Commands::Get {
			table,
			id,
			attribute,
		} => {
			let sink = prepare_sink(ctx).await?;
			get(ctx, sink.as_ref(), table, *id, attribute).await
		}
		Commands::Row { table, id } => {
			let sink = prepare_sink(ctx).await?;
			row(ctx, sink.as_ref(), table, *id).await
		}
		Commands::Find {
			table,
			attribute,
			value,
			scan,
		} => {
			let sink = prepare_sink(ctx).await?;
			find(ctx, sink.as_ref(), table, attribute, value, *scan).await
		}
		Commands::Scan { table, attribute } => {
			let sink = prepare_sink(ctx).await?;
			scan(ctx, sink.as_ref(), table, attribute).await
		}
		Commands::Join {
			table,
			id,
			fk_column,
		} => {
			let sink = prepare_sink(ctx).await?;
			join(ctx, sink.as_ref(), table, *id, fk_column).await
		}
		Commands::Keys { pattern } => {
			let sink = prepare_sink(ctx).await?;
			list_keys(sink.as_ref(), pattern).await
		}
		Commands::ClusterInfo { masters, base_port } => {
			let sink = prepare_sink(ctx).await?;
			cluster_info(sink.as_ref(), *masters, *base_port).await
		}
		Commands::Seed { path } => seed(ctx, path).await,
		Commands::Demo => demo(ctx).await,
	}
}

// ============================================================================
// Sources and sinks
// ============================================================================

/// The configured row source: fixtures when listed, SQLite otherwise.
pub async fn open_source(ctx: &CommandContext) -> CommandResult<Box<dyn RowSource>> {
	let source = &ctx.settings.source;
	if !source.fixtures.is_empty() {
		let data = FixtureParser::new().parse_files(&source.fixtures)?;
		let tables = data.into_tables(&ctx.schema)?;
		ctx.verbose(&format!("Loaded {} fixture file(s)", source.fixtures.len()));
		return Ok(Box::new(MemorySource::with_tables(tables)));
	}

	let sqlite = SqliteSource::connect(&source.database_url).await?;
	if source.should_bootstrap() {
		sqlite.bootstrap_ecommerce().await?;
		ctx.verbose(&format!("Bootstrapped {}", source.database_url));
	}
	Ok(Box::new(sqlite))
}

/// The configured key-value store.
pub async fn open_sink(ctx: &CommandContext) -> CommandResult<Box<dyn KvStore>> {
	let urls = &ctx.settings.sink.urls;
	match ctx.backend() {
		SinkBackend::Memory => Ok(Box::new(MemoryStore::new())),
		SinkBackend::Redis => {
			let url = urls.first().ok_or_else(|| {
				CommandError::InvalidArguments("redis backend needs a URL".to_string())
			})?;
			Ok(Box::new(RedisStore::connect(url).await?))
		}
		SinkBackend::RedisCluster => Ok(Box::new(RedisStore::connect_cluster(urls).await?)),
	}
}

/// Opens the sink, filling it first when it is in memory.
async fn prepare_sink(ctx: &CommandContext) -> CommandResult<Box<dyn KvStore>> {
	let sink = open_sink(ctx).await?;
	if ctx.backend() == SinkBackend::Memory {
		ctx.verbose("Memory backend: migrating before lookup");
		let source = open_source(ctx).await?;
		migrator(ctx)?.run(source.as_ref(), sink.as_ref()).await?;
	}
	Ok(sink)
}

fn migrator(ctx: &CommandContext) -> CommandResult<Migrator> {
	Ok(Migrator::new(
		ctx.schema.clone(),
		ctx.settings.mapper_options(),
	)?)
}

fn lookup<'a>(ctx: &CommandContext, schema: &'a Schema, sink: &'a dyn KvStore) -> Lookup<'a> {
	Lookup::new(schema, sink).with_indexes(ctx.settings.mapper.indexes.clone())
}

// ============================================================================
// migrate
// ============================================================================

async fn migrate(ctx: &CommandContext, dry_run: bool, json: bool) -> CommandResult<()> {
	let source = open_source(ctx).await?;
	let sink = open_sink(ctx).await?;
	let options = ctx.settings.mapper_options().with_dry_run(dry_run);
	let migrator = Migrator::new(ctx.schema.clone(), options)?;

	let report = migrator.run(source.as_ref(), sink.as_ref()).await?;
	print_report(ctx, &report, json)?;

	if ctx.backend() == SinkBackend::Memory && !dry_run {
		ctx.warning("The memory backend is discarded when the command exits");
	}
	Ok(())
}

fn print_report(ctx: &CommandContext, report: &MigrationReport, json: bool) -> CommandResult<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(report)?);
		return Ok(());
	}
	println!("{}", output::header("Migration report"));
	println!("{}", output::render_report(report));
	if !report.dry_run {
		ctx.success(&format!(
			"Migrated {} rows into {} keys",
			report.rows_read(),
			report.keys_written()
		));
	}
	Ok(())
}

// ============================================================================
// Lookups
// ============================================================================

async fn get(
	ctx: &CommandContext,
	sink: &dyn KvStore,
	table: &str,
	id: RowId,
	attribute: &str,
) -> CommandResult<()> {
	let value = lookup(ctx, &ctx.schema, sink)
		.get_attribute(table, id, attribute)
		.await?;
	println!(
		"{} = {}",
		keys::attribute_key(table, id, attribute).bold(),
		output::render_value(value.as_deref())
	);
	Ok(())
}

async fn row(ctx: &CommandContext, sink: &dyn KvStore, table: &str, id: RowId) -> CommandResult<()> {
	let key = keys::row_key(table, id);
	match lookup(ctx, &ctx.schema, sink).get_row(table, id).await? {
		Some(attributes) => println!("{}", output::render_row(&key, &attributes)),
		None => println!("{} = {}", key.bold(), output::render_value(None)),
	}
	Ok(())
}

async fn find(
	ctx: &CommandContext,
	sink: &dyn KvStore,
	table: &str,
	attribute: &str,
	value: &str,
	scan: bool,
) -> CommandResult<()> {
	let lookup = lookup(ctx, &ctx.schema, sink);
	let ids = if scan {
		lookup.find_by_scan(table, attribute, value).await?
	} else {
		lookup.find(table, attribute, value).await?
	};

	println!(
		"{} {}.{} = {:?}: {}",
		"Rows where".bold(),
		table,
		attribute,
		value,
		output::render_ids(&ids)
	);
	for id in ids {
		if let Some(attributes) = lookup.get_row(table, id).await? {
			println!("{}", output::render_row(&keys::row_key(table, id), &attributes));
		}
	}
	Ok(())
}

async fn scan(
	ctx: &CommandContext,
	sink: &dyn KvStore,
	table: &str,
	attribute: &str,
) -> CommandResult<()> {
	let values = lookup(ctx, &ctx.schema, sink)
		.scan_attribute(table, attribute)
		.await?;
	for (id, value) in &values {
		println!(
			"{:<28} {}",
			keys::attribute_key(table, *id, attribute),
			output::render_value(Some(value))
		);
	}
	ctx.info(&format!("{} value(s)", values.len()));
	Ok(())
}

async fn join(
	ctx: &CommandContext,
	sink: &dyn KvStore,
	table: &str,
	id: RowId,
	fk_column: &str,
) -> CommandResult<()> {
	let lookup = lookup(ctx, &ctx.schema, sink);
	let Some(child) = lookup.get_row(table, id).await? else {
		println!("{} = {}", keys::row_key(table, id).bold(), output::render_value(None));
		return Ok(());
	};
	println!("{}", output::render_row(&keys::row_key(table, id), &child));

	match lookup.follow_reference(table, id, fk_column).await? {
		Some(parent) => println!(
			"{}",
			output::render_row(&keys::row_key(&parent.table, parent.id), &parent.attributes)
		),
		None => ctx.warning(&format!("{}.{} does not resolve", table, fk_column)),
	}
	Ok(())
}

async fn list_keys(sink: &dyn KvStore, pattern: &str) -> CommandResult<()> {
	let found = sink.scan_keys(pattern).await?;
	for key in &found {
		println!("{}", key);
	}
	println!("{}", format!("({} keys)", found.len()).dimmed());
	Ok(())
}

async fn cluster_info(sink: &dyn KvStore, masters: usize, base_port: u16) -> CommandResult<()> {
	let layout = SlotLayout::even(masters, base_port);
	let stored = sink.scan_keys("*").await?;
	let distribution = layout.distribution(stored.iter().map(String::as_str));

	println!("{}", output::header("Cluster slot layout"));
	println!("{}", output::render_layout(&layout, &distribution));
	Ok(())
}

// ============================================================================
// seed and demo
// ============================================================================

async fn seed(ctx: &CommandContext, path: &Path) -> CommandResult<()> {
	let url = format!("sqlite://{}", path.display());
	let sqlite = SqliteSource::connect(&url).await?;
	sqlite.bootstrap_ecommerce().await?;

	for table in ctx.schema.tables() {
		let rows = sqlite.fetch_rows(table).await?;
		ctx.info(&format!("{}: {} rows", table.name, rows.len()));
	}
	ctx.success(&format!("Seeded {}", path.display()));
	Ok(())
}

async fn demo(ctx: &CommandContext) -> CommandResult<()> {
	let source = MemorySource::seeded();
	let store = MemoryStore::new();
	info!("Running the in-memory walkthrough");

	let report = migrator(ctx)?.run(&source, &store).await?;
	print_report(ctx, &report, false)?;

	let lookup = lookup(ctx, &ctx.schema, &store);

	println!("{}", output::header("Direct lookups"));
	for (table, id, attribute) in [
		("Customer", 1, "first_name"),
		("Customer", 1, "email"),
		("Order", 1001, "status"),
		("Order", 1001, "total_amount"),
		("Product", 102, "description"),
	] {
		let value = lookup.get_attribute(table, id, attribute).await?;
		println!(
			"{} = {}",
			keys::attribute_key(table, id, attribute),
			output::render_value(value.as_deref())
		);
	}

	println!("{}", output::header("Row lookup"));
	if let Some(attributes) = lookup.get_row("Customer", 2).await? {
		println!("{}", output::render_row("Customer:2", &attributes));
	}

	println!("{}", output::header("Index lookups"));
	for (table, attribute, value) in [
		("Product", "category", "Electronics"),
		("Order", "status", "delivered"),
		("Customer", "city", "Riyadh"),
	] {
		let ids = lookup.find(table, attribute, value).await?;
		println!("{}.{} = {:?}: {}", table, attribute, value, output::render_ids(&ids));
	}

	println!("{}", output::header("Following Order.customer_id"));
	for (order_id, _) in lookup.scan_attribute("Order", "customer_id").await? {
		if let Some(parent) = lookup
			.follow_reference("Order", order_id, "customer_id")
			.await?
		{
			let name = parent
				.attributes
				.get("first_name")
				.map(String::as_str)
				.unwrap_or_default();
			println!(
				"{} -> {} ({})",
				keys::row_key("Order", order_id),
				keys::row_key(&parent.table, parent.id),
				name
			);
		}
	}

	cluster_info(&store, 4, 7000).await?;
	ctx.success(&format!("Demo finished with {} keys", store.key_count().await?));
	Ok(())
}
