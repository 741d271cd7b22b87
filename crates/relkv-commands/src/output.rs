//! Terminal rendering.

use colored::Colorize;
use relkv_core::RowId;
use relkv_kv::{MasterNode, SlotLayout};
use relkv_migrate::{MigrationReport, RowAttributes};
use std::fmt::Write;

/// Section heading.
pub fn header(title: &str) -> String {
	format!("\n{}\n{}", title.bold(), "=".repeat(title.len()))
}

/// Per-table report with a totals line.
pub fn render_report(report: &MigrationReport) -> String {
	let mut out = String::new();
	let _ = writeln!(
		out,
		"{:<10} {:>6} {:>10} {:>6} {:>7} {:>11} {:>8} {:>6}",
		"Table", "Rows", "Attr keys", "Nulls", "Hashes", "Index keys", "Members", "Stale"
	);
	for table in &report.tables {
		let _ = writeln!(
			out,
			"{:<10} {:>6} {:>10} {:>6} {:>7} {:>11} {:>8} {:>6}",
			table.table,
			table.rows_read,
			table.attribute_keys,
			table.null_attributes,
			table.row_hashes,
			table.index_keys,
			table.index_memberships,
			table.stale_index_keys
		);
	}
	let _ = writeln!(
		out,
		"{:<10} {:>6} {:>10}",
		"Total",
		report.rows_read(),
		report.attribute_keys()
	);

	let mode = if report.dry_run {
		"dry run, nothing written".yellow().to_string()
	} else {
		format!("{} keys written", report.keys_written())
	};
	let _ = write!(
		out,
		"{} -> {} | null policy {} | {} | {} ms",
		report.source,
		report.sink,
		report.null_policy,
		mode,
		report.elapsed_ms
	);
	out
}

/// `field: value` lines of one row.
pub fn render_row(key: &str, attributes: &RowAttributes) -> String {
	let mut out = format!("{}", key.bold());
	let width = attributes.keys().map(String::len).max().unwrap_or(0);
	for (field, value) in attributes {
		let _ = write!(out, "\n  {:<width$}  {}", field.cyan(), value, width = width);
	}
	out
}

/// Redis-style `(nil)` for an absent value.
pub fn render_value(value: Option<&str>) -> String {
	match value {
		Some(v) => format!("\"{}\"", v),
		None => "(nil)".dimmed().to_string(),
	}
}

/// Comma-separated identities.
pub fn render_ids(ids: &[RowId]) -> String {
	if ids.is_empty() {
		return "(empty)".dimmed().to_string();
	}
	ids.iter()
		.map(RowId::to_string)
		.collect::<Vec<_>>()
		.join(", ")
}

/// Slot ranges, replica ports and key counts per master.
pub fn render_layout(layout: &SlotLayout, distribution: &[(&MasterNode, usize)]) -> String {
	let mut out = String::new();
	let _ = writeln!(
		out,
		"{:<22} {:>13} {:>12} {:>6}",
		"Master", "Slots", "Replica port", "Keys"
	);
	for master in layout.masters() {
		let keys = distribution
			.iter()
			.find(|(node, _)| node.index == master.index)
			.map_or(0, |(_, count)| *count);
		let _ = writeln!(
			out,
			"{:<22} {:>13} {:>12} {:>6}",
			master.to_string(),
			master.slots.to_string(),
			master.replica_port,
			keys
		);
	}
	let total: usize = distribution.iter().map(|(_, count)| count).sum();
	let _ = write!(out, "{} keys across {} masters", total, layout.masters().len());
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use relkv_core::NullPolicy;
	use relkv_migrate::TableReport;
	use rstest::rstest;

	#[rstest]
	fn test_render_report() {
		let mut report = MigrationReport::new("memory", "memory", NullPolicy::Skip);
		report.tables.push(TableReport {
			rows_read: 7,
			attribute_keys: 34,
			null_attributes: 1,
			row_hashes: 7,
			index_keys: 9,
			index_memberships: 14,
			..TableReport::new("Order")
		});

		let out = render_report(&report);
		assert!(out.contains("Order"));
		assert!(out.contains("34"));
		assert!(out.contains("null policy skip"));
		assert!(out.contains("50 keys written"));
	}

	#[rstest]
	fn test_render_layout() {
		let layout = SlotLayout::default();
		let distribution = layout.distribution(["foo", "bar", "hello"]);
		let out = render_layout(&layout, &distribution);

		assert!(out.contains("Master-0 (port 7000)"));
		assert!(out.contains("12288-16383"));
		assert!(out.contains("7007"));
		assert!(out.contains("3 keys across 4 masters"));
	}
}
