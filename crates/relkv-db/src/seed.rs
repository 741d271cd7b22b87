//! Bundled e-commerce seed data.
//!
//! Five customers, six products and seven orders. Columns the rows leave
//! NULL (`Product.description` for the accessories, the pending order's
//! `shipping_address`) are intentional: they exercise the null policy.

use indexmap::IndexMap;
use relkv_core::{SourceRow, SourceValue};

fn row<const N: usize>(pairs: [(&str, SourceValue); N]) -> SourceRow {
	pairs
		.into_iter()
		.map(|(column, value)| (column.to_string(), value))
		.collect()
}

#[allow(clippy::too_many_arguments)]
fn customer(
	id: i64,
	first_name: &str,
	last_name: &str,
	email: &str,
	phone: &str,
	city: &str,
	created_at: &str,
) -> SourceRow {
	row([
		("customer_id", id.into()),
		("first_name", first_name.into()),
		("last_name", last_name.into()),
		("email", email.into()),
		("phone", phone.into()),
		("city", city.into()),
		("country", "Saudi Arabia".into()),
		("created_at", created_at.into()),
	])
}

fn product(
	id: i64,
	name: &str,
	category: &str,
	price: f64,
	stock: i64,
	description: Option<&str>,
) -> SourceRow {
	row([
		("product_id", id.into()),
		("product_name", name.into()),
		("category", category.into()),
		("price", price.into()),
		("stock_quantity", stock.into()),
		("description", description.into()),
	])
}

fn order(
	id: i64,
	customer_id: i64,
	date: &str,
	status: &str,
	total: f64,
	address: Option<&str>,
) -> SourceRow {
	row([
		("order_id", id.into()),
		("customer_id", customer_id.into()),
		("order_date", date.into()),
		("status", status.into()),
		("total_amount", total.into()),
		("shipping_address", address.into()),
	])
}

/// Customer rows, ids 1-5.
pub fn customers() -> Vec<SourceRow> {
	vec![
		customer(1, "Ahmed", "Al-Rashid", "ahmed.rashid@email.com", "+966501234567", "Riyadh", "2024-01-15"),
		customer(2, "Fatima", "Hassan", "fatima.hassan@email.com", "+966502345678", "Jeddah", "2024-02-03"),
		customer(3, "Mohammed", "Al-Saud", "mohammed.saud@email.com", "+966503456789", "Dammam", "2024-02-20"),
		customer(4, "Sara", "Abdullah", "sara.abdullah@email.com", "+966504567890", "Riyadh", "2024-03-11"),
		customer(5, "Khalid", "Omar", "khalid.omar@email.com", "+966505678901", "Mecca", "2024-04-02"),
	]
}

/// Product rows, ids 101-106.
pub fn products() -> Vec<SourceRow> {
	vec![
		product(101, "Laptop Pro 15", "Electronics", 4500.00, 25, Some("15-inch laptop, 32 GB RAM, 1 TB SSD")),
		product(102, "Wireless Mouse", "Electronics", 150.00, 100, None),
		product(103, "Office Chair", "Furniture", 850.00, 30, Some("Ergonomic mesh chair with lumbar support")),
		product(104, "Standing Desk", "Furniture", 2200.00, 15, Some("Electric height-adjustable desk")),
		product(105, "Noise-Canceling Headphones", "Electronics", 1200.00, 50, Some("Over-ear, active noise cancellation")),
		product(106, "USB-C Hub", "Electronics", 280.00, 75, None),
	]
}

/// Order rows, ids 1001-1007.
pub fn orders() -> Vec<SourceRow> {
	vec![
		order(1001, 1, "2024-06-01", "delivered", 4650.00, Some("King Fahd Road, Riyadh")),
		order(1002, 2, "2024-06-05", "delivered", 3050.00, Some("Tahlia Street, Jeddah")),
		order(1003, 1, "2024-06-10", "shipped", 1200.00, Some("King Fahd Road, Riyadh")),
		order(1004, 3, "2024-06-15", "processing", 2480.00, Some("Corniche Road, Dammam")),
		order(1005, 4, "2024-06-20", "pending", 850.00, None),
		order(1006, 5, "2024-06-25", "delivered", 4780.00, Some("Ibrahim Al-Khalil Road, Mecca")),
		order(1007, 2, "2024-07-01", "shipped", 430.00, Some("Tahlia Street, Jeddah")),
	]
}

/// All seed rows keyed by table name, in migration order.
pub fn ecommerce() -> IndexMap<String, Vec<SourceRow>> {
	let mut tables = IndexMap::new();
	tables.insert("Customer".to_string(), customers());
	tables.insert("Product".to_string(), products());
	tables.insert("Order".to_string(), orders());
	tables
}
