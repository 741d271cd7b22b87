//! Redis glob patterns.

use glob::{MatchOptions, Pattern};

use crate::error::{KvError, KvResult};

/// A compiled Redis `KEYS`/`SCAN MATCH` pattern.
///
/// Redis escapes metacharacters with a backslash and negates classes with
/// `^`; the pattern is rewritten to the `glob` crate's syntax (`[x]`
/// literals, `[!...]` negation) before compiling.
#[derive(Debug, Clone)]
pub struct KeyPattern {
	pattern: Pattern,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
	case_sensitive: true,
	require_literal_separator: false,
	require_literal_leading_dot: false,
};

impl KeyPattern {
	pub fn new(redis_pattern: &str) -> KvResult<Self> {
		let translated = translate(redis_pattern);
		let pattern = Pattern::new(&translated)
			.map_err(|e| KvError::InvalidPattern(format!("{}: {}", redis_pattern, e)))?;
		Ok(Self { pattern })
	}

	pub fn matches(&self, key: &str) -> bool {
		self.pattern.matches_with(key, MATCH_OPTIONS)
	}
}

fn translate(redis_pattern: &str) -> String {
	let mut out = String::with_capacity(redis_pattern.len() + 8);
	let mut chars = redis_pattern.chars().peekable();
	let mut in_class = false;

	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				if let Some(escaped) = chars.next() {
					if in_class {
						out.push(escaped);
					} else {
						out.push('[');
						out.push(escaped);
						out.push(']');
					}
				}
			}
			'[' if !in_class => {
				in_class = true;
				out.push('[');
				if chars.peek() == Some(&'^') {
					chars.next();
					out.push('!');
				}
			}
			']' if in_class => {
				in_class = false;
				out.push(']');
			}
			// glob reserves `**` for path recursion
			'*' if !in_class && out.ends_with('*') => {}
			other => out.push(other),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("Customer:*:email", "Customer:1:email", true)]
	#[case("Customer:*:email", "Customer:12:email", true)]
	#[case("Customer:*:email", "Customer:1:first_name", false)]
	#[case("Customer:*:email", "customer:1:email", false)]
	#[case("Order:100?:status", "Order:1001:status", true)]
	#[case("Order:100?:status", "Order:10010:status", false)]
	#[case("idx:Order:status:*", "idx:Order:status:delivered", true)]
	#[case("Product:10[1-3]:price", "Product:102:price", true)]
	#[case("Product:10[^1-3]:price", "Product:102:price", false)]
	#[case("Product:10[^1-3]:price", "Product:105:price", true)]
	#[case("a\\*b", "a*b", true)]
	#[case("a\\*b", "axb", false)]
	#[case("*", "anything:at:all", true)]
	#[case("Order:**", "Order:1001:status", true)]
	fn test_matches(#[case] pattern: &str, #[case] key: &str, #[case] expected: bool) {
		assert_eq!(KeyPattern::new(pattern).unwrap().matches(key), expected);
	}

	#[rstest]
	fn test_invalid_pattern() {
		assert!(matches!(
			KeyPattern::new("Product:[1-"),
			Err(KvError::InvalidPattern(_))
		));
	}
}
