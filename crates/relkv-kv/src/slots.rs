//! Redis Cluster hash-slot diagnostics.
//!
//! Observation only: the cluster client routes commands itself. These helpers
//! reproduce the slot computation so the distribution of a key set over the
//! masters can be reported.

use std::fmt;

/// Number of hash slots in a Redis Cluster.
pub const SLOT_COUNT: u16 = 16384;

/// CRC16/XMODEM (polynomial 0x1021, initial value 0), as used by Redis Cluster.
pub fn crc16(data: &[u8]) -> u16 {
	let mut crc: u16 = 0;
	for &byte in data {
		crc ^= (byte as u16) << 8;
		for _ in 0..8 {
			crc = if crc & 0x8000 != 0 {
				(crc << 1) ^ 0x1021
			} else {
				crc << 1
			};
		}
	}
	crc
}

/// Part of the key that is hashed: the content of the first non-empty
/// `{...}` hash tag, or the whole key.
pub fn hash_tag(key: &str) -> &str {
	if let Some(open) = key.find('{')
		&& let Some(len) = key[open + 1..].find('}')
		&& len > 0
	{
		return &key[open + 1..open + 1 + len];
	}
	key
}

/// Cluster slot of a key.
///
/// # Examples
///
/// ```
/// use relkv_kv::slots::key_hash_slot;
///
/// assert_eq!(key_hash_slot("foo"), 12182);
/// assert_eq!(
///     key_hash_slot("{user1000}.following"),
///     key_hash_slot("{user1000}.followers")
/// );
/// ```
pub fn key_hash_slot(key: &str) -> u16 {
	crc16(hash_tag(key).as_bytes()) % SLOT_COUNT
}

/// Inclusive slot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
	pub start: u16,
	pub end: u16,
}

impl SlotRange {
	pub fn contains(&self, slot: u16) -> bool {
		self.start <= slot && slot <= self.end
	}

	pub fn len(&self) -> usize {
		(self.end - self.start) as usize + 1
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Display for SlotRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}-{}", self.start, self.end)
	}
}

/// One master of the layout and its replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterNode {
	pub index: usize,
	pub port: u16,
	pub replica_port: u16,
	pub slots: SlotRange,
}

impl fmt::Display for MasterNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Master-{} (port {})", self.index, self.port)
	}
}

/// Assignment of the slot space to masters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotLayout {
	masters: Vec<MasterNode>,
}

impl SlotLayout {
	/// Splits the slot space into `masters` contiguous ranges, the way
	/// `redis-cli --cluster create` does. Masters listen on consecutive ports
	/// from `base_port`; each replica listens `masters` ports above its master.
	///
	/// `masters` is clamped to `1..=16384`.
	pub fn even(masters: usize, base_port: u16) -> Self {
		let count = masters.clamp(1, SLOT_COUNT as usize);
		let per_master = SLOT_COUNT as usize / count;
		let remainder = SLOT_COUNT as usize % count;

		let mut start = 0usize;
		let masters = (0..count)
			.map(|index| {
				let size = per_master + usize::from(index < remainder);
				let end = start + size - 1;
				let node = MasterNode {
					index,
					port: base_port.saturating_add(index as u16),
					replica_port: base_port.saturating_add((index + count) as u16),
					slots: SlotRange {
						start: start as u16,
						end: end as u16,
					},
				};
				start = end + 1;
				node
			})
			.collect();
		Self { masters }
	}

	pub fn masters(&self) -> &[MasterNode] {
		&self.masters
	}

	/// Master serving `slot`.
	pub fn node_for_slot(&self, slot: u16) -> &MasterNode {
		let slot = slot % SLOT_COUNT;
		self.masters
			.iter()
			.find(|m| m.slots.contains(slot))
			.unwrap_or(&self.masters[self.masters.len() - 1])
	}

	/// Master serving `key`.
	pub fn node_for_key(&self, key: &str) -> &MasterNode {
		self.node_for_slot(key_hash_slot(key))
	}

	/// Number of keys per master, in master order. Masters without keys are
	/// listed with zero.
	pub fn distribution<'a, I>(&self, keys: I) -> Vec<(&MasterNode, usize)>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let mut counts = vec![0usize; self.masters.len()];
		for key in keys {
			counts[self.node_for_key(key).index] += 1;
		}
		self.masters.iter().zip(counts).collect()
	}
}

impl Default for SlotLayout {
	/// Four masters on ports 7000-7003 with replicas on 7004-7007.
	fn default() -> Self {
		Self::even(4, 7000)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("foo", 12182)]
	#[case("bar", 5061)]
	#[case("hello", 866)]
	#[case("", 0)]
	fn test_key_hash_slot(#[case] key: &str, #[case] slot: u16) {
		assert_eq!(key_hash_slot(key), slot);
	}

	#[rstest]
	fn test_crc16_check_value() {
		assert_eq!(crc16(b"123456789"), 0x31C3);
	}

	#[rstest]
	#[case("{user1000}.following", "user1000")]
	#[case("foo{}{bar}", "foo{}{bar}")]
	#[case("foo{{bar}}zap", "{bar")]
	#[case("foo{bar}{zap}", "bar")]
	#[case("no-tag", "no-tag")]
	#[case("open{only", "open{only")]
	fn test_hash_tag(#[case] key: &str, #[case] expected: &str) {
		assert_eq!(hash_tag(key), expected);
	}

	#[rstest]
	fn test_hash_tags_share_slot() {
		assert_eq!(
			key_hash_slot("{user1000}.following"),
			key_hash_slot("{user1000}.followers")
		);
	}

	#[rstest]
	fn test_default_layout() {
		let layout = SlotLayout::default();
		let ranges: Vec<_> = layout
			.masters()
			.iter()
			.map(|m| (m.port, m.replica_port, m.slots.start, m.slots.end))
			.collect();
		assert_eq!(
			ranges,
			vec![
				(7000, 7004, 0, 4095),
				(7001, 7005, 4096, 8191),
				(7002, 7006, 8192, 12287),
				(7003, 7007, 12288, 16383),
			]
		);
	}

	#[rstest]
	fn test_uneven_layout_covers_all_slots() {
		let layout = SlotLayout::even(3, 7000);
		let masters = layout.masters();
		assert_eq!(masters[0].slots, SlotRange { start: 0, end: 5461 });
		assert_eq!(masters[2].slots.end, 16383);
		let total: usize = masters.iter().map(|m| m.slots.len()).sum();
		assert_eq!(total, SLOT_COUNT as usize);
	}

	#[rstest]
	fn test_distribution() {
		let layout = SlotLayout::default();
		// foo -> 12182 (master 2), bar -> 5061 (master 1), hello -> 866 (master 0)
		let dist = layout.distribution(["foo", "bar", "hello", "{foo}x"]);
		let counts: Vec<_> = dist.iter().map(|(m, n)| (m.index, *n)).collect();
		assert_eq!(counts, vec![(0, 1), (1, 1), (2, 2), (3, 0)]);
	}
}
