use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use crate::dat::bytes::{Cursor, read_u32_at};
use crate::dat::{DatError, Result};

/// One relocated pointer: the 4-byte slot at `location` holds `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pointer {
	/// Data-relative offset of the pointer slot.
	pub location: u32,
	/// Data-relative offset the slot points at.
	pub target: u32,
}

/// Parallel pointer location/target lists decoded from the relocation table.
///
/// Only data-section pointers live here; node-table entries are folded in
/// by [`crate::dat::Blob::pointer_offsets`] and friends.
#[derive(Debug, Clone, Default)]
pub struct RelocationIndex {
	pointer_offsets: Vec<u32>,
	pointer_values: Vec<u32>,
	by_location: BTreeMap<u32, usize>,
}

impl RelocationIndex {
	/// Decode relocation entries and read each pointer value from `data`.
	pub fn build(relocation_table: &[u8], data: &[u8]) -> Result<Self> {
		let mut cursor = Cursor::new(relocation_table);
		let count = relocation_table.len() / 4;
		let mut pointer_offsets = Vec::with_capacity(count);
		let mut pointer_values = Vec::with_capacity(count);

		for index in 0..count {
			let location = cursor.read_u32()?;
			let target = read_u32_at(data, location as usize).ok_or(DatError::PointerOutOfBounds {
				index,
				location,
				data_len: data.len(),
			})?;
			pointer_offsets.push(location);
			pointer_values.push(target);
		}

		Ok(Self::from_parts(pointer_offsets, pointer_values))
	}

	/// Assemble an index from parallel lists of equal length.
	pub fn from_parts(pointer_offsets: Vec<u32>, pointer_values: Vec<u32>) -> Self {
		debug_assert_eq!(pointer_offsets.len(), pointer_values.len());
		let by_location = pointer_offsets.iter().enumerate().map(|(idx, location)| (*location, idx)).collect();
		Self {
			pointer_offsets,
			pointer_values,
			by_location,
		}
	}

	/// Pointer slot locations in relocation-table order.
	pub fn pointer_offsets(&self) -> &[u32] {
		&self.pointer_offsets
	}

	/// Pointer targets, parallel to [`RelocationIndex::pointer_offsets`].
	pub fn pointer_values(&self) -> &[u32] {
		&self.pointer_values
	}

	/// Pointers sorted by location.
	pub fn pointers(&self) -> Vec<Pointer> {
		self.by_location
			.iter()
			.map(|(location, idx)| Pointer {
				location: *location,
				target: self.pointer_values[*idx],
			})
			.collect()
	}

	/// Pointers whose slot lies inside `range`, sorted by location.
	pub fn pointers_in(&self, range: Range<u32>) -> impl Iterator<Item = Pointer> + '_ {
		self.by_location.range(range).map(|(location, idx)| Pointer {
			location: *location,
			target: self.pointer_values[*idx],
		})
	}

	/// Distinct data-section pointer targets.
	pub fn targets(&self) -> HashSet<u32> {
		self.pointer_values.iter().copied().collect()
	}

	/// Whether a relocation entry names `location`.
	pub fn is_pointer_location(&self, location: u32) -> bool {
		self.by_location.contains_key(&location)
	}

	/// Target stored at a relocated slot.
	pub fn target_at(&self, location: u32) -> Option<u32> {
		self.by_location.get(&location).map(|idx| self.pointer_values[*idx])
	}

	/// Re-read targets for slots overlapping `range` after an in-place write.
	///
	/// Returns whether any target changed.
	pub(crate) fn resync_values(&mut self, data: &[u8], range: Range<u32>) -> bool {
		let start = range.start.saturating_sub(3);
		let mut changed = false;
		for (location, idx) in self.by_location.range(start..range.end) {
			let Some(target) = read_u32_at(data, *location as usize) else {
				continue;
			};
			if self.pointer_values[*idx] != target {
				self.pointer_values[*idx] = target;
				changed = true;
			}
		}
		changed
	}

	/// Serialize to relocation table bytes.
	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(self.pointer_offsets.len() * 4);
		for location in &self.pointer_offsets {
			out.extend_from_slice(&location.to_be_bytes());
		}
		out
	}

	/// Number of relocated pointers.
	pub fn len(&self) -> usize {
		self.pointer_offsets.len()
	}

	/// Whether the relocation table is empty.
	pub fn is_empty(&self) -> bool {
		self.pointer_offsets.is_empty()
	}
}
