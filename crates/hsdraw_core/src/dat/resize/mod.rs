use tracing::info;

use crate::dat::bytes::write_u32_at;
use crate::dat::resolver::StructureCache;
use crate::dat::{Blob, DatError, RelocationIndex, Result};

/// Granularity resize amounts are rounded to, keeping later structures aligned.
pub const ALIGNMENT: u32 = 0x20;

/// Alignment required of resize offsets.
const WORD: u32 = 4;

/// One surviving pointer after a resize, before it is committed.
struct Moved {
	old_location: u32,
	new_location: u32,
	old_target: u32,
	new_target: u32,
}

impl Blob {
	/// Insert zeroed bytes at `offset`, shifting everything at or after it.
	///
	/// `amount` is rounded up to [`ALIGNMENT`]. Returns the applied amount.
	pub fn insert(&mut self, offset: u32, amount: u32) -> Result<u32> {
		self.ensure_writable()?;
		check_word_aligned(offset)?;
		let requested = amount;
		let amount = amount.checked_next_multiple_of(ALIGNMENT).unwrap_or(0);
		if amount == 0 {
			return Err(DatError::ZeroLengthRange { offset, requested });
		}

		let data_len = self.data.len() as u32;
		if offset > data_len {
			return Err(out_of_data(offset, 0, data_len));
		}
		if data_len.checked_add(amount).is_none() {
			return Err(out_of_data(offset, amount, data_len));
		}

		let shift = |value: u32| if value >= offset { value.checked_add(amount) } else { Some(value) };
		let mut moved = Vec::with_capacity(self.relocations.len());
		for (location, target) in self.relocations.pointer_offsets().iter().zip(self.relocations.pointer_values()) {
			moved.push(Moved {
				old_location: *location,
				new_location: shift(*location).ok_or_else(|| out_of_data(*location, amount, data_len))?,
				old_target: *target,
				new_target: shift(*target).ok_or_else(|| out_of_data(*target, amount, data_len))?,
			});
		}
		for node in self.nodes() {
			shift(node.struct_offset).ok_or_else(|| out_of_data(node.struct_offset, amount, data_len))?;
		}

		// Nothing below can fail.
		self.commit_pointers(moved, &[]);
		let at = offset as usize;
		self.data.splice(at..at, std::iter::repeat_n(0_u8, amount as usize));
		for node in self.root_nodes.iter_mut().chain(self.reference_nodes.iter_mut()) {
			if node.struct_offset >= offset {
				node.struct_offset += amount;
			}
		}

		self.finish_resize(false);
		info!(offset, amount, generation = self.generation, "inserted bytes");
		Ok(amount)
	}

	/// Delete bytes at `offset`, nulling pointers into the removed range.
	///
	/// `amount` is rounded down to [`ALIGNMENT`]; the range must sit inside
	/// one structure. Nodes targeting the range are dropped with their labels.
	/// Returns the applied amount.
	pub fn remove(&mut self, offset: u32, amount: u32) -> Result<u32> {
		self.ensure_writable()?;
		check_word_aligned(offset)?;
		let requested = amount;
		let amount = amount - amount % ALIGNMENT;
		if amount == 0 {
			return Err(DatError::ZeroLengthRange { offset, requested });
		}

		let data_len = self.data.len() as u32;
		let end = u64::from(offset) + u64::from(amount);
		if end > u64::from(data_len) {
			return Err(out_of_data(offset, amount, data_len));
		}
		let end = end as u32;

		let first = self.structure_index.owner_of(i64::from(offset));
		let last = self.structure_index.owner_of(i64::from(end) - 1);
		if first != last {
			return Err(DatError::RangeSpansStructures {
				start: offset,
				end: u64::from(end),
				first,
				second: last,
			});
		}

		let removed = offset..end;
		let shift = |value: u32| if value >= end { value - amount } else { value };
		let mut moved = Vec::with_capacity(self.relocations.len());
		let mut nulled = Vec::new();
		for (location, target) in self.relocations.pointer_offsets().iter().zip(self.relocations.pointer_values()) {
			if removed.contains(location) {
				continue;
			}
			if removed.contains(target) {
				nulled.push(*location);
				continue;
			}
			moved.push(Moved {
				old_location: *location,
				new_location: shift(*location),
				old_target: *target,
				new_target: shift(*target),
			});
		}

		let pointers_before = self.relocations.len();
		self.commit_pointers(moved, &nulled);
		self.data.drain(offset as usize..end as usize);

		let nodes_before = self.root_nodes.len() + self.reference_nodes.len();
		for nodes in [&mut self.root_nodes, &mut self.reference_nodes] {
			nodes.retain(|node| !removed.contains(&node.struct_offset));
			for node in nodes.iter_mut() {
				node.struct_offset = shift(node.struct_offset);
			}
		}
		let nodes_removed = nodes_before - (self.root_nodes.len() + self.reference_nodes.len());

		self.finish_resize(nodes_removed > 0);
		info!(
			offset,
			amount,
			pointers_dropped = pointers_before - self.relocations.len(),
			pointers_nulled = nulled.len(),
			nodes_removed,
			generation = self.generation,
			"removed bytes"
		);
		Ok(amount)
	}

	/// Write shifted targets and nulls at their pre-resize locations, then
	/// swap in the surviving pointer list.
	fn commit_pointers(&mut self, moved: Vec<Moved>, nulled: &[u32]) {
		for location in nulled {
			write_u32_at(&mut self.data, *location as usize, 0);
		}

		let mut pointer_offsets = Vec::with_capacity(moved.len());
		let mut pointer_values = Vec::with_capacity(moved.len());
		for item in moved {
			if item.new_target != item.old_target {
				write_u32_at(&mut self.data, item.old_location as usize, item.new_target);
			}
			pointer_offsets.push(item.new_location);
			pointer_values.push(item.new_target);
		}
		self.relocations = RelocationIndex::from_parts(pointer_offsets, pointer_values);
	}

	fn finish_resize(&mut self, nodes_removed: bool) {
		self.dirty.header = true;
		self.dirty.relocation_table = true;
		self.dirty.node_tables = true;
		if nodes_removed {
			self.refresh_strings();
			self.dirty.string_table = true;
		}

		self.rebuild_structure_index();
		self.cache = StructureCache::default();
		self.generation += 1;
	}
}

fn check_word_aligned(offset: u32) -> Result<()> {
	if offset % WORD != 0 {
		return Err(DatError::MisalignedRange { offset, align: WORD });
	}
	Ok(())
}

fn out_of_data(offset: u32, len: u32, data_len: u32) -> DatError {
	DatError::RangeOutsideData { offset, len, data_len }
}

#[cfg(test)]
mod tests;
