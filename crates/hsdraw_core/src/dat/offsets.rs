use crate::dat::{DatHeader, HeaderInfo};

/// Sorted, duplicate-free set of every known structure start.
///
/// Holds the header, every distinct pointer target (data and node pointers),
/// and the table boundaries. Doubles as a range index: each entry owns the
/// bytes up to the next entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureIndex {
	offsets: Vec<i64>,
}

impl StructureIndex {
	/// Build from header boundaries and pointer targets.
	pub fn build(info: &HeaderInfo, targets: impl IntoIterator<Item = u32>) -> Self {
		let mut offsets: Vec<i64> = targets.into_iter().map(i64::from).collect();
		offsets.push(DatHeader::OFFSET);
		offsets.push(i64::from(info.relocation_table_start));
		offsets.push(i64::from(info.relocation_table_end));
		if info.reference_table_start != info.string_table_start {
			offsets.push(i64::from(info.reference_table_start));
		}
		offsets.push(i64::from(info.string_table_start));

		offsets.sort_unstable();
		offsets.dedup();
		Self { offsets }
	}

	/// All entries, strictly increasing.
	pub fn offsets(&self) -> &[i64] {
		&self.offsets
	}

	/// Whether `offset` is a known structure start.
	pub fn contains(&self, offset: i64) -> bool {
		self.offsets.binary_search(&offset).is_ok()
	}

	/// Start of the structure owning `offset`.
	///
	/// Offsets before the first entry are attributed to the header entry.
	pub fn owner_of(&self, offset: i64) -> i64 {
		let idx = self.offsets.partition_point(|start| *start <= offset);
		if idx == 0 { self.offsets[0] } else { self.offsets[idx - 1] }
	}

	/// First entry strictly greater than `offset`.
	pub fn next_after(&self, offset: i64) -> Option<i64> {
		let idx = self.offsets.partition_point(|start| *start <= offset);
		self.offsets.get(idx).copied()
	}

	/// Distance to the next greater entry, or `None` past the last one.
	pub fn length_of(&self, offset: i64) -> Option<u32> {
		let next = self.next_after(offset)?;
		u32::try_from(next - offset).ok()
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.offsets.len()
	}

	/// Whether the index holds no entries. Never true for a built index.
	pub fn is_empty(&self) -> bool {
		self.offsets.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use hsdraw_testkit::minimal_root_image;

	use crate::dat::{DatHeader, LoadOptions, StructureIndex};

	fn minimal_index() -> StructureIndex {
		let info = DatHeader::parse(&minimal_root_image(), &LoadOptions::default()).expect("header parses").info();
		StructureIndex::build(&info, [0])
	}

	#[test]
	fn minimal_image_index_matches_layout() {
		let index = minimal_index();
		assert_eq!(index.offsets(), &[-0x20, 0, 8, 16]);
		assert_eq!(index.length_of(0), Some(8));
		assert_eq!(index.length_of(16), None);
	}

	#[test]
	fn owner_lookup_uses_range_membership() {
		let index = minimal_index();
		assert_eq!(index.owner_of(3), 0);
		assert_eq!(index.owner_of(8), 8);
		assert_eq!(index.owner_of(-4), -0x20);
		assert_eq!(index.owner_of(-0x40), -0x20);
		assert_eq!(index.owner_of(100), 16);
	}

	#[test]
	fn entries_are_strictly_increasing() {
		let info = DatHeader::parse(&minimal_root_image(), &LoadOptions::default()).expect("header parses").info();
		let index = StructureIndex::build(&info, [4, 0, 4, 8, 0]);
		assert!(index.offsets().windows(2).all(|pair| pair[0] < pair[1]));
		assert!(index.contains(4));
	}
}
