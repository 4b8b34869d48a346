use crate::dat::bytes::Cursor;
use crate::dat::{DatError, LoadOptions, Result};

/// Parsed `.dat` file header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatHeader {
	/// Declared total file size.
	pub file_size: u32,
	/// Data-relative start of the relocation table (also the data section length).
	pub relocation_table_start: u32,
	/// Number of 4-byte relocation entries.
	pub relocation_count: u32,
	/// Number of root node entries.
	pub root_count: u32,
	/// Number of reference node entries.
	pub reference_count: u32,
	/// Four-byte version tag.
	pub magic: [u8; 4],
	/// Reserved trailing header bytes, preserved verbatim.
	pub reserved: [u8; 8],
}

/// Section boundaries derived from header counts.
///
/// All offsets are data-relative; the header itself sits at [`DatHeader::OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
	/// Declared total file size.
	pub file_size: u32,
	/// Relocation table start.
	pub relocation_table_start: u32,
	/// Relocation table end, which is also the root node table start.
	pub relocation_table_end: u32,
	/// Reference node table start.
	pub reference_table_start: u32,
	/// String table start.
	pub string_table_start: u32,
	/// Number of root nodes.
	pub root_count: u32,
	/// Number of reference nodes.
	pub reference_count: u32,
}

impl DatHeader {
	/// Size of the fixed file header.
	pub const SIZE: usize = 0x20;
	/// Data-relative address of the header.
	pub const OFFSET: i64 = -(Self::SIZE as i64);

	/// Parse and bounds-check the header at the start of `bytes`.
	pub fn parse(bytes: &[u8], options: &LoadOptions) -> Result<Self> {
		let raw = bytes.get(..Self::SIZE).ok_or(DatError::HeaderTooSmall { len: bytes.len() })?;
		let mut cursor = Cursor::new(raw);

		let file_size = cursor.read_u32()?;
		let relocation_table_start = cursor.read_u32()?;
		let relocation_count = cursor.read_u32()?;
		let root_count = cursor.read_u32()?;
		let reference_count = cursor.read_u32()?;
		let magic = cursor.read_code4()?;
		let mut reserved = [0_u8; 8];
		reserved.copy_from_slice(cursor.read_exact(8)?);

		if file_size > options.max_file_size {
			return Err(DatError::FileSizeOutOfBounds {
				file_size,
				limit: options.max_file_size,
			});
		}
		if relocation_count > options.max_relocation_entries {
			return Err(DatError::RelocationCountOutOfBounds {
				count: relocation_count,
				limit: options.max_relocation_entries,
			});
		}

		Ok(Self {
			file_size,
			relocation_table_start,
			relocation_count,
			root_count,
			reference_count,
			magic,
			reserved,
		})
	}

	/// Serialize back to the fixed 32-byte layout.
	pub fn to_bytes(&self) -> [u8; Self::SIZE] {
		let mut out = [0_u8; Self::SIZE];
		out[0x00..0x04].copy_from_slice(&self.file_size.to_be_bytes());
		out[0x04..0x08].copy_from_slice(&self.relocation_table_start.to_be_bytes());
		out[0x08..0x0C].copy_from_slice(&self.relocation_count.to_be_bytes());
		out[0x0C..0x10].copy_from_slice(&self.root_count.to_be_bytes());
		out[0x10..0x14].copy_from_slice(&self.reference_count.to_be_bytes());
		out[0x14..0x18].copy_from_slice(&self.magic);
		out[0x18..0x20].copy_from_slice(&self.reserved);
		out
	}

	/// Derive section boundaries.
	///
	/// Boundaries are computed in `u64` and saturate at `u32::MAX`, so a
	/// hostile header cannot wrap them below an earlier boundary.
	pub fn info(&self) -> HeaderInfo {
		let relocation_table_end = u64::from(self.relocation_table_start) + 4 * u64::from(self.relocation_count);
		let reference_table_start = relocation_table_end + 8 * u64::from(self.root_count);
		let string_table_start = reference_table_start + 8 * u64::from(self.reference_count);

		HeaderInfo {
			file_size: self.file_size,
			relocation_table_start: self.relocation_table_start,
			relocation_table_end: saturate(relocation_table_end),
			reference_table_start: saturate(reference_table_start),
			string_table_start: saturate(string_table_start),
			root_count: self.root_count,
			reference_count: self.reference_count,
		}
	}

	/// Printable version tag, with non-graphic bytes shown as `.`.
	pub fn magic_label(&self) -> String {
		self.magic
			.iter()
			.map(|byte| if byte.is_ascii_graphic() || *byte == b' ' { char::from(*byte) } else { '.' })
			.collect()
	}
}

impl HeaderInfo {
	/// Total node count across both node tables.
	pub fn node_count(&self) -> u32 {
		self.root_count.saturating_add(self.reference_count)
	}

	/// Whether a reference node table is present.
	pub fn has_reference_table(&self) -> bool {
		self.reference_count > 0
	}
}

fn saturate(value: u64) -> u32 {
	u32::try_from(value).unwrap_or(u32::MAX)
}
