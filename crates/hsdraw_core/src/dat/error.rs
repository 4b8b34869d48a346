use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, DatError>;

/// Errors produced while parsing, resolving, and relocating `.dat` data.
#[derive(Debug, Error)]
pub enum DatError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: usize,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: usize,
	},
	/// Input is shorter than the fixed file header.
	#[error("file too small for header: {len} bytes")]
	HeaderTooSmall {
		/// Input length.
		len: usize,
	},
	/// Header `fileSize` exceeds the configured limit.
	#[error("header file size {file_size} exceeds limit {limit}")]
	FileSizeOutOfBounds {
		/// Declared file size.
		file_size: u32,
		/// Maximum accepted size.
		limit: u32,
	},
	/// Header relocation entry count exceeds the configured limit.
	#[error("relocation entry count {count} exceeds limit {limit}")]
	RelocationCountOutOfBounds {
		/// Declared entry count.
		count: u32,
		/// Maximum accepted count.
		limit: u32,
	},
	/// A header-derived section extends past the end of the input.
	#[error("{section} section ends at {end} but input holds {len} bytes")]
	SectionOutOfBounds {
		/// Section label.
		section: &'static str,
		/// Absolute end offset required by the header.
		end: u64,
		/// Input length.
		len: usize,
	},
	/// A relocation entry names a pointer location outside the data section.
	#[error("relocation entry {index} points at 0x{location:x}, outside data section of {data_len} bytes")]
	PointerOutOfBounds {
		/// Entry index in the relocation table.
		index: usize,
		/// Data-relative pointer location.
		location: u32,
		/// Data section length.
		data_len: usize,
	},
	/// String table held fewer terminators than there are nodes.
	#[error("string table holds {found} strings, expected {expected}")]
	MissingStringTerminator {
		/// Strings decoded before running out of bytes.
		found: usize,
		/// Root plus reference node count.
		expected: usize,
	},
	/// String table bytes were not printable ASCII.
	#[error("undecodable string at string table offset 0x{offset:x}")]
	UndecodableString {
		/// Table-relative offset of the string.
		offset: u32,
	},
	/// Node table references a string offset that starts no string.
	#[error("{table} node {index} references unknown string offset 0x{string_offset:x}")]
	UnknownStringOffset {
		/// Node table label.
		table: &'static str,
		/// Node index inside its table.
		index: usize,
		/// Table-relative string offset.
		string_offset: u32,
	},
	/// Resize offset is not word aligned.
	#[error("resize offset 0x{offset:x} is not {align}-byte aligned")]
	MisalignedRange {
		/// Requested data-relative offset.
		offset: u32,
		/// Required alignment.
		align: u32,
	},
	/// Resize amount rounds to zero bytes.
	#[error("resize of {requested} bytes at 0x{offset:x} rounds to zero")]
	ZeroLengthRange {
		/// Requested data-relative offset.
		offset: u32,
		/// Amount before rounding.
		requested: u32,
	},
	/// Resize range crosses a structure boundary.
	#[error("range 0x{start:x}..0x{end:x} spans structures at 0x{first:x} and 0x{second:x}")]
	RangeSpansStructures {
		/// Range start.
		start: u32,
		/// Exclusive range end.
		end: u64,
		/// Owner of the first byte.
		first: i64,
		/// Owner of the last byte.
		second: i64,
	},
	/// Resize range reaches past the end of the data section.
	#[error("resize range 0x{offset:x} (+0x{len:x}) outside data section of {data_len} bytes")]
	RangeOutsideData {
		/// Range start.
		offset: u32,
		/// Requested length after rounding.
		len: u32,
		/// Data section length.
		data_len: u32,
	},
	/// Offset or range falls outside the addressable region.
	#[error("offset 0x{offset:x} (+{len}) outside {region} of {limit} bytes")]
	OffsetOutOfRange {
		/// Data-relative offset.
		offset: i64,
		/// Requested length.
		len: u64,
		/// Region label.
		region: &'static str,
		/// Region length or upper bound.
		limit: u64,
	},
	/// Mutation attempted on a blob opened read-only.
	#[error("blob is read-only")]
	ReadOnly,
	/// Structure handle predates the latest resize.
	#[error("stale structure handle for 0x{offset:x}: generation {handle} != {current}")]
	StaleHandle {
		/// Handle offset.
		offset: i64,
		/// Generation recorded in the handle.
		handle: u64,
		/// Current blob generation.
		current: u64,
	},
	/// No root or reference node targets the requested offset.
	#[error("no node targets 0x{offset:x}")]
	UnknownNode {
		/// Requested structure offset.
		offset: u32,
	},
	/// Node label cannot be stored in the string table.
	#[error("invalid node label {label:?}")]
	InvalidLabel {
		/// Rejected label.
		label: String,
	},
}

impl DatError {
	/// Whether this error belongs to the unrecoverable parse failure family.
	pub fn is_format_error(&self) -> bool {
		matches!(
			self,
			Self::UnexpectedEof { .. }
				| Self::HeaderTooSmall { .. }
				| Self::FileSizeOutOfBounds { .. }
				| Self::RelocationCountOutOfBounds { .. }
				| Self::SectionOutOfBounds { .. }
				| Self::PointerOutOfBounds { .. }
				| Self::MissingStringTerminator { .. }
				| Self::UndecodableString { .. }
				| Self::UnknownStringOffset { .. }
		)
	}

	/// Whether this error rejects a resize range and left the blob untouched.
	pub fn is_invalid_range(&self) -> bool {
		matches!(
			self,
			Self::MisalignedRange { .. } | Self::ZeroLengthRange { .. } | Self::RangeSpansStructures { .. } | Self::RangeOutsideData { .. }
		)
	}
}
