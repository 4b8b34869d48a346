use crate::dat::{DatError, DatHeader, HeaderInfo, LoadOptions, Result};

/// Borrowed slices of a `.dat` image whose extents follow from the header alone.
///
/// The string table length depends on decoding `root + reference` strings,
/// so the string table and tail stay fused in `rest` until [`Sections::finish`].
#[derive(Debug, Clone, Copy)]
pub struct Sections<'a> {
	/// Parsed header.
	pub header: DatHeader,
	/// Derived boundaries.
	pub info: HeaderInfo,
	/// Structure region.
	pub data: &'a [u8],
	/// Relocation table bytes.
	pub relocation_table: &'a [u8],
	/// Root and reference node tables, back to back.
	pub node_tables: &'a [u8],
	/// String table followed by any trailing bytes.
	pub rest: &'a [u8],
}

impl<'a> Sections<'a> {
	/// Split the header-delimited regions out of a raw image.
	pub fn split(bytes: &'a [u8], options: &LoadOptions) -> Result<Self> {
		let header = DatHeader::parse(bytes, options)?;
		let info = header.info();
		let base = DatHeader::SIZE as u64;

		let data = slice(bytes, "data", base, base + u64::from(info.relocation_table_start))?;
		let relocation_table = slice(
			bytes,
			"relocation table",
			base + u64::from(info.relocation_table_start),
			base + u64::from(info.relocation_table_start) + 4 * u64::from(header.relocation_count),
		)?;
		let node_start = base + u64::from(info.relocation_table_end);
		let node_tables = slice(
			bytes,
			"node tables",
			node_start,
			node_start + 8 * (u64::from(info.root_count) + u64::from(info.reference_count)),
		)?;
		let rest_start = node_start + node_tables.len() as u64;
		let rest = &bytes[rest_start as usize..];

		Ok(Self {
			header,
			info,
			data,
			relocation_table,
			node_tables,
			rest,
		})
	}

	/// Split `rest` into string table and tail once the string table length is known.
	pub fn finish(&self, string_table_len: usize) -> (&'a [u8], &'a [u8]) {
		let split = string_table_len.min(self.rest.len());
		self.rest.split_at(split)
	}
}

fn slice<'a>(bytes: &'a [u8], section: &'static str, start: u64, end: u64) -> Result<&'a [u8]> {
	if start > end || end > bytes.len() as u64 {
		return Err(DatError::SectionOutOfBounds {
			section,
			end,
			len: bytes.len(),
		});
	}
	Ok(&bytes[start as usize..end as usize])
}

#[cfg(test)]
mod tests {
	use hsdraw_testkit::{DatBuilder, minimal_root_image};

	use crate::dat::{DatError, LoadOptions, Sections};

	#[test]
	fn splits_minimal_image() {
		let bytes = minimal_root_image();
		let sections = Sections::split(&bytes, &LoadOptions::default()).expect("image splits");

		assert_eq!(sections.data.len(), 8);
		assert!(sections.relocation_table.is_empty());
		assert_eq!(sections.node_tables.len(), 8);
		assert_eq!(sections.rest, b"Root\0");

		let (strings, tail) = sections.finish(5);
		assert_eq!(strings, b"Root\0");
		assert!(tail.is_empty());
	}

	#[test]
	fn tail_is_split_after_strings() {
		let bytes = DatBuilder::new(8).root(0, "Root").tail(b"EXTRA").build();
		let sections = Sections::split(&bytes, &LoadOptions::default()).expect("image splits");
		let (strings, tail) = sections.finish(5);
		assert_eq!(strings, b"Root\0");
		assert_eq!(tail, b"EXTRA");
	}

	#[test]
	fn truncated_relocation_table_is_format_error() {
		let mut bytes = DatBuilder::new(8).build();
		bytes[0x08..0x0C].copy_from_slice(&4_u32.to_be_bytes());
		let err = Sections::split(&bytes, &LoadOptions::default()).expect_err("missing relocation bytes should fail");
		assert!(matches!(err, DatError::SectionOutOfBounds { section: "relocation table", .. }));
		assert!(err.is_format_error());
	}
}
