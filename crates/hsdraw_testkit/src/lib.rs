//! Shared test helpers for workspace crates.
//!
//! Game archives are not redistributable, so tests synthesize `.dat` images
//! with [`DatBuilder`] instead of reading fixtures from disk.

/// Size of the fixed file header.
pub const HEADER_SIZE: usize = 0x20;

/// Incremental builder for big-endian HSD `.dat` byte images.
#[derive(Debug, Clone)]
pub struct DatBuilder {
	data: Vec<u8>,
	relocations: Vec<u32>,
	roots: Vec<(u32, String)>,
	references: Vec<(u32, String)>,
	magic: [u8; 4],
	tail: Vec<u8>,
	file_size: Option<u32>,
}

impl DatBuilder {
	/// Start an image with `data_len` zeroed data-section bytes.
	pub fn new(data_len: usize) -> Self {
		Self {
			data: vec![0; data_len],
			relocations: Vec::new(),
			roots: Vec::new(),
			references: Vec::new(),
			magic: *b"\0\0\0\0",
			tail: Vec::new(),
			file_size: None,
		}
	}

	/// Overwrite the four-byte version tag at header offset `0x14`.
	pub fn magic(mut self, magic: [u8; 4]) -> Self {
		self.magic = magic;
		self
	}

	/// Write a big-endian `u32` into the data section.
	pub fn u32_at(mut self, offset: u32, value: u32) -> Self {
		let at = offset as usize;
		self.data[at..at + 4].copy_from_slice(&value.to_be_bytes());
		self
	}

	/// Write a big-endian `u16` into the data section.
	pub fn u16_at(mut self, offset: u32, value: u16) -> Self {
		let at = offset as usize;
		self.data[at..at + 2].copy_from_slice(&value.to_be_bytes());
		self
	}

	/// Write a big-endian `f32` into the data section.
	pub fn f32_at(self, offset: u32, value: f32) -> Self {
		self.u32_at(offset, value.to_bits())
	}

	/// Store `target` at `location` and register `location` in the relocation table.
	pub fn pointer(mut self, location: u32, target: u32) -> Self {
		self = self.u32_at(location, target);
		self.relocations.push(location);
		self
	}

	/// Register a relocation entry without touching the stored value.
	pub fn relocation(mut self, location: u32) -> Self {
		self.relocations.push(location);
		self
	}

	/// Append a root node.
	pub fn root(mut self, struct_offset: u32, label: &str) -> Self {
		self.roots.push((struct_offset, label.to_owned()));
		self
	}

	/// Append a reference node.
	pub fn reference(mut self, struct_offset: u32, label: &str) -> Self {
		self.references.push((struct_offset, label.to_owned()));
		self
	}

	/// Append trailing bytes after the string table.
	pub fn tail(mut self, bytes: &[u8]) -> Self {
		self.tail.extend_from_slice(bytes);
		self
	}

	/// Force the header `fileSize` field instead of the computed total length.
	pub fn file_size(mut self, file_size: u32) -> Self {
		self.file_size = Some(file_size);
		self
	}

	/// Serialize the image.
	///
	/// Strings are laid out in ascending structure-offset order, root nodes
	/// before reference nodes on ties.
	pub fn build(&self) -> Vec<u8> {
		let mut order: Vec<(usize, u32, &str)> = self
			.roots
			.iter()
			.chain(self.references.iter())
			.enumerate()
			.map(|(idx, (offset, label))| (idx, *offset, label.as_str()))
			.collect();
		order.sort_by_key(|(idx, offset, _)| (*offset, *idx));

		let mut strings = Vec::new();
		let mut string_offsets = vec![0_u32; order.len()];
		for (idx, _, label) in &order {
			string_offsets[*idx] = strings.len() as u32;
			strings.extend_from_slice(label.as_bytes());
			strings.push(0);
		}

		let node_count = self.roots.len() + self.references.len();
		let total = HEADER_SIZE + self.data.len() + self.relocations.len() * 4 + node_count * 8 + strings.len() + self.tail.len();

		let mut out = Vec::with_capacity(total);
		let file_size = self.file_size.unwrap_or(total as u32);
		out.extend_from_slice(&file_size.to_be_bytes());
		out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
		out.extend_from_slice(&(self.relocations.len() as u32).to_be_bytes());
		out.extend_from_slice(&(self.roots.len() as u32).to_be_bytes());
		out.extend_from_slice(&(self.references.len() as u32).to_be_bytes());
		out.extend_from_slice(&self.magic);
		out.extend_from_slice(&[0_u8; 8]);

		out.extend_from_slice(&self.data);
		for location in &self.relocations {
			out.extend_from_slice(&location.to_be_bytes());
		}
		for (idx, (offset, _)) in self.roots.iter().chain(self.references.iter()).enumerate() {
			out.extend_from_slice(&offset.to_be_bytes());
			out.extend_from_slice(&string_offsets[idx].to_be_bytes());
		}
		out.extend_from_slice(&strings);
		out.extend_from_slice(&self.tail);
		out
	}
}

/// The single-root image used throughout the tests: eight zeroed data bytes
/// and one root node `(0, "Root")`, `0x35` bytes in total.
pub fn minimal_root_image() -> Vec<u8> {
	DatBuilder::new(8).root(0, "Root").build()
}

/// A small model hierarchy: one joint with a child joint and a display
/// object chain ending in a material, texture, and image header.
///
/// Layout (data-relative):
///
/// - `0x000` root joint (`0x40`), child -> `0x040`, dobj -> `0x080`
/// - `0x040` child joint (`0x40`)
/// - `0x080` display object (`0x10` + pad), mobj -> `0x0A0`
/// - `0x0A0` material (`0x18` + pad), tobj -> `0x0C0`
/// - `0x0C0` texture (`0x5C` + pad), image -> `0x120`
/// - `0x120` image header (`0x18` + pad), data -> `0x140`
/// - `0x140` image data (`0x40`)
pub fn model_builder() -> DatBuilder {
	DatBuilder::new(0x180)
		.u32_at(0x004, 0x0000_0008)
		.pointer(0x008, 0x040)
		.pointer(0x010, 0x080)
		.f32_at(0x020, 1.0)
		.f32_at(0x024, 1.0)
		.f32_at(0x028, 1.0)
		.f32_at(0x060, 1.0)
		.f32_at(0x064, 1.0)
		.f32_at(0x068, 1.0)
		.f32_at(0x070, 2.5)
		.pointer(0x088, 0x0A0)
		.u32_at(0x0A4, 0x0000_0011)
		.pointer(0x0A8, 0x0C0)
		.u32_at(0x0C8, 0x0000_0001)
		.f32_at(0x0DC, 1.0)
		.f32_at(0x0E0, 1.0)
		.f32_at(0x0E4, 1.0)
		.u32_at(0x0F4, 0x0000_0001)
		.u32_at(0x0F8, 0x0000_0001)
		.pointer(0x10C, 0x120)
		.pointer(0x120, 0x140)
		.u16_at(0x124, 8)
		.u16_at(0x126, 8)
		.u32_at(0x128, 0x0000_0001)
		.root(0x000, "model_joint")
}
