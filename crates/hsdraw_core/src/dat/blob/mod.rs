use tracing::debug;

use crate::dat::nodes::encode_node_table;
use crate::dat::resolver::StructureCache;
use crate::dat::strings::is_valid_label;
use crate::dat::{
	ByteSource, DatError, DatHeader, HeaderInfo, Node, NodeTable, Pointer, RelocationIndex, Result, RootsAndLabels, Sections, StringTable,
	StructureIndex, parse_node_table, partition_nodes,
};

/// Parse-time limits and access mode.
#[derive(Debug, Clone)]
pub struct LoadOptions {
	/// Reject every mutation with [`DatError::ReadOnly`].
	pub read_only: bool,
	/// Upper bound on the header `fileSize` field.
	pub max_file_size: u32,
	/// Upper bound on the header relocation entry count.
	pub max_relocation_entries: u32,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			read_only: false,
			max_file_size: 0x0400_0000,
			max_relocation_entries: 10_000_000,
		}
	}
}

/// Derived regions that must be re-serialized before the next full read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRegions {
	/// Header fields changed.
	pub header: bool,
	/// Relocation entries changed.
	pub relocation_table: bool,
	/// Node entries changed.
	pub node_tables: bool,
	/// Labels or their order changed.
	pub string_table: bool,
}

impl DirtyRegions {
	/// Whether any region needs rebuilding.
	pub fn any(&self) -> bool {
		self.header || self.relocation_table || self.node_tables || self.string_table
	}
}

/// One in-memory `.dat` image and everything derived from it.
///
/// Offsets are data-relative: absolute file offset minus [`DatHeader::SIZE`].
pub struct Blob {
	pub(crate) header: DatHeader,
	pub(crate) header_bytes: Vec<u8>,
	pub(crate) data: Vec<u8>,
	pub(crate) relocation_table: Vec<u8>,
	pub(crate) node_table_data: Vec<u8>,
	pub(crate) string_table: Vec<u8>,
	pub(crate) tail: Vec<u8>,
	pub(crate) relocations: RelocationIndex,
	pub(crate) root_nodes: Vec<Node>,
	pub(crate) reference_nodes: Vec<Node>,
	pub(crate) strings: StringTable,
	pub(crate) structure_index: StructureIndex,
	pub(crate) cache: StructureCache,
	pub(crate) dirty: DirtyRegions,
	pub(crate) generation: u64,
	pub(crate) changes: Vec<String>,
	file_size_bias: i64,
	read_only: bool,
}

impl Blob {
	/// Parse a blob from bytes provided by `source`.
	pub fn load(source: &impl ByteSource, options: &LoadOptions) -> Result<Self> {
		let bytes = source.read_all()?;
		Self::from_bytes(&bytes, options)
	}

	/// Parse a blob from a raw image.
	pub fn from_bytes(bytes: &[u8], options: &LoadOptions) -> Result<Self> {
		let sections = Sections::split(bytes, options)?;
		let info = sections.info;

		let relocations = RelocationIndex::build(sections.relocation_table, sections.data)?;
		debug!(pointers = relocations.len(), data_len = sections.data.len(), "relocation index built");

		let root_count = info.root_count as usize;
		let reference_count = info.reference_count as usize;
		let strings = StringTable::decode(sections.rest, root_count + reference_count)?;
		let (string_table, tail) = sections.finish(strings.len());
		debug!(strings = strings.entries().len(), tail_len = tail.len(), "string table decoded");

		let (root_bytes, reference_bytes) = sections.node_tables.split_at(root_count * 8);
		let root_nodes = parse_node_table(root_bytes, root_count, NodeTable::Root, &strings)?;
		let reference_nodes = parse_node_table(reference_bytes, reference_count, NodeTable::Reference, &strings)?;

		let mut blob = Self {
			header: sections.header,
			header_bytes: bytes[..DatHeader::SIZE].to_vec(),
			data: sections.data.to_vec(),
			relocation_table: sections.relocation_table.to_vec(),
			node_table_data: sections.node_tables.to_vec(),
			string_table: string_table.to_vec(),
			tail: tail.to_vec(),
			relocations,
			root_nodes,
			reference_nodes,
			strings,
			structure_index: StructureIndex::build(&info, []),
			cache: StructureCache::default(),
			dirty: DirtyRegions::default(),
			generation: 0,
			changes: Vec::new(),
			file_size_bias: 0,
			read_only: options.read_only,
		};
		blob.file_size_bias = i64::from(info.file_size) - blob.total_len() as i64;
		blob.rebuild_structure_index();
		debug!(
			structures = blob.structure_index.len(),
			roots = blob.root_nodes.len(),
			references = blob.reference_nodes.len(),
			"blob parsed"
		);

		Ok(blob)
	}

	/// Serialize and hand the bytes to `sink`.
	pub fn save(&mut self, sink: &mut impl ByteSource) -> Result<()> {
		let bytes = self.serialize();
		sink.write_all(&bytes)
	}

	/// Rebuild dirty regions and return the full image.
	pub fn serialize(&mut self) -> Vec<u8> {
		self.flush();
		let mut out = Vec::with_capacity(self.total_len());
		out.extend_from_slice(&self.header_bytes);
		out.extend_from_slice(&self.data);
		out.extend_from_slice(&self.relocation_table);
		out.extend_from_slice(&self.node_table_data);
		out.extend_from_slice(&self.string_table);
		out.extend_from_slice(&self.tail);
		out
	}

	/// Re-serialize every dirty derived region.
	pub fn flush(&mut self) {
		if !self.dirty.any() {
			return;
		}

		if self.dirty.relocation_table {
			self.relocation_table = self.relocations.encode();
		}
		if self.dirty.string_table {
			self.string_table = self.strings.to_bytes();
		}
		if self.dirty.node_tables {
			let mut out = Vec::with_capacity((self.root_nodes.len() + self.reference_nodes.len()) * 8);
			encode_node_table(&self.root_nodes, &mut out);
			encode_node_table(&self.reference_nodes, &mut out);
			self.node_table_data = out;
		}
		if self.dirty.header {
			self.header = self.current_header();
			self.header_bytes = self.header.to_bytes().to_vec();
		}

		debug!(dirty = ?self.dirty, "rebuilt derived regions");
		self.dirty = DirtyRegions::default();
	}

	/// Header as it will be serialized, reflecting pending mutations.
	pub fn header(&self) -> DatHeader {
		if self.dirty.any() { self.current_header() } else { self.header }
	}

	/// Current section boundaries.
	pub fn header_info(&self) -> HeaderInfo {
		self.header().info()
	}

	/// Regions awaiting re-serialization.
	pub fn dirty(&self) -> DirtyRegions {
		self.dirty
	}

	/// Whether mutations are rejected.
	pub fn is_read_only(&self) -> bool {
		self.read_only
	}

	/// Resize counter; bumps on every insert or remove.
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Structure region bytes.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Trailing non-standard bytes after the string table.
	pub fn tail(&self) -> &[u8] {
		&self.tail
	}

	/// Data-section relocation index.
	pub fn relocations(&self) -> &RelocationIndex {
		&self.relocations
	}

	/// Sorted structure offset index.
	pub fn structure_index(&self) -> &StructureIndex {
		&self.structure_index
	}

	/// Root node table entries.
	pub fn root_nodes(&self) -> &[Node] {
		&self.root_nodes
	}

	/// Reference node table entries.
	pub fn reference_nodes(&self) -> &[Node] {
		&self.reference_nodes
	}

	/// Root nodes followed by reference nodes.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.root_nodes.iter().chain(self.reference_nodes.iter())
	}

	/// Decoded label table.
	pub fn strings(&self) -> &StringTable {
		&self.strings
	}

	/// Ordered, de-duplicated change descriptions.
	pub fn change_log(&self) -> &[String] {
		&self.changes
	}

	/// Partition both node tables into struct and label nodes.
	pub fn roots_and_labels(&self) -> RootsAndLabels {
		let targets = self.relocations.targets();
		RootsAndLabels {
			root: partition_nodes(&self.root_nodes, &targets),
			reference: partition_nodes(&self.reference_nodes, &targets),
		}
	}

	/// First node carrying `label`, roots first.
	pub fn node_by_label(&self, label: &str) -> Option<&Node> {
		self.nodes().find(|node| node.label.as_ref() == label)
	}

	/// Pointer locations including one synthetic pointer per node entry.
	pub fn pointer_offsets(&self) -> Vec<u32> {
		self.all_pointers().map(|pointer| pointer.location).collect()
	}

	/// Pointer targets, parallel to [`Blob::pointer_offsets`].
	pub fn pointer_values(&self) -> Vec<u32> {
		self.all_pointers().map(|pointer| pointer.target).collect()
	}

	/// Pointer targets from the relocation table only.
	pub fn data_pointer_values(&self) -> &[u32] {
		self.relocations.pointer_values()
	}

	/// All pointers, node pointers included, sorted by location.
	pub fn pointers(&self) -> Vec<Pointer> {
		let mut out: Vec<Pointer> = self.all_pointers().collect();
		out.sort();
		out
	}

	/// Replace the label of the first node targeting `struct_offset`.
	pub fn rename_node(&mut self, struct_offset: u32, label: &str) -> Result<()> {
		self.ensure_writable()?;
		if !is_valid_label(label) {
			return Err(DatError::InvalidLabel { label: label.to_owned() });
		}

		let node = self
			.root_nodes
			.iter_mut()
			.chain(self.reference_nodes.iter_mut())
			.find(|node| node.struct_offset == struct_offset)
			.ok_or(DatError::UnknownNode { offset: struct_offset })?;
		let previous = std::mem::replace(&mut node.label, Box::from(label));

		self.refresh_strings();
		self.dirty.string_table = true;
		self.dirty.node_tables = true;
		self.dirty.header = true;
		self.record_change(&format!("Renamed node 0x{struct_offset:x} from {previous:?} to {label:?}"));
		Ok(())
	}

	/// Read `len` bytes at a data-relative offset, across region boundaries.
	pub fn read_range(&mut self, offset: i64, len: u32) -> Result<Vec<u8>> {
		self.flush();
		self.region_bytes(offset, len)
	}

	/// Absolute file offset of a data-relative offset.
	pub fn file_offset_of(offset: i64) -> i64 {
		offset + DatHeader::SIZE as i64
	}

	/// Data-relative offset of an absolute file offset.
	pub fn data_offset_of(file_offset: u64) -> i64 {
		file_offset as i64 - DatHeader::SIZE as i64
	}

	/// Exclusive end of the data-relative address space.
	pub fn addressable_end(&self) -> i64 {
		self.total_len() as i64 - DatHeader::SIZE as i64
	}

	pub(crate) fn ensure_writable(&self) -> Result<()> {
		if self.read_only { Err(DatError::ReadOnly) } else { Ok(()) }
	}

	pub(crate) fn record_change(&mut self, description: &str) {
		if !self.changes.iter().any(|item| item == description) {
			self.changes.push(description.to_owned());
		}
	}

	/// Recompute label offsets in ascending structure-offset order.
	pub(crate) fn refresh_strings(&mut self) {
		let labels: Vec<Box<str>> = self.nodes().map(|node| node.label.clone()).collect();
		let mut order: Vec<(u32, usize)> = self.nodes().enumerate().map(|(idx, node)| (node.struct_offset, idx)).collect();
		order.sort();

		let (table, offsets) = StringTable::encode(order.iter().map(|(_, idx)| labels[*idx].as_ref()));

		let root_len = self.root_nodes.len();
		for ((_, idx), string_offset) in order.iter().zip(offsets) {
			let node = if *idx < root_len {
				&mut self.root_nodes[*idx]
			} else {
				&mut self.reference_nodes[*idx - root_len]
			};
			node.string_offset = string_offset;
		}
		self.strings = table;
	}

	pub(crate) fn rebuild_structure_index(&mut self) {
		let info = self.header_info();
		let targets: Vec<u32> = self
			.relocations
			.pointer_values()
			.iter()
			.copied()
			.chain(self.nodes().map(|node| node.struct_offset))
			.collect();
		self.structure_index = StructureIndex::build(&info, targets);
	}

	/// Copy bytes out of the current region buffers; callers flush first.
	pub(crate) fn region_bytes(&self, offset: i64, len: u32) -> Result<Vec<u8>> {
		let end = offset + i64::from(len);
		if offset < DatHeader::OFFSET || end > self.addressable_end() {
			return Err(DatError::OffsetOutOfRange {
				offset,
				len: u64::from(len),
				region: "file",
				limit: self.addressable_end().max(0) as u64,
			});
		}

		let mut out = Vec::with_capacity(len as usize);
		let mut region_start = DatHeader::OFFSET;
		for region in self.regions() {
			let region_end = region_start + region.len() as i64;
			let lo = offset.max(region_start);
			let hi = end.min(region_end);
			if lo < hi {
				out.extend_from_slice(&region[(lo - region_start) as usize..(hi - region_start) as usize]);
			}
			region_start = region_end;
		}
		Ok(out)
	}

	fn regions(&self) -> [&[u8]; 6] {
		[
			&self.header_bytes,
			&self.data,
			&self.relocation_table,
			&self.node_table_data,
			&self.string_table,
			&self.tail,
		]
	}

	fn all_pointers(&self) -> impl Iterator<Item = Pointer> + '_ {
		let info = self.header_info();
		let data = self
			.relocations
			.pointer_offsets()
			.iter()
			.zip(self.relocations.pointer_values())
			.map(|(location, target)| Pointer {
				location: *location,
				target: *target,
			});
		let roots = self.root_nodes.iter().enumerate().map(move |(idx, node)| Pointer {
			location: info.relocation_table_end + 8 * idx as u32,
			target: node.struct_offset,
		});
		let references = self.reference_nodes.iter().enumerate().map(move |(idx, node)| Pointer {
			location: info.reference_table_start + 8 * idx as u32,
			target: node.struct_offset,
		});
		data.chain(roots).chain(references)
	}

	/// Serialized length computed from the in-memory model.
	fn total_len(&self) -> usize {
		DatHeader::SIZE
			+ self.data.len()
			+ self.relocations.len() * 4
			+ (self.root_nodes.len() + self.reference_nodes.len()) * 8
			+ self.strings.len()
			+ self.tail.len()
	}

	fn current_header(&self) -> DatHeader {
		let file_size = (self.total_len() as i64 + self.file_size_bias).clamp(0, i64::from(u32::MAX)) as u32;
		DatHeader {
			file_size,
			relocation_table_start: self.data.len() as u32,
			relocation_count: self.relocations.len() as u32,
			root_count: self.root_nodes.len() as u32,
			reference_count: self.reference_nodes.len() as u32,
			magic: self.header.magic,
			reserved: self.header.reserved,
		}
	}
}
