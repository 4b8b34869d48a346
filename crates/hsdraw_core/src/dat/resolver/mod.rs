use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::str::FromStr;

use tracing::{debug, trace, warn};

use crate::dat::value::{FieldValue, Value};
use crate::dat::{Blob, DatError, DatHeader, Pointer, RelocationIndex, Result, StructureKind};

/// A resolved structure: raw bytes, decoded fields, and inbound links.
#[derive(Debug, Clone)]
pub struct Structure {
	offset: i64,
	length: u32,
	kind: StructureKind,
	raw: Vec<u8>,
	fields: Vec<FieldValue>,
	parents: BTreeSet<i64>,
}

impl Structure {
	/// Data-relative start offset.
	pub fn offset(&self) -> i64 {
		self.offset
	}

	/// Inferred byte length.
	pub fn length(&self) -> u32 {
		self.length
	}

	/// Resolved kind.
	pub fn kind(&self) -> StructureKind {
		self.kind
	}

	/// Whether this is the untyped fallback.
	pub fn is_opaque(&self) -> bool {
		self.kind.is_opaque()
	}

	/// Raw bytes covering the inferred length.
	pub fn raw(&self) -> &[u8] {
		&self.raw
	}

	/// Decoded fields in layout order; empty when opaque.
	pub fn fields(&self) -> &[FieldValue] {
		&self.fields
	}

	/// Decoded value of a named field.
	pub fn field(&self, name: &str) -> Option<Value> {
		self.fields.iter().find(|item| item.name == name).map(|item| item.value)
	}

	/// Offsets of structures or table regions known to point here.
	///
	/// Bookkeeping only; parents do not own their children.
	pub fn parents(&self) -> &BTreeSet<i64> {
		&self.parents
	}

	/// Short-lived handle valid until the next resize.
	pub fn handle(&self, generation: u64) -> StructureHandle {
		StructureHandle {
			offset: self.offset,
			kind: self.kind,
			length: self.length,
			generation,
		}
	}

	pub(crate) fn refresh(&mut self, raw: Vec<u8>, relocations: &RelocationIndex) {
		if !self.kind.is_opaque() {
			if let Ok(offset) = u32::try_from(self.offset) {
				self.fields = self.kind.decode_fields(&raw, offset, relocations);
			}
		}
		self.raw = raw;
	}
}

/// Re-derivable reference to a resolved structure.
///
/// Any resize invalidates outstanding handles; look the structure up again by
/// offset afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructureHandle {
	/// Data-relative start offset.
	pub offset: i64,
	/// Resolved kind.
	pub kind: StructureKind,
	/// Inferred byte length.
	pub length: u32,
	/// Blob generation the handle was issued in.
	pub generation: u64,
}

#[derive(Debug, Clone)]
pub(crate) enum CacheEntry {
	Resolved(Structure),
	Hint(StructureKind),
}

/// Offset-keyed structure cache plus orphan bookkeeping. Dropped wholesale on resize.
#[derive(Debug, Clone, Default)]
pub(crate) struct StructureCache {
	pub(crate) entries: HashMap<i64, CacheEntry>,
	pub(crate) orphans: BTreeSet<i64>,
	pub(crate) expanded: bool,
}

/// Limits for the top-down walk from root and reference nodes.
#[derive(Debug, Clone)]
pub struct ExpandOptions {
	/// Maximum pointer hops from an entry node.
	pub max_depth: u32,
	/// Maximum number of distinct structures visited.
	pub max_structures: usize,
}

impl Default for ExpandOptions {
	fn default() -> Self {
		Self {
			max_depth: 256,
			max_structures: 1 << 20,
		}
	}
}

impl ExpandOptions {
	/// No depth or structure ceiling; the walk runs until the graph is exhausted.
	pub fn unbounded() -> Self {
		Self {
			max_depth: u32::MAX,
			max_structures: usize::MAX,
		}
	}
}

/// Reason a walk stopped before exhausting the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandTruncation {
	/// Depth ceiling reached.
	MaxDepth,
	/// Structure budget reached.
	MaxStructures,
}

/// Outcome of [`Blob::expand_from_roots`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandSummary {
	/// Distinct structures reached.
	pub visited: usize,
	/// Data-section structures never reached.
	pub orphans: usize,
	/// Set when limits cut the walk short; orphans are then not finalized.
	pub truncated: Option<ExpandTruncation>,
}

impl Blob {
	/// Resolve the structure at `offset`, building and caching it if needed.
	///
	/// Never fails for an offset present in the structure index; offsets
	/// outside the addressable range yield [`DatError::OffsetOutOfRange`].
	pub fn resolve(&mut self, offset: i64) -> Result<StructureHandle> {
		self.resolve_from(offset, None)
	}

	/// Resolve `offset`, recording `parent` as pointing to it.
	pub fn resolve_from(&mut self, offset: i64, parent: Option<i64>) -> Result<StructureHandle> {
		let generation = self.generation;
		if let Some(CacheEntry::Resolved(item)) = self.cache.entries.get_mut(&offset) {
			if let Some(parent) = parent {
				item.parents.insert(parent);
				self.cache.orphans.remove(&offset);
			}
			return Ok(item.handle(generation));
		}

		let hint = match self.cache.entries.get(&offset) {
			Some(CacheEntry::Hint(kind)) => Some(*kind),
			_ => None,
		};

		self.flush();
		let length = self.inferred_length(offset)?;
		let raw = self.region_bytes(offset, length)?;
		let (kind, fields) = self.construct(offset, &raw, hint);

		let mut parents = BTreeSet::new();
		match parent {
			Some(parent) => {
				parents.insert(parent);
			}
			None if (0..self.data.len() as i64).contains(&offset) => {
				self.cache.orphans.insert(offset);
			}
			None => {}
		}

		let structure = Structure {
			offset,
			length,
			kind,
			raw,
			fields,
			parents,
		};
		trace!(offset, kind = kind.as_str(), length, "resolved structure");
		let handle = structure.handle(generation);
		self.cache.entries.insert(offset, CacheEntry::Resolved(structure));
		Ok(handle)
	}

	/// Propose a kind for a not-yet-resolved offset.
	///
	/// Returns `false` when the offset is already resolved.
	pub fn hint(&mut self, offset: i64, kind: StructureKind) -> bool {
		if matches!(self.cache.entries.get(&offset), Some(CacheEntry::Resolved(_))) {
			return false;
		}
		self.cache.entries.insert(offset, CacheEntry::Hint(kind));
		true
	}

	/// Propose a kind by name; unknown names are ignored.
	pub fn hint_by_name(&mut self, offset: i64, name: &str) -> bool {
		match StructureKind::from_str(name) {
			Ok(kind) => self.hint(offset, kind),
			Err(_) => {
				warn!(offset, name, "ignoring hint for unknown structure kind");
				false
			}
		}
	}

	/// Pending hint for an unresolved offset.
	pub fn hint_at(&self, offset: i64) -> Option<StructureKind> {
		match self.cache.entries.get(&offset) {
			Some(CacheEntry::Hint(kind)) => Some(*kind),
			_ => None,
		}
	}

	/// Look up a resolved structure by handle, rejecting stale handles.
	pub fn structure(&self, handle: &StructureHandle) -> Result<&Structure> {
		if handle.generation != self.generation {
			return Err(DatError::StaleHandle {
				offset: handle.offset,
				handle: handle.generation,
				current: self.generation,
			});
		}
		self.structure_at(handle.offset).ok_or(DatError::StaleHandle {
			offset: handle.offset,
			handle: handle.generation,
			current: self.generation,
		})
	}

	/// Cached structure at `offset`, if already resolved.
	pub fn structure_at(&self, offset: i64) -> Option<&Structure> {
		match self.cache.entries.get(&offset) {
			Some(CacheEntry::Resolved(item)) => Some(item),
			_ => None,
		}
	}

	/// All cached structures, sorted by offset.
	pub fn structures(&self) -> Vec<&Structure> {
		let mut out: Vec<&Structure> = self
			.cache
			.entries
			.values()
			.filter_map(|entry| match entry {
				CacheEntry::Resolved(item) => Some(item),
				CacheEntry::Hint(_) => None,
			})
			.collect();
		out.sort_by_key(|item| item.offset);
		out
	}

	/// Known parents of a resolved structure.
	pub fn parents_of(&self, offset: i64) -> Option<&BTreeSet<i64>> {
		self.structure_at(offset).map(Structure::parents)
	}

	/// Relocated pointers stored inside the structure starting at `offset`.
	pub fn pointers_from(&self, offset: i64) -> Vec<Pointer> {
		let Ok(start) = u32::try_from(offset) else {
			return Vec::new();
		};
		if start as usize >= self.data.len() {
			return Vec::new();
		}
		let length = self.structure_index.length_of(offset).unwrap_or(0);
		self.relocations.pointers_in(start..start.saturating_add(length)).collect()
	}

	/// Orphaned structure offsets, walking from the roots first if needed.
	///
	/// The walk is unbounded, so the set is always final.
	pub fn orphans(&mut self) -> Result<BTreeSet<i64>> {
		if !self.cache.expanded {
			self.expand_from_roots(&ExpandOptions::unbounded())?;
		}
		Ok(self.cache.orphans.clone())
	}

	/// Resolve everything reachable from root and reference struct nodes.
	///
	/// Data-section index entries never reached are recorded as orphans.
	pub fn expand_from_roots(&mut self, options: &ExpandOptions) -> Result<ExpandSummary> {
		let info = self.header_info();
		let entries = self.roots_and_labels();
		let data_end = self.data.len() as i64;

		let mut queue = VecDeque::new();
		for (nodes, table_start) in [
			(&entries.root.structs, info.relocation_table_end),
			(&entries.reference.structs, info.reference_table_start),
		] {
			for node in nodes {
				let offset = i64::from(node.struct_offset);
				if let Some(kind) = StructureKind::from_root_label(&node.label) {
					self.hint(offset, kind);
				}
				queue.push_back((offset, i64::from(table_start), 0_u32));
			}
		}

		let mut visited = HashSet::new();
		let mut truncated = None;
		let mut hit_depth_limit = false;

		while let Some((offset, parent, depth)) = queue.pop_front() {
			if offset < DatHeader::OFFSET || offset >= self.addressable_end() {
				warn!(offset, parent, "pointer target outside file, skipping");
				continue;
			}
			if !visited.contains(&offset) && visited.len() >= options.max_structures {
				truncated = Some(ExpandTruncation::MaxStructures);
				break;
			}

			let handle = self.resolve_from(offset, Some(parent))?;
			if !visited.insert(offset) {
				continue;
			}
			if offset < 0 || offset >= data_end {
				continue;
			}
			let start = offset as u32;
			let children: Vec<Pointer> = self.relocations.pointers_in(start..start.saturating_add(handle.length)).collect();
			if depth >= options.max_depth {
				hit_depth_limit |= !children.is_empty();
				continue;
			}

			for pointer in children {
				let target = i64::from(pointer.target);
				if let Some(kind) = handle.kind.child_hint(pointer.location - start) {
					self.hint(target, kind);
				}
				queue.push_back((target, offset, depth + 1));
			}
		}

		if truncated.is_none() && hit_depth_limit {
			truncated = Some(ExpandTruncation::MaxDepth);
		}

		if truncated.is_none() {
			self.cache.orphans = self
				.structure_index
				.offsets()
				.iter()
				.copied()
				.filter(|entry| (0..data_end).contains(entry) && !visited.contains(entry))
				.collect();
			self.cache.expanded = true;
		}

		let summary = ExpandSummary {
			visited: visited.len(),
			orphans: self.cache.orphans.len(),
			truncated,
		};
		debug!(?summary, "expanded structure graph");
		Ok(summary)
	}

	/// Re-infer lengths of cached structures after the index changed.
	///
	/// Structures whose extent moved get fresh raw bytes; the orphan set is
	/// marked stale so the next query walks again.
	pub(crate) fn refresh_extents(&mut self) -> Result<()> {
		self.flush();
		let cached: Vec<(i64, u32)> = self
			.cache
			.entries
			.values()
			.filter_map(|entry| match entry {
				CacheEntry::Resolved(item) => Some((item.offset, item.length)),
				CacheEntry::Hint(_) => None,
			})
			.collect();
		for (offset, length) in cached {
			let current = self.inferred_length(offset)?;
			if current == length {
				continue;
			}
			let raw = self.region_bytes(offset, current)?;
			if let Some(CacheEntry::Resolved(item)) = self.cache.entries.get_mut(&offset) {
				item.length = current;
				item.refresh(raw, &self.relocations);
			}
			trace!(offset, length, current, "structure extent changed");
		}
		self.cache.expanded = false;
		Ok(())
	}

	fn inferred_length(&self, offset: i64) -> Result<u32> {
		let end = self.addressable_end();
		if offset < DatHeader::OFFSET || offset >= end {
			return Err(DatError::OffsetOutOfRange {
				offset,
				len: 0,
				region: "file",
				limit: end.max(0) as u64,
			});
		}
		let length = match self.structure_index.length_of(offset) {
			Some(length) => length,
			None => (end - offset) as u32,
		};
		Ok(length)
	}

	/// Pick a kind: a validating hint first, then the priority list, then `Opaque`.
	fn construct(&self, offset: i64, raw: &[u8], hint: Option<StructureKind>) -> (StructureKind, Vec<FieldValue>) {
		let in_data = offset >= 0 && (offset as usize) < self.data.len();
		if !in_data {
			return (StructureKind::Opaque, Vec::new());
		}
		let offset = offset as u32;

		if let Some(kind) = hint {
			if let Some(fields) = kind.validate(raw, offset, &self.relocations) {
				return (kind, fields);
			}
			trace!(offset, hint = kind.as_str(), "hinted kind failed validation");
		}

		for kind in StructureKind::PRIORITY {
			if let Some(fields) = kind.validate(raw, offset, &self.relocations) {
				return (kind, fields);
			}
		}
		(StructureKind::Opaque, Vec::new())
	}
}
