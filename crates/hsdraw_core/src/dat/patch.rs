use tracing::{debug, info};

use crate::dat::resolver::CacheEntry;
use crate::dat::{Blob, DatError, Result};

impl Blob {
	/// Overwrite data bytes in place and log `description`.
	///
	/// Cached structures overlapping the write get fresh raw bytes and, unless
	/// opaque, re-decoded fields. Descriptions already in the log are not repeated.
	pub fn patch(&mut self, offset: u32, bytes: &[u8], description: &str) -> Result<()> {
		self.ensure_writable()?;
		let start = offset as usize;
		let end = start.checked_add(bytes.len()).filter(|end| *end <= self.data.len()).ok_or(DatError::OffsetOutOfRange {
			offset: i64::from(offset),
			len: bytes.len() as u64,
			region: "data",
			limit: self.data.len() as u64,
		})?;
		self.data[start..end].copy_from_slice(bytes);

		let range = offset..end as u32;
		if self.relocations.resync_values(&self.data, range.clone()) {
			debug!(offset, "patch rewrote pointer targets");
			self.rebuild_structure_index();
			self.refresh_extents()?;
		}

		let stale: Vec<(i64, u32)> = self
			.cache
			.entries
			.values()
			.filter_map(|entry| match entry {
				CacheEntry::Resolved(item) => Some((item.offset(), item.length())),
				CacheEntry::Hint(_) => None,
			})
			.filter(|(start, length)| *start < i64::from(range.end) && start + i64::from(*length) > i64::from(range.start))
			.collect();
		for (start, length) in stale {
			let raw = self.region_bytes(start, length)?;
			if let Some(CacheEntry::Resolved(item)) = self.cache.entries.get_mut(&start) {
				item.refresh(raw, &self.relocations);
			}
		}

		let owner = self.structure_index.owner_of(i64::from(offset));
		info!(offset, len = bytes.len(), owner, description, "patched bytes");
		self.record_change(description);
		Ok(())
	}
}
