use std::collections::BTreeMap;

use crate::dat::bytes::Cursor;
use crate::dat::{DatError, Result};

/// Decoded node label table keyed by table-relative byte offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
	entries: BTreeMap<u32, Box<str>>,
	len: usize,
}

impl StringTable {
	/// Decode exactly `count` null-terminated ASCII strings from the front of `bytes`.
	///
	/// Bytes after the last terminator are not consumed; see [`StringTable::len`].
	pub fn decode(bytes: &[u8], count: usize) -> Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let mut entries = BTreeMap::new();

		for found in 0..count {
			let offset = cursor.pos() as u32;
			let raw = cursor.read_cstring_bytes().ok_or(DatError::MissingStringTerminator { found, expected: count })?;
			if !raw.iter().all(|byte| byte.is_ascii() && !byte.is_ascii_control()) {
				return Err(DatError::UndecodableString { offset });
			}
			// Checked as ASCII above.
			let text = String::from_utf8_lossy(raw);
			entries.insert(offset, Box::from(text.as_ref()));
		}

		Ok(Self { entries, len: cursor.pos() })
	}

	/// Lay out `labels` back to back, one terminator each.
	///
	/// Returns the table and the offset assigned to each label, in input order.
	/// Callers pass labels already sorted by structure offset.
	pub fn encode<'a>(labels: impl IntoIterator<Item = &'a str>) -> (Self, Vec<u32>) {
		let mut entries = BTreeMap::new();
		let mut offsets = Vec::new();
		let mut len = 0_usize;

		for label in labels {
			offsets.push(len as u32);
			entries.insert(len as u32, Box::from(label));
			len += label.len() + 1;
		}

		(Self { entries, len }, offsets)
	}

	/// Serialize to raw table bytes.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(self.len);
		for label in self.entries.values() {
			out.extend_from_slice(label.as_bytes());
			out.push(0);
		}
		out
	}

	/// Look up the string starting at a table-relative offset.
	pub fn get(&self, offset: u32) -> Option<&str> {
		self.entries.get(&offset).map(AsRef::as_ref)
	}

	/// Offset-to-string mapping.
	pub fn entries(&self) -> &BTreeMap<u32, Box<str>> {
		&self.entries
	}

	/// Encoded byte length: string bytes plus one terminator per string.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Whether the table holds no strings.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Whether `label` can be stored as a node label.
pub(crate) fn is_valid_label(label: &str) -> bool {
	label.bytes().all(|byte| byte.is_ascii() && !byte.is_ascii_control())
}
