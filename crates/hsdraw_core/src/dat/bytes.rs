use crate::dat::{DatError, Result};

/// Simple bounded cursor over an immutable big-endian byte slice.
pub struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return current byte offset.
	pub fn pos(&self) -> usize {
		self.pos
	}

	/// Return remaining unread bytes.
	pub fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(DatError::UnexpectedEof {
				at: self.pos,
				need: n,
				rem: self.remaining(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read a four-byte tag.
	pub fn read_code4(&mut self) -> Result<[u8; 4]> {
		let raw = self.read_exact(4)?;
		let mut out = [0_u8; 4];
		out.copy_from_slice(raw);
		Ok(out)
	}

	/// Read a big-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		let raw = self.read_exact(4)?;
		let mut buf = [0_u8; 4];
		buf.copy_from_slice(raw);
		Ok(u32::from_be_bytes(buf))
	}

	/// Read a zero-terminated byte string without the terminator.
	///
	/// Returns `None` when no terminator remains.
	pub fn read_cstring_bytes(&mut self) -> Option<&'a [u8]> {
		let start = self.pos;
		let rem = self.bytes.get(self.pos..)?;
		let rel_end = rem.iter().position(|byte| *byte == 0)?;

		let end = start + rel_end;
		self.pos = end + 1;
		Some(&self.bytes[start..end])
	}
}

/// Read a big-endian `u32` at `at`, if in bounds.
pub(crate) fn read_u32_at(bytes: &[u8], at: usize) -> Option<u32> {
	let raw = bytes.get(at..at.checked_add(4)?)?;
	Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Read a big-endian `u16` at `at`, if in bounds.
pub(crate) fn read_u16_at(bytes: &[u8], at: usize) -> Option<u16> {
	let raw = bytes.get(at..at.checked_add(2)?)?;
	Some(u16::from_be_bytes([raw[0], raw[1]]))
}

/// Overwrite four bytes at `at` with a big-endian `u32`.
///
/// Callers guarantee `at + 4 <= bytes.len()`.
pub(crate) fn write_u32_at(bytes: &mut [u8], at: usize, value: u32) {
	bytes[at..at + 4].copy_from_slice(&value.to_be_bytes());
}

#[cfg(test)]
mod tests {
	use super::{Cursor, read_u16_at, read_u32_at, write_u32_at};

	#[test]
	fn reads_big_endian_words() {
		let mut cursor = Cursor::new(&[0x00, 0x00, 0x01, 0x02, 0xAA]);
		assert_eq!(cursor.read_u32().expect("word reads"), 0x0102);
		assert_eq!(cursor.remaining(), 1);
		assert!(cursor.read_u32().is_err());
	}

	#[test]
	fn cstring_requires_terminator() {
		let mut cursor = Cursor::new(b"ab\0cd");
		assert_eq!(cursor.read_cstring_bytes(), Some(&b"ab"[..]));
		assert_eq!(cursor.pos(), 3);
		assert_eq!(cursor.read_cstring_bytes(), None);
	}

	#[test]
	fn slice_helpers_respect_bounds() {
		let mut bytes = [0_u8; 6];
		write_u32_at(&mut bytes, 2, 0xDEAD_BEEF);
		assert_eq!(read_u32_at(&bytes, 2), Some(0xDEAD_BEEF));
		assert_eq!(read_u16_at(&bytes, 4), Some(0xBEEF));
		assert_eq!(read_u32_at(&bytes, 3), None);
	}
}
