use crate::dat::{DatError, Result};

/// Byte storage a blob is loaded from and saved to.
///
/// The engine never touches files or discs itself; callers adapt whatever
/// backs their archive to this trait.
pub trait ByteSource {
	/// Read the full image.
	fn read_all(&self) -> Result<Vec<u8>>;

	/// Read `len` bytes starting at absolute `offset`.
	fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>>;

	/// Replace the full image.
	fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

/// In-memory byte source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
	bytes: Vec<u8>,
}

impl MemorySource {
	/// Wrap existing bytes.
	pub fn new(bytes: Vec<u8>) -> Self {
		Self { bytes }
	}

	/// Borrow the stored bytes.
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Take the stored bytes.
	pub fn into_inner(self) -> Vec<u8> {
		self.bytes
	}
}

impl ByteSource for MemorySource {
	fn read_all(&self) -> Result<Vec<u8>> {
		Ok(self.bytes.clone())
	}

	fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
		let at = usize::try_from(offset).unwrap_or(usize::MAX);
		let eof = || DatError::UnexpectedEof {
			at,
			need: len,
			rem: self.bytes.len().saturating_sub(at),
		};
		let end = at.checked_add(len).ok_or_else(eof)?;
		self.bytes.get(at..end).map(<[u8]>::to_vec).ok_or_else(eof)
	}

	fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
		self.bytes.clear();
		self.bytes.extend_from_slice(bytes);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use crate::dat::{ByteSource, DatError, MemorySource};

	#[test]
	fn range_reads_are_bounded() {
		let source = MemorySource::new(vec![1, 2, 3, 4]);
		assert_eq!(source.read_range(1, 2).expect("range in bounds"), vec![2, 3]);
		let err = source.read_range(3, 2).expect_err("range past end should fail");
		assert!(matches!(err, DatError::UnexpectedEof { at: 3, need: 2, rem: 1 }));
	}

	#[test]
	fn write_replaces_contents() {
		let mut source = MemorySource::new(vec![9; 8]);
		source.write_all(&[1, 2]).expect("write succeeds");
		assert_eq!(source.bytes(), &[1, 2]);
	}
}
