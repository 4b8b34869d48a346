use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use hsdraw::dat::{Blob, ByteSource, LoadOptions, Result};

/// Byte source backed by a file on disk.
pub(crate) struct FileSource {
	path: PathBuf,
}

impl FileSource {
	pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl ByteSource for FileSource {
	fn read_all(&self) -> Result<Vec<u8>> {
		Ok(std::fs::read(&self.path)?)
	}

	fn read_range(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
		let mut file = File::open(&self.path)?;
		file.seek(SeekFrom::Start(offset))?;
		let mut out = vec![0_u8; len];
		file.read_exact(&mut out)?;
		Ok(out)
	}

	fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
		Ok(std::fs::write(&self.path, bytes)?)
	}
}

/// Load `path` read-only; inspection commands never write back.
pub(crate) fn open_blob(path: &Path, max_file_size: Option<u32>) -> Result<Blob> {
	let mut options = LoadOptions {
		read_only: true,
		..LoadOptions::default()
	};
	if let Some(limit) = max_file_size {
		options.max_file_size = limit;
	}
	Blob::load(&FileSource::new(path), &options)
}
