use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Temporary directory holding one written image.
pub struct Image {
	_dir: TempDir,
	pub path: PathBuf,
}

impl Image {
	pub fn arg(&self) -> String {
		self.path.to_string_lossy().into_owned()
	}
}

pub fn write_image(bytes: &[u8]) -> Image {
	let dir = tempfile::tempdir().expect("temp dir is created");
	let path = dir.path().join("image.dat");
	std::fs::write(&path, bytes).expect("image is written");
	Image { _dir: dir, path }
}

pub fn run_hsdraw(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_hsdraw")).args(args).output().expect("hsdraw command executes")
}

pub fn run_hsdraw_json(args: &[&str]) -> serde_json::Value {
	let output = run_hsdraw(args);
	assert!(
		output.status.success(),
		"hsdraw command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("stdout should be valid json")
}
