use std::path::PathBuf;

use hsdraw::dat::Result;

use crate::cmd::source::open_blob;
use crate::cmd::util::{emit_json, offset_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// List data-section structures no walk from the struct nodes reaches.
pub fn run(args: Args) -> Result<()> {
	let Args { path, json } = args;

	let mut blob = open_blob(&path, None)?;
	let orphans = blob.orphans()?;
	let mut rows = Vec::with_capacity(orphans.len());
	for offset in orphans {
		let handle = blob.resolve(offset)?;
		rows.push(OrphanJson {
			offset: offset_hex(offset),
			kind: handle.kind.as_str(),
			length: handle.length,
		});
	}

	if json {
		emit_json(&OrphansJson {
			path: path.display().to_string(),
			orphans: rows,
		});
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("orphans: {}", rows.len());
	for row in &rows {
		println!("{}\t{}\t0x{:x}", row.offset, row.kind, row.length);
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct OrphanJson {
	offset: String,
	kind: &'static str,
	length: u32,
}

#[derive(serde::Serialize)]
struct OrphansJson {
	path: String,
	orphans: Vec<OrphanJson>,
}
