use std::path::PathBuf;

use hsdraw::dat::{Blob, ByteSource, LoadOptions, Result};
use tracing::warn;

use crate::cmd::source::FileSource;
use crate::cmd::util::{emit_json, offset_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// Re-serialize the image and resolve every indexed offset.
///
/// Returns `false` when the output differs from the input.
pub fn run(args: Args) -> Result<bool> {
	let Args { path, json } = args;

	let bytes = FileSource::new(&path).read_all()?;
	let mut blob = Blob::from_bytes(
		&bytes,
		&LoadOptions {
			read_only: true,
			..LoadOptions::default()
		},
	)?;

	let offsets = blob.structure_index().offsets().to_vec();
	for offset in &offsets {
		blob.resolve(*offset)?;
	}

	let output = blob.serialize();
	let first_difference = bytes.iter().zip(&output).position(|(left, right)| left != right).or_else(|| {
		if bytes.len() == output.len() {
			None
		} else {
			Some(bytes.len().min(output.len()))
		}
	});
	let round_trip = first_difference.is_none();
	if let Some(at) = first_difference {
		warn!(at, input_len = bytes.len(), output_len = output.len(), "serialized image differs from input");
	}

	if json {
		emit_json(&CheckJson {
			path: path.display().to_string(),
			round_trip,
			input_len: bytes.len(),
			output_len: output.len(),
			first_difference: first_difference.map(|at| offset_hex(Blob::data_offset_of(at as u64))),
			structures_resolved: offsets.len(),
		});
		return Ok(round_trip);
	}

	println!("path: {}", path.display());
	println!("round_trip: {}", if round_trip { "ok" } else { "mismatch" });
	println!("input_len: {}", bytes.len());
	println!("output_len: {}", output.len());
	if let Some(at) = first_difference {
		println!("first_difference: {}", offset_hex(Blob::data_offset_of(at as u64)));
	}
	println!("structures_resolved: {}", offsets.len());

	Ok(round_trip)
}

#[derive(serde::Serialize)]
struct CheckJson {
	path: String,
	round_trip: bool,
	input_len: usize,
	output_len: usize,
	first_difference: Option<String>,
	structures_resolved: usize,
}
