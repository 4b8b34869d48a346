use std::path::PathBuf;

use hsdraw::dat::Result;

use crate::cmd::source::open_blob;
use crate::cmd::util::{emit_json, offset_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	#[arg(long = "max-file-size")]
	pub max_file_size: Option<u32>,
	#[arg(long)]
	pub json: bool,
}

/// Print header fields, section boundaries, and index sizes.
pub fn run(args: Args) -> Result<()> {
	let Args { path, max_file_size, json } = args;

	let blob = open_blob(&path, max_file_size)?;
	let header = blob.header();
	let info = blob.header_info();
	let nodes = blob.roots_and_labels();
	let struct_nodes = nodes.struct_nodes().count();
	let label_nodes = nodes.label_nodes().count();

	if json {
		let payload = InfoJson {
			path: path.display().to_string(),
			file_size: info.file_size,
			magic: header.magic_label(),
			sections: SectionsJson {
				data_end: offset_hex(i64::from(info.relocation_table_start)),
				relocation_table_end: offset_hex(i64::from(info.relocation_table_end)),
				reference_table_start: offset_hex(i64::from(info.reference_table_start)),
				string_table_start: offset_hex(i64::from(info.string_table_start)),
				string_table_len: blob.strings().len(),
				tail_len: blob.tail().len(),
			},
			relocation_count: blob.relocations().len(),
			root_count: info.root_count,
			reference_count: info.reference_count,
			struct_nodes,
			label_nodes,
			structure_offsets: blob.structure_index().len(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("file_size: {}", info.file_size);
	println!("magic: {}", header.magic_label());
	println!("data_end: {}", offset_hex(i64::from(info.relocation_table_start)));
	println!("relocation_table_end: {}", offset_hex(i64::from(info.relocation_table_end)));
	println!("reference_table_start: {}", offset_hex(i64::from(info.reference_table_start)));
	println!("string_table_start: {}", offset_hex(i64::from(info.string_table_start)));
	println!("string_table_len: {}", blob.strings().len());
	println!("tail_len: {}", blob.tail().len());
	println!("relocation_count: {}", blob.relocations().len());
	println!("root_count: {}", info.root_count);
	println!("reference_count: {}", info.reference_count);
	println!("struct_nodes: {struct_nodes}");
	println!("label_nodes: {label_nodes}");
	println!("structure_offsets: {}", blob.structure_index().len());

	Ok(())
}

#[derive(serde::Serialize)]
struct SectionsJson {
	data_end: String,
	relocation_table_end: String,
	reference_table_start: String,
	string_table_start: String,
	string_table_len: usize,
	tail_len: usize,
}

#[derive(serde::Serialize)]
struct InfoJson {
	path: String,
	file_size: u32,
	magic: String,
	sections: SectionsJson,
	relocation_count: usize,
	root_count: u32,
	reference_count: u32,
	struct_nodes: usize,
	label_nodes: usize,
	structure_offsets: usize,
}
