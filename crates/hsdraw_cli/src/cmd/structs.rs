use std::path::PathBuf;

use hsdraw::dat::{ExpandOptions, ExpandTruncation, Result, Structure, Value};

use crate::cmd::source::open_blob;
use crate::cmd::util::{emit_json, offset_hex, parse_hint};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Proposed kind for an offset, as `OFFSET=KIND`. Repeatable.
	#[arg(long = "hint", value_parser = parse_hint)]
	pub hints: Vec<(i64, String)>,
	#[arg(long = "max-depth")]
	pub max_depth: Option<u32>,
	#[arg(long = "max-structures")]
	pub max_structures: Option<usize>,
	/// Include decoded fields.
	#[arg(long)]
	pub fields: bool,
	#[arg(long)]
	pub json: bool,
}

/// Walk from the struct nodes and list every resolved structure.
pub fn run(args: Args) -> Result<()> {
	let Args {
		path,
		hints,
		max_depth,
		max_structures,
		fields,
		json,
	} = args;

	let mut blob = open_blob(&path, None)?;
	for (offset, kind) in &hints {
		blob.hint_by_name(*offset, kind);
	}

	let mut options = ExpandOptions::default();
	if let Some(max_depth) = max_depth {
		options.max_depth = max_depth;
	}
	if let Some(max_structures) = max_structures {
		options.max_structures = max_structures;
	}
	let summary = blob.expand_from_roots(&options)?;
	let structures = blob.structures();

	if json {
		let payload = StructsJson {
			path: path.display().to_string(),
			visited: summary.visited,
			orphans: summary.orphans,
			truncated: summary.truncated.map(truncation_label),
			structures: structures.iter().map(|item| structure_json(item, fields)).collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("visited: {}", summary.visited);
	println!("orphans: {}", summary.orphans);
	println!("truncated: {}", summary.truncated.map(truncation_label).unwrap_or("-"));
	println!();
	println!("offset\tkind\tlength\tparents");
	for item in &structures {
		println!("{}\t{}\t0x{:x}\t{}", offset_hex(item.offset()), item.kind(), item.length(), parents_label(item));
		if fields {
			for field in item.fields() {
				println!("  +0x{:02x} {}: {}", field.offset, field.name, render_value(field.value));
			}
		}
	}

	Ok(())
}

fn truncation_label(truncation: ExpandTruncation) -> &'static str {
	match truncation {
		ExpandTruncation::MaxDepth => "max_depth",
		ExpandTruncation::MaxStructures => "max_structures",
	}
}

fn parents_label(item: &Structure) -> String {
	if item.parents().is_empty() {
		return "-".to_owned();
	}
	item.parents().iter().map(|parent| offset_hex(*parent)).collect::<Vec<_>>().join(",")
}

fn render_value(value: Value) -> String {
	match value {
		Value::U8(item) => item.to_string(),
		Value::U16(item) => item.to_string(),
		Value::U32(item) => format!("0x{item:08x}"),
		Value::F32(item) => item.to_string(),
		Value::Ptr(Some(target)) => format!("-> {}", offset_hex(i64::from(target))),
		Value::Ptr(None) => "null".to_owned(),
	}
}

fn structure_json(item: &Structure, fields: bool) -> StructureJson {
	StructureJson {
		offset: offset_hex(item.offset()),
		kind: item.kind().as_str(),
		length: item.length(),
		parents: item.parents().iter().map(|parent| offset_hex(*parent)).collect(),
		fields: fields.then(|| {
			item.fields()
				.iter()
				.map(|field| FieldJson {
					name: field.name,
					offset: field.offset,
					value: render_value(field.value),
				})
				.collect()
		}),
	}
}

#[derive(serde::Serialize)]
struct FieldJson {
	name: &'static str,
	offset: u32,
	value: String,
}

#[derive(serde::Serialize)]
struct StructureJson {
	offset: String,
	kind: &'static str,
	length: u32,
	parents: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	fields: Option<Vec<FieldJson>>,
}

#[derive(serde::Serialize)]
struct StructsJson {
	path: String,
	visited: usize,
	orphans: usize,
	truncated: Option<&'static str>,
	structures: Vec<StructureJson>,
}
