use std::path::PathBuf;

use hsdraw::dat::{Node, NodeRole, Result, StructureKind, classify_node};

use crate::cmd::source::open_blob;
use crate::cmd::util::{emit_json, offset_hex};

#[derive(clap::Args)]
pub struct Args {
	pub path: PathBuf,
	/// Only list struct nodes.
	#[arg(long = "structs-only")]
	pub structs_only: bool,
	#[arg(long)]
	pub json: bool,
}

/// List root and reference nodes with their struct/label role.
pub fn run(args: Args) -> Result<()> {
	let Args { path, structs_only, json } = args;

	let blob = open_blob(&path, None)?;
	let targets = blob.relocations().targets();
	let rows: Vec<(&Node, NodeRole)> = blob
		.nodes()
		.map(|node| (node, classify_node(node, &targets)))
		.filter(|(_, role)| !structs_only || *role == NodeRole::Struct)
		.collect();

	if json {
		let payload = NodesJson {
			path: path.display().to_string(),
			nodes: rows
				.iter()
				.map(|(node, role)| NodeJson {
					table: node.table.as_str(),
					offset: offset_hex(i64::from(node.struct_offset)),
					label: node.label.to_string(),
					role: role_label(*role),
					root_kind: StructureKind::from_root_label(&node.label).map(StructureKind::as_str),
				})
				.collect(),
		};
		emit_json(&payload);
		return Ok(());
	}

	println!("path: {}", path.display());
	println!("nodes: {}", rows.len());
	println!();
	println!("table\toffset\trole\tlabel");
	for (node, role) in &rows {
		println!("{}\t{}\t{}\t{}", node.table.as_str(), offset_hex(i64::from(node.struct_offset)), role_label(*role), node.label);
	}

	Ok(())
}

fn role_label(role: NodeRole) -> &'static str {
	match role {
		NodeRole::Struct => "struct",
		NodeRole::Label => "label",
	}
}

#[derive(serde::Serialize)]
struct NodeJson {
	table: &'static str,
	offset: String,
	label: String,
	role: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	root_kind: Option<&'static str>,
}

#[derive(serde::Serialize)]
struct NodesJson {
	path: String,
	nodes: Vec<NodeJson>,
}
