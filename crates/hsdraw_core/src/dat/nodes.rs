use std::collections::HashSet;

use crate::dat::bytes::Cursor;
use crate::dat::{DatError, Result, StringTable};

/// Node table a node was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTable {
	/// Root node table.
	Root,
	/// Reference node table.
	Reference,
}

impl NodeTable {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Root => "root",
			Self::Reference => "reference",
		}
	}
}

/// Named entry point into the structure graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
	/// Source table.
	pub table: NodeTable,
	/// Data-relative structure offset.
	pub struct_offset: u32,
	/// String table offset of the label as last serialized.
	pub string_offset: u32,
	/// Decoded label.
	pub label: Box<str>,
}

/// Whether a node is the sole way into its target or just names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
	/// Nothing else in the data section points at the target.
	Struct,
	/// Some data-section pointer also targets the structure.
	Label,
}

/// Disjoint split of one node table into struct and label nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePartition {
	/// Nodes that are the unique entry point to their target.
	pub structs: Vec<Node>,
	/// Nodes naming a structure reachable through another pointer.
	pub labels: Vec<Node>,
}

/// Classified root and reference nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootsAndLabels {
	/// Root node table partition.
	pub root: NodePartition,
	/// Reference node table partition.
	pub reference: NodePartition,
}

impl RootsAndLabels {
	/// Struct nodes from both tables, roots first.
	pub fn struct_nodes(&self) -> impl Iterator<Item = &Node> {
		self.root.structs.iter().chain(self.reference.structs.iter())
	}

	/// Label nodes from both tables, roots first.
	pub fn label_nodes(&self) -> impl Iterator<Item = &Node> {
		self.root.labels.iter().chain(self.reference.labels.iter())
	}
}

/// Decode `count` `(structOffset, stringOffset)` pairs and attach labels.
pub fn parse_node_table(bytes: &[u8], count: usize, table: NodeTable, strings: &StringTable) -> Result<Vec<Node>> {
	let mut cursor = Cursor::new(bytes);
	let mut out = Vec::with_capacity(count);

	for index in 0..count {
		let struct_offset = cursor.read_u32()?;
		let string_offset = cursor.read_u32()?;
		let label = strings.get(string_offset).ok_or(DatError::UnknownStringOffset {
			table: table.as_str(),
			index,
			string_offset,
		})?;

		out.push(Node {
			table,
			struct_offset,
			string_offset,
			label: Box::from(label),
		});
	}

	Ok(out)
}

/// Serialize nodes as `(structOffset, stringOffset)` pairs.
pub(crate) fn encode_node_table(nodes: &[Node], out: &mut Vec<u8>) {
	for node in nodes {
		out.extend_from_slice(&node.struct_offset.to_be_bytes());
		out.extend_from_slice(&node.string_offset.to_be_bytes());
	}
}

/// Classify one node against the data-section pointer targets.
///
/// Synthetic node pointers must not be part of `data_targets`, or every node
/// would count as pointed-to by itself.
pub fn classify_node(node: &Node, data_targets: &HashSet<u32>) -> NodeRole {
	if data_targets.contains(&node.struct_offset) {
		NodeRole::Label
	} else {
		NodeRole::Struct
	}
}

/// Partition one node table into struct and label nodes.
pub fn partition_nodes(nodes: &[Node], data_targets: &HashSet<u32>) -> NodePartition {
	let mut out = NodePartition::default();
	for node in nodes {
		match classify_node(node, data_targets) {
			NodeRole::Struct => out.structs.push(node.clone()),
			NodeRole::Label => out.labels.push(node.clone()),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use crate::dat::{Node, NodeRole, NodeTable, StringTable, classify_node, parse_node_table, partition_nodes};

	fn node(table: NodeTable, struct_offset: u32, label: &str) -> Node {
		Node {
			table,
			struct_offset,
			string_offset: 0,
			label: label.into(),
		}
	}

	#[test]
	fn parses_pairs_and_labels() {
		let strings = StringTable::decode(b"a\0bb\0", 2).expect("strings decode");
		let mut raw = Vec::new();
		for (offset, string) in [(0x40_u32, 2_u32), (0, 0)] {
			raw.extend_from_slice(&offset.to_be_bytes());
			raw.extend_from_slice(&string.to_be_bytes());
		}

		let nodes = parse_node_table(&raw, 2, NodeTable::Root, &strings).expect("nodes parse");
		assert_eq!(nodes[0].struct_offset, 0x40);
		assert_eq!(nodes[0].label.as_ref(), "bb");
		assert_eq!(nodes[1].label.as_ref(), "a");
	}

	#[test]
	fn unknown_string_offset_fails() {
		let strings = StringTable::decode(b"abc\0", 1).expect("strings decode");
		let mut raw = Vec::new();
		raw.extend_from_slice(&0_u32.to_be_bytes());
		raw.extend_from_slice(&1_u32.to_be_bytes());

		let err = parse_node_table(&raw, 1, NodeTable::Reference, &strings).expect_err("mid-string offset should fail");
		assert!(err.is_format_error());
	}

	#[test]
	fn pointed_to_nodes_are_labels() {
		let targets: HashSet<u32> = [0x20].into_iter().collect();
		assert_eq!(classify_node(&node(NodeTable::Root, 0x20, "x"), &targets), NodeRole::Label);
		assert_eq!(classify_node(&node(NodeTable::Root, 0x40, "y"), &targets), NodeRole::Struct);
	}

	#[test]
	fn partition_is_exhaustive_and_disjoint() {
		let targets: HashSet<u32> = [0x00, 0x60].into_iter().collect();
		let nodes: Vec<Node> = [0x00, 0x20, 0x40, 0x60]
			.into_iter()
			.map(|offset| node(NodeTable::Reference, offset, "n"))
			.collect();

		let partition = partition_nodes(&nodes, &targets);
		assert_eq!(partition.structs.len() + partition.labels.len(), nodes.len());
		for item in &partition.structs {
			assert!(!partition.labels.contains(item));
		}
		assert_eq!(partition.labels.iter().map(|item| item.struct_offset).collect::<Vec<_>>(), vec![0x00, 0x60]);
	}
}
