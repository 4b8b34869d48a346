#![allow(missing_docs)]

mod support;

use hsdraw_testkit::{DatBuilder, minimal_root_image, model_builder};

use support::{run_hsdraw, run_hsdraw_json, write_image};

#[test]
fn info_json_reports_section_boundaries() {
	let image = write_image(&minimal_root_image());
	let json = run_hsdraw_json(&["info", &image.arg(), "--json"]);

	assert_eq!(json["file_size"], 0x35);
	assert_eq!(json["root_count"], 1);
	assert_eq!(json["relocation_count"], 0);
	assert_eq!(json["struct_nodes"], 1);
	assert_eq!(json["sections"]["data_end"], "0x8");
	assert_eq!(json["sections"]["string_table_start"], "0x10");
	assert_eq!(json["structure_offsets"], 4);
}

#[test]
fn nodes_json_marks_labels() {
	let bytes = DatBuilder::new(0x40).pointer(0x00, 0x20).root(0x00, "scene_joint").reference(0x20, "shared_block").build();
	let image = write_image(&bytes);
	let json = run_hsdraw_json(&["nodes", &image.arg(), "--json"]);

	let nodes = json["nodes"].as_array().expect("nodes array");
	assert_eq!(nodes.len(), 2);
	assert_eq!(nodes[0]["role"], "struct");
	assert_eq!(nodes[0]["root_kind"], "joint");
	assert_eq!(nodes[1]["table"], "reference");
	assert_eq!(nodes[1]["role"], "label");

	let json = run_hsdraw_json(&["nodes", &image.arg(), "--structs-only", "--json"]);
	assert_eq!(json["nodes"].as_array().map(Vec::len), Some(1));
}

#[test]
fn structs_json_lists_typed_hierarchy() {
	let image = write_image(&model_builder().build());
	let json = run_hsdraw_json(&["structs", &image.arg(), "--fields", "--json"]);

	assert_eq!(json["orphans"], 0);
	assert!(json["truncated"].is_null());
	let structures = json["structures"].as_array().expect("structures array");
	let kind_at = |offset: &str| {
		structures
			.iter()
			.find(|item| item["offset"] == offset)
			.and_then(|item| item["kind"].as_str())
			.map(str::to_owned)
	};
	assert_eq!(kind_at("0x0").as_deref(), Some("joint"));
	assert_eq!(kind_at("0xc0").as_deref(), Some("texture"));
	assert_eq!(kind_at("0x120").as_deref(), Some("image_header"));
	assert!(structures.iter().all(|item| item["fields"].is_array()));
}

#[test]
fn structs_depth_limit_reports_truncation() {
	let image = write_image(&model_builder().build());
	let json = run_hsdraw_json(&["structs", &image.arg(), "--max-depth", "1", "--json"]);
	assert_eq!(json["truncated"], "max_depth");
}

#[test]
fn orphans_json_lists_unreached_targets() {
	let bytes = DatBuilder::new(0x40).pointer(0x04, 0x10).root(0x20, "scene_data").build();
	let image = write_image(&bytes);
	let json = run_hsdraw_json(&["orphans", &image.arg(), "--json"]);

	let orphans = json["orphans"].as_array().expect("orphans array");
	assert_eq!(orphans.len(), 1);
	assert_eq!(orphans[0]["offset"], "0x10");
}

#[test]
fn check_accepts_well_formed_images() {
	let image = write_image(&model_builder().tail(b"trailing").build());
	let json = run_hsdraw_json(&["check", &image.arg(), "--json"]);
	assert_eq!(json["round_trip"], true);
	assert!(json["first_difference"].is_null());
}

#[test]
fn malformed_image_fails_with_error_message() {
	let mut bytes = minimal_root_image();
	bytes.pop();
	let image = write_image(&bytes);
	let output = run_hsdraw(&["info", &image.arg()]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.starts_with("error: "), "unexpected stderr: {stderr}");
}
