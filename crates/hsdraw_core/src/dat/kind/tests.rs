use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::dat::{RelocationIndex, StructureKind, Value};

fn relocations(pairs: &[(u32, u32)]) -> RelocationIndex {
	RelocationIndex::from_parts(pairs.iter().map(|item| item.0).collect(), pairs.iter().map(|item| item.1).collect())
}

fn image_header_bytes() -> Vec<u8> {
	let mut raw = vec![0_u8; 0x20];
	raw[0x00..0x04].copy_from_slice(&0x200_u32.to_be_bytes());
	raw[0x04..0x06].copy_from_slice(&64_u16.to_be_bytes());
	raw[0x06..0x08].copy_from_slice(&32_u16.to_be_bytes());
	raw[0x08..0x0C].copy_from_slice(&14_u32.to_be_bytes());
	raw
}

#[test]
fn names_parse_case_insensitively() {
	assert_eq!(StructureKind::from_str("JObj").expect("alias parses"), StructureKind::Joint);
	assert_eq!(StructureKind::from_str("image_header").expect("name parses"), StructureKind::ImageHeader);
	assert_eq!(StructureKind::from_str("TLUT").expect("alias parses"), StructureKind::PaletteHeader);
	assert!(StructureKind::from_str("camera").is_err());
	assert_eq!(StructureKind::Material.to_string(), "material");
	assert_eq!(StructureKind::DisplayObject.as_str(), "display_object");
}

#[test]
fn priority_covers_every_typed_kind_once() {
	let typed: Vec<StructureKind> = StructureKind::iter().filter(|kind| !kind.is_opaque()).collect();
	assert_eq!(StructureKind::PRIORITY.len(), typed.len());
	for kind in typed {
		assert!(StructureKind::PRIORITY.contains(&kind), "{kind} missing from priority list");
	}
}

#[test]
fn layouts_fit_declared_sizes() {
	for kind in StructureKind::iter() {
		for def in kind.fields() {
			assert!(def.offset < kind.size(), "{kind}.{} outside record", def.name);
		}
	}
}

#[test]
fn child_hints_follow_pointer_fields() {
	assert_eq!(StructureKind::Joint.child_hint(0x08), Some(StructureKind::Joint));
	assert_eq!(StructureKind::Joint.child_hint(0x10), Some(StructureKind::DisplayObject));
	assert_eq!(StructureKind::Texture.child_hint(0x4C), Some(StructureKind::ImageHeader));
	assert_eq!(StructureKind::Joint.child_hint(0x04), None);
	assert_eq!(StructureKind::Opaque.child_hint(0), None);
}

#[test]
fn root_label_suffix_hints_joint() {
	assert_eq!(StructureKind::from_root_label("PlyFox5K_Share_joint"), Some(StructureKind::Joint));
	assert_eq!(StructureKind::from_root_label("PlyFox5K_Share_matanim_joint"), None);
	assert_eq!(StructureKind::from_root_label("scene_data"), None);
}

#[test]
fn image_header_validates_with_relocated_data_pointer() {
	let raw = image_header_bytes();
	let fields = StructureKind::ImageHeader
		.validate(&raw, 0x100, &relocations(&[(0x100, 0x200)]))
		.expect("image header validates");

	let width = fields.iter().find(|item| item.name == "width").expect("width decoded");
	assert_eq!(width.value, Value::U16(64));
	let data = fields.iter().find(|item| item.name == "image_data").expect("data decoded");
	assert_eq!(data.value.as_ptr(), Some(0x200));
}

#[test]
fn unrelocated_nonzero_pointer_field_fails() {
	let raw = image_header_bytes();
	assert!(StructureKind::ImageHeader.validate(&raw, 0x100, &relocations(&[])).is_none());
}

#[test]
fn relocated_scalar_slot_fails() {
	let raw = image_header_bytes();
	let index = relocations(&[(0x100, 0x200), (0x108, 0x0)]);
	assert!(StructureKind::ImageHeader.validate(&raw, 0x100, &index).is_none());
}

#[test]
fn zeroed_block_only_validates_as_opaque() {
	let raw = vec![0_u8; 0x40];
	let index = relocations(&[]);
	for kind in StructureKind::PRIORITY {
		assert!(kind.validate(&raw, 0, &index).is_none(), "{kind} accepted zeroed block");
	}
	assert_eq!(StructureKind::Opaque.validate(&raw, 0, &index), Some(Vec::new()));
}

#[test]
fn extent_outside_size_window_fails() {
	let mut raw = image_header_bytes();
	raw.resize(0x40, 0);
	assert!(StructureKind::ImageHeader.validate(&raw, 0x100, &relocations(&[(0x100, 0x200)])).is_none());
	assert!(StructureKind::ImageHeader.validate(&raw[..0x10], 0x100, &relocations(&[(0x100, 0x200)])).is_none());
}
