use hsdraw_testkit::{DatBuilder, minimal_root_image, model_builder};

use crate::dat::{Blob, DatError, LoadOptions, StructureKind};

fn load(bytes: &[u8]) -> Blob {
	Blob::from_bytes(bytes, &LoadOptions::default()).expect("blob parses")
}

fn assert_pointer_law(blob: &Blob) {
	for pointer in blob.relocations().pointers() {
		let at = pointer.location as usize;
		let stored = u32::from_be_bytes(blob.data()[at..at + 4].try_into().expect("four bytes"));
		assert_eq!(stored, pointer.target, "stale value at 0x{:x}", pointer.location);
	}
}

#[test]
fn remove_shrinks_file_size_by_exact_amount() {
	let bytes = DatBuilder::new(0x40).root(0x20, "scene_data").build();
	let mut blob = load(&bytes);
	let before = blob.header().file_size;
	assert_eq!(blob.structure_index().offsets(), &[-0x20, 0x20, 0x40, 0x48]);

	assert_eq!(blob.remove(0, 0x20).expect("range is removable"), 0x20);
	assert_eq!(blob.header().file_size, before - 0x20);
	assert_eq!(blob.root_nodes()[0].struct_offset, 0);
	assert_eq!(blob.structure_index().offsets(), &[-0x20, 0, 0x20, 0x28]);
	assert_eq!(blob.serialize().len(), bytes.len() - 0x20);
}

#[test]
fn insert_shifts_pointers_and_stored_values() {
	let mut blob = load(&model_builder().build());
	assert_eq!(blob.insert(0x40, 0x10).expect("insert succeeds"), 0x20);

	assert_eq!(blob.data().len(), 0x1A0);
	assert_eq!(blob.relocations().target_at(0x08), Some(0x60));
	assert_eq!(blob.relocations().target_at(0x10), Some(0xA0));
	assert_eq!(blob.relocations().target_at(0xA8), Some(0xC0));
	assert!(!blob.relocations().is_pointer_location(0x88));
	assert!(blob.data()[0x40..0x60].iter().all(|byte| *byte == 0));
	assert_pointer_law(&blob);

	assert_eq!(blob.generation(), 1);
	assert_eq!(blob.header().relocation_table_start, 0x1A0);
	assert_eq!(blob.resolve(0x60).expect("shifted joint resolves").kind, StructureKind::Joint);
}

#[test]
fn insert_at_start_moves_root_nodes() {
	let mut blob = load(&minimal_root_image());
	assert_eq!(blob.insert(0, 1).expect("insert succeeds"), 0x20);
	assert_eq!(blob.root_nodes()[0].struct_offset, 0x20);
	assert_eq!(blob.pointer_values(), vec![0x20]);

	let reloaded = load(&blob.serialize());
	assert_eq!(reloaded.root_nodes()[0].struct_offset, 0x20);
	assert_eq!(reloaded.root_nodes()[0].label.as_ref(), "Root");
}

#[test]
fn insert_then_remove_restores_image() {
	let bytes = model_builder().build();
	let mut blob = load(&bytes);
	blob.insert(0x40, 0x20).expect("insert succeeds");
	blob.remove(0x40, 0x20).expect("remove succeeds");

	assert_eq!(blob.generation(), 2);
	assert_eq!(blob.serialize(), bytes);
}

#[test]
fn rejected_ranges_leave_blob_untouched() {
	let bytes = model_builder().build();
	let mut blob = load(&bytes);

	let errors = [
		blob.insert(2, 0x20).expect_err("misaligned insert"),
		blob.insert(0x200, 0x20).expect_err("insert past data end"),
		blob.insert(0x40, 0).expect_err("empty insert"),
		blob.remove(0, 0x10).expect_err("remove rounds down to nothing"),
		blob.remove(0x20, 0x40).expect_err("remove spans two structures"),
		blob.remove(0x160, 0x40).expect_err("remove past data end"),
	];
	for err in &errors {
		assert!(err.is_invalid_range(), "unexpected error kind: {err}");
	}
	assert!(matches!(errors[0], DatError::MisalignedRange { offset: 2, align: 4 }));
	assert!(matches!(errors[4], DatError::RangeSpansStructures { first: 0, second: 0x40, .. }));
	assert!(matches!(errors[5], DatError::RangeOutsideData { offset: 0x160, len: 0x40, data_len: 0x180 }));

	assert_eq!(blob.generation(), 0);
	assert!(!blob.dirty().any());
	assert_eq!(blob.serialize(), bytes);
}

#[test]
fn pointers_into_removed_range_are_nulled() {
	let mut blob = load(&model_builder().build());
	let before = blob.header().file_size;
	blob.remove(0x140, 0x40).expect("image data is removable");

	assert_eq!(blob.relocations().len(), 5);
	assert!(!blob.relocations().is_pointer_location(0x120));
	assert_eq!(blob.data()[0x120..0x124], [0, 0, 0, 0]);
	assert_pointer_law(&blob);
	// Data bytes plus the dropped relocation entry.
	assert_eq!(blob.header().file_size, before - 0x44);
}

#[test]
fn removing_a_range_drops_pointers_stored_inside_it() {
	let mut blob = load(&model_builder().build());
	blob.remove(0x100, 0x20).expect("texture tail is removable");

	assert_eq!(blob.relocations().len(), 5);
	assert!(!blob.relocations().is_pointer_location(0x10C));
	assert_eq!(blob.relocations().target_at(0xA8), Some(0xC0));
	// Image header slid down into the freed space.
	assert_eq!(blob.relocations().target_at(0x100), Some(0x120));
	assert_eq!(blob.data()[0x104..0x108], [0, 8, 0, 8]);
	assert_pointer_law(&blob);
	assert!(!blob.structure_index().contains(0x100), "nothing points at the image header anymore");
}

#[test]
fn removing_a_node_target_drops_its_label() {
	let bytes = DatBuilder::new(0x40).root(0x00, "keep").root(0x20, "drop_me").build();
	let mut blob = load(&bytes);
	blob.remove(0x20, 0x20).expect("second block is removable");

	assert!(blob.node_by_label("drop_me").is_none());
	assert_eq!(blob.strings().len(), 5);
	assert!(blob.dirty().string_table);

	let reloaded = load(&blob.serialize());
	assert_eq!(reloaded.header().root_count, 1);
	assert_eq!(reloaded.root_nodes()[0].label.as_ref(), "keep");
	assert_eq!(reloaded.header().file_size as usize, bytes.len() - 0x20 - 8 - 8);
}

#[test]
fn resize_invalidates_handles_and_cache() {
	let mut blob = load(&model_builder().build());
	let handle = blob.resolve(0x40).expect("offset resolves");
	blob.insert(0, 0x20).expect("insert succeeds");

	let err = blob.structure(&handle).expect_err("handle predates resize");
	assert!(matches!(err, DatError::StaleHandle { offset: 0x40, handle: 0, current: 1 }));
	assert!(blob.structure_at(0x40).is_none());
	assert!(blob.structures().is_empty());
}

#[test]
fn read_only_blob_rejects_resize() {
	let options = LoadOptions {
		read_only: true,
		..LoadOptions::default()
	};
	let mut blob = Blob::from_bytes(&model_builder().build(), &options).expect("blob parses");
	assert!(matches!(blob.insert(0, 0x20), Err(DatError::ReadOnly)));
	assert!(matches!(blob.remove(0x140, 0x40), Err(DatError::ReadOnly)));
	assert_eq!(blob.generation(), 0);
}
