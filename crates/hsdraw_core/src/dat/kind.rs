use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::dat::bytes::{read_u16_at, read_u32_at};
use crate::dat::value::{FieldValue, Value};
use crate::dat::{ALIGNMENT, RelocationIndex};

/// Closed set of record kinds the resolver can recognize.
///
/// Names parse case-insensitively from either the descriptive name or the
/// HSD class abbreviation (`"joint"`, `"JObj"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum StructureKind {
	/// Skeleton joint (`HSD_JObj`).
	#[strum(to_string = "joint", serialize = "jobj")]
	Joint,
	/// Display object linking materials and polygons (`HSD_DObj`).
	#[strum(to_string = "display_object", serialize = "dobj")]
	DisplayObject,
	/// Polygon object (`HSD_PObj`).
	#[strum(to_string = "polygon_object", serialize = "pobj")]
	PolygonObject,
	/// Material object (`HSD_MObj`).
	#[strum(to_string = "material", serialize = "mobj")]
	Material,
	/// Texture object (`HSD_TObj`).
	#[strum(to_string = "texture", serialize = "tobj")]
	Texture,
	/// Image descriptor (`HSD_ImageDesc`).
	#[strum(to_string = "image_header", serialize = "image")]
	ImageHeader,
	/// Palette descriptor (`HSD_Tlut`).
	#[strum(to_string = "palette_header", serialize = "tlut")]
	PaletteHeader,
	/// Untyped byte block covering the inferred length.
	#[strum(to_string = "opaque")]
	Opaque,
}

/// Storage type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
	/// Unsigned byte.
	U8,
	/// Big-endian `u16`.
	U16,
	/// Big-endian `u32`.
	U32,
	/// Big-endian `f32`.
	F32,
	/// Relocated pointer with the kind its target is expected to be.
	Ptr(Option<StructureKind>),
}

/// One field in a fixed record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
	/// Offset inside the record.
	pub offset: u32,
	/// Field identifier.
	pub name: &'static str,
	/// Storage type.
	pub ty: FieldType,
}

const fn field(offset: u32, name: &'static str, ty: FieldType) -> FieldDef {
	FieldDef { offset, name, ty }
}

use FieldType::{F32, Ptr, U8, U16, U32};

const JOINT: &[FieldDef] = &[
	field(0x00, "name", Ptr(None)),
	field(0x04, "flags", U32),
	field(0x08, "child", Ptr(Some(StructureKind::Joint))),
	field(0x0C, "next", Ptr(Some(StructureKind::Joint))),
	field(0x10, "dobj", Ptr(Some(StructureKind::DisplayObject))),
	field(0x14, "rotation_x", F32),
	field(0x18, "rotation_y", F32),
	field(0x1C, "rotation_z", F32),
	field(0x20, "scale_x", F32),
	field(0x24, "scale_y", F32),
	field(0x28, "scale_z", F32),
	field(0x2C, "translation_x", F32),
	field(0x30, "translation_y", F32),
	field(0x34, "translation_z", F32),
	field(0x38, "inverse_world", Ptr(None)),
	field(0x3C, "robj", Ptr(None)),
];

const DISPLAY_OBJECT: &[FieldDef] = &[
	field(0x00, "name", Ptr(None)),
	field(0x04, "next", Ptr(Some(StructureKind::DisplayObject))),
	field(0x08, "mobj", Ptr(Some(StructureKind::Material))),
	field(0x0C, "pobj", Ptr(Some(StructureKind::PolygonObject))),
];

const POLYGON_OBJECT: &[FieldDef] = &[
	field(0x00, "name", Ptr(None)),
	field(0x04, "next", Ptr(Some(StructureKind::PolygonObject))),
	field(0x08, "vertex_attributes", Ptr(None)),
	field(0x0C, "flags", U16),
	field(0x0E, "display_list_blocks", U16),
	field(0x10, "display_list", Ptr(None)),
	field(0x14, "weights", Ptr(None)),
];

const MATERIAL: &[FieldDef] = &[
	field(0x00, "name", Ptr(None)),
	field(0x04, "render_flags", U32),
	field(0x08, "tobj", Ptr(Some(StructureKind::Texture))),
	field(0x0C, "material_color", Ptr(None)),
	field(0x10, "render_desc", Ptr(None)),
	field(0x14, "pe_desc", Ptr(None)),
];

const TEXTURE: &[FieldDef] = &[
	field(0x00, "name", Ptr(None)),
	field(0x04, "next", Ptr(Some(StructureKind::Texture))),
	field(0x08, "texmap_id", U32),
	field(0x0C, "coord", U32),
	field(0x10, "rotation_x", F32),
	field(0x14, "rotation_y", F32),
	field(0x18, "rotation_z", F32),
	field(0x1C, "scale_x", F32),
	field(0x20, "scale_y", F32),
	field(0x24, "scale_z", F32),
	field(0x28, "translation_x", F32),
	field(0x2C, "translation_y", F32),
	field(0x30, "translation_z", F32),
	field(0x34, "wrap_s", U32),
	field(0x38, "wrap_t", U32),
	field(0x3C, "repeat_s", U8),
	field(0x3D, "repeat_t", U8),
	field(0x40, "flags", U32),
	field(0x44, "blending", F32),
	field(0x48, "mag_filter", U32),
	field(0x4C, "image", Ptr(Some(StructureKind::ImageHeader))),
	field(0x50, "tlut", Ptr(Some(StructureKind::PaletteHeader))),
	field(0x54, "lod", Ptr(None)),
	field(0x58, "tev", Ptr(None)),
];

const IMAGE_HEADER: &[FieldDef] = &[
	field(0x00, "image_data", Ptr(None)),
	field(0x04, "width", U16),
	field(0x06, "height", U16),
	field(0x08, "format", U32),
	field(0x0C, "mipmap", U32),
	field(0x10, "min_lod", F32),
	field(0x14, "max_lod", F32),
];

const PALETTE_HEADER: &[FieldDef] = &[
	field(0x00, "palette_data", Ptr(None)),
	field(0x04, "format", U32),
	field(0x08, "gx_tlut", U32),
	field(0x0C, "entry_count", U16),
];

/// GX texture formats an image header may declare.
const IMAGE_FORMATS: &[u32] = &[0, 1, 2, 3, 4, 5, 6, 8, 9, 10, 14];

impl StructureKind {
	/// Candidates tried by the default factory, most constrained first.
	pub const PRIORITY: [StructureKind; 7] = [
		Self::Joint,
		Self::Texture,
		Self::ImageHeader,
		Self::PaletteHeader,
		Self::Material,
		Self::PolygonObject,
		Self::DisplayObject,
	];

	/// Fixed record size, zero for `Opaque`.
	pub fn size(self) -> u32 {
		match self {
			Self::Joint => 0x40,
			Self::DisplayObject => 0x10,
			Self::PolygonObject => 0x18,
			Self::Material => 0x18,
			Self::Texture => 0x5C,
			Self::ImageHeader => 0x18,
			Self::PaletteHeader => 0x10,
			Self::Opaque => 0,
		}
	}

	/// Field layout, empty for `Opaque`.
	pub fn fields(self) -> &'static [FieldDef] {
		match self {
			Self::Joint => JOINT,
			Self::DisplayObject => DISPLAY_OBJECT,
			Self::PolygonObject => POLYGON_OBJECT,
			Self::Material => MATERIAL,
			Self::Texture => TEXTURE,
			Self::ImageHeader => IMAGE_HEADER,
			Self::PaletteHeader => PALETTE_HEADER,
			Self::Opaque => &[],
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		self.into()
	}

	/// Whether this is the untyped fallback.
	pub fn is_opaque(self) -> bool {
		self == Self::Opaque
	}

	/// Expected kind of the structure a field at `field_offset` points to.
	pub fn child_hint(self, field_offset: u32) -> Option<StructureKind> {
		self.fields().iter().find(|item| item.offset == field_offset).and_then(|item| match item.ty {
			FieldType::Ptr(hint) => hint,
			_ => None,
		})
	}

	/// Kind implied by a root node label, following HSD naming conventions.
	pub fn from_root_label(label: &str) -> Option<Self> {
		if label.ends_with("_joint") && !label.ends_with("_matanim_joint") && !label.ends_with("_animjoint") {
			return Some(Self::Joint);
		}
		None
	}

	/// Decode `raw` against this kind's layout without validating it.
	///
	/// Fields past the end of `raw` are skipped.
	pub fn decode_fields(self, raw: &[u8], offset: u32, relocations: &RelocationIndex) -> Vec<FieldValue> {
		let mut out = Vec::with_capacity(self.fields().len());
		for def in self.fields() {
			let at = def.offset as usize;
			let value = match def.ty {
				FieldType::U8 => raw.get(at).map(|byte| Value::U8(*byte)),
				FieldType::U16 => read_u16_at(raw, at).map(Value::U16),
				FieldType::U32 => read_u32_at(raw, at).map(Value::U32),
				FieldType::F32 => read_u32_at(raw, at).map(|bits| Value::F32(f32::from_bits(bits))),
				FieldType::Ptr(_) => read_u32_at(raw, at).map(|_| Value::Ptr(relocations.target_at(offset + def.offset))),
			};
			if let Some(value) = value {
				out.push(FieldValue {
					name: def.name,
					offset: def.offset,
					value,
				});
			}
		}
		out
	}

	/// Check whether `raw` (the structure's full inferred extent at `offset`)
	/// is a plausible instance of this kind, returning decoded fields if so.
	///
	/// `Opaque` always validates.
	pub fn validate(self, raw: &[u8], offset: u32, relocations: &RelocationIndex) -> Option<Vec<FieldValue>> {
		if self.is_opaque() {
			return Some(Vec::new());
		}

		let size = self.size();
		let len = u32::try_from(raw.len()).ok()?;
		if len < size || len >= size + ALIGNMENT {
			return None;
		}
		if raw[..size as usize].iter().all(|byte| *byte == 0) {
			return None;
		}

		// Every relocated slot inside the extent must be a pointer field.
		let end = offset.checked_add(len)?;
		for pointer in relocations.pointers_in(offset..end) {
			let rel = pointer.location - offset;
			let is_ptr_field = self
				.fields()
				.iter()
				.any(|item| item.offset == rel && matches!(item.ty, FieldType::Ptr(_)));
			if !is_ptr_field {
				return None;
			}
		}

		// Unrelocated pointer fields must be null.
		for def in self.fields() {
			if matches!(def.ty, FieldType::Ptr(_))
				&& !relocations.is_pointer_location(offset + def.offset)
				&& read_u32_at(raw, def.offset as usize)? != 0
			{
				return None;
			}
		}

		let fields = self.decode_fields(raw, offset, relocations);
		self.check_values(&fields).then_some(fields)
	}

	fn check_values(self, fields: &[FieldValue]) -> bool {
		let get = |name: &str| fields.iter().find(|item| item.name == name).map(|item| item.value);
		let uint = |name: &str| get(name).and_then(|value| value.as_u32());
		let floats_finite = || {
			fields.iter().all(|item| match item.value {
				Value::F32(v) => v.is_finite(),
				_ => true,
			})
		};

		match self {
			Self::Joint => floats_finite(),
			Self::DisplayObject => true,
			Self::PolygonObject => {
				uint("display_list_blocks").is_some_and(|blocks| blocks > 0) && get("display_list").and_then(|value| value.as_ptr()).is_some()
			}
			Self::Material => uint("render_flags").is_some_and(|flags| flags != 0),
			Self::Texture => floats_finite() && uint("wrap_s").is_some_and(|v| v <= 2) && uint("wrap_t").is_some_and(|v| v <= 2),
			Self::ImageHeader => {
				uint("width").is_some_and(|v| (1..=1024).contains(&v))
					&& uint("height").is_some_and(|v| (1..=1024).contains(&v))
					&& uint("format").is_some_and(|v| IMAGE_FORMATS.contains(&v))
					&& get("image_data").and_then(|value| value.as_ptr()).is_some()
			}
			Self::PaletteHeader => {
				uint("format").is_some_and(|v| v <= 2)
					&& uint("entry_count").is_some_and(|v| (1..=16384).contains(&v))
					&& get("palette_data").and_then(|value| value.as_ptr()).is_some()
			}
			Self::Opaque => true,
		}
	}
}

#[cfg(test)]
mod tests;
