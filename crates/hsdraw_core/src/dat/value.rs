/// Scalar decoded from one record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
	/// Unsigned byte.
	U8(u8),
	/// Big-endian `u16`.
	U16(u16),
	/// Big-endian `u32`.
	U32(u32),
	/// Big-endian IEEE-754 single.
	F32(f32),
	/// Pointer slot: `Some(target)` when relocated, `None` when null.
	Ptr(Option<u32>),
}

/// Named decoded field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
	/// Field identifier.
	pub name: &'static str,
	/// Offset inside the owning record.
	pub offset: u32,
	/// Decoded payload.
	pub value: Value,
}

impl Value {
	/// Pointer target, if this is a non-null pointer.
	pub fn as_ptr(&self) -> Option<u32> {
		match self {
			Self::Ptr(target) => *target,
			_ => None,
		}
	}

	/// Widen an integer scalar to `u32`.
	pub fn as_u32(&self) -> Option<u32> {
		match self {
			Self::U8(v) => Some(u32::from(*v)),
			Self::U16(v) => Some(u32::from(*v)),
			Self::U32(v) => Some(*v),
			_ => None,
		}
	}
}
