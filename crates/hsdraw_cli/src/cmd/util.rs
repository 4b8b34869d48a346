use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn emit_json<T: Serialize>(value: &T) {
	match serde_json::to_string_pretty(value) {
		Ok(text) => println!("{text}"),
		Err(err) => eprintln!("error: failed to encode json: {err}"),
	}
}

/// Render a data-relative offset as signed hex.
pub(crate) fn offset_hex(offset: i64) -> String {
	if offset < 0 { format!("-0x{:x}", offset.unsigned_abs()) } else { format!("0x{offset:x}") }
}

/// Parse decimal or `0x`-prefixed hex offset literal.
pub(crate) fn parse_offset(value: &str) -> Result<i64, String> {
	let (negative, digits) = match value.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, value),
	};
	let parsed = if let Some(stripped) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
		i64::from_str_radix(stripped, 16)
	} else {
		digits.parse::<i64>()
	};

	parsed
		.map(|item| if negative { -item } else { item })
		.map_err(|_| format!("invalid offset literal: {value}"))
}

/// Parse an `OFFSET=KIND` structure hint.
pub(crate) fn parse_hint(value: &str) -> Result<(i64, String), String> {
	let (offset, kind) = value.split_once('=').ok_or_else(|| format!("expected OFFSET=KIND, got {value}"))?;
	Ok((parse_offset(offset)?, kind.to_owned()))
}

#[cfg(test)]
mod tests {
	use super::{offset_hex, parse_hint, parse_offset};

	#[test]
	fn offsets_parse_in_both_radixes() {
		assert_eq!(parse_offset("64"), Ok(64));
		assert_eq!(parse_offset("0x40"), Ok(64));
		assert_eq!(parse_offset("-0x20"), Ok(-32));
		assert!(parse_offset("0xzz").is_err());
	}

	#[test]
	fn hex_keeps_sign() {
		assert_eq!(offset_hex(-0x20), "-0x20");
		assert_eq!(offset_hex(0x1a0), "0x1a0");
	}

	#[test]
	fn hints_split_on_equals() {
		assert_eq!(parse_hint("0xC0=tobj"), Ok((0xC0, "tobj".to_owned())));
		assert!(parse_hint("0xC0").is_err());
	}
}
