//! Excel `_xHHHH_` escapes
//!
//! SpreadsheetML stores characters XML cannot carry (CR, control characters,
//! a literal `_x` sequence) as `_xHHHH_`, e.g. `_x000d_` for CR and `_x005f_`
//! for an underscore.

/// Decode every well-formed `_xHHHH_` escape; anything else is kept verbatim.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find("_x") {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];

        match decode_one(candidate) {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push('_');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Decode `_xHHHH_` at the start of `s`
fn decode_one(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 7 || bytes[6] != b'_' {
        return None;
    }
    if !bytes[2..6].iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u32::from_str_radix(&s[2..6], 16).ok().and_then(char::from_u32)
}
