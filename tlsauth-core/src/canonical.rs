//! Canonical signing content.
//!
//! The signature covers exactly three fields, serialized as a compact JSON object with a
//! fixed key order: `{"data":…,"expire_after":…,"time":…}`. Issuing and redeeming both go
//! through [`canonicalize`], so the bytes cannot drift between the two sides.
//!
//! All JSON written for a token is pure ASCII: `/` is escaped as `\/` and every non-ASCII
//! character as `\uXXXX` UTF-16 units with lowercase hex. Tokens issued by other
//! implementations that use these escapes therefore canonicalize to the same bytes.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

#[derive(Serialize)]
struct SignedFields<'a> {
    data: &'a str,
    expire_after: u64,
    time: i64,
}

/// Build the bytes that are signed for a token.
///
/// JSON string escaping makes this injective: distinct field values never produce the same
/// bytes.
pub fn canonicalize(data: &str, expire_after: u64, issued_at: i64) -> Vec<u8> {
    let fields = SignedFields {
        data,
        expire_after,
        time: issued_at,
    };
    to_json(&fields).expect("serializing strings and integers to json cannot fail")
}

/// Serialize `value` as compact, ASCII-only JSON.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut ser)?;
    Ok(out)
}

struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    // quotes, backslashes and control characters are escaped by serde_json before this
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() && c != '/' {
                continue;
            }
            writer.write_all(&bytes[start..i])?;
            if c == '/' {
                writer.write_all(b"\\/")?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
            start = i + c.len_utf8();
        }
        writer.write_all(&bytes[start..])
    }
}
