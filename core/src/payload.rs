//! Canonical JSON encoding for request payloads.
//!
//! Payloads are written with `", "` between items and `": "` after keys, and
//! every character outside printable ASCII is escaped as `\uXXXX`. Object
//! keys keep insertion order (`serde_json` is built with `preserve_order`).
//! The output for a given value is stable, so payloads can be compared as
//! strings.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::error::ApiError;

/// Serialize `payload` to its canonical JSON string.
pub fn create_payload<T: Serialize + ?Sized>(payload: &T) -> Result<String, ApiError> {
    let mut buf = Vec::with_capacity(128);
    let mut serializer = Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
    payload
        .serialize(&mut serializer)
        .map_err(|e| ApiError::request_failed(format!("payload serialization failed: {e}")))?;
    String::from_utf8(buf)
        .map_err(|e| ApiError::request_failed(format!("payload serialization failed: {e}")))
}

struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    // Quotes, backslashes and control characters never reach this method;
    // serde_json routes them through `write_char_escape`.
    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
