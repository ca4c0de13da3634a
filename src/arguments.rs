//! Normalization of function-call arguments into a JSON string
//!
//! Gemini may hand back the arguments of a function call as a JSON object,
//! a JSON-encoded string, or nothing at all. Downstream consumers always get
//! a syntactically valid JSON object encoded as a string.

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::io;

/// Fallback emitted whenever the arguments cannot be turned into an object.
pub const EMPTY_ARGUMENTS: &str = "{}";

/// The shapes a function-call argument payload can arrive in
#[derive(Debug, Clone, PartialEq)]
pub enum RawArguments {
    /// A JSON document encoded as a string
    Text(String),
    /// An already-structured mapping
    Object(Map<String, Value>),
    /// Missing, null, or any other JSON type
    Absent,
}

impl From<Option<Value>> for RawArguments {
    fn from(value: Option<Value>) -> Self {
        match value {
            Some(Value::String(text)) => Self::Text(text),
            Some(Value::Object(map)) => Self::Object(map),
            _ => Self::Absent,
        }
    }
}

impl From<Value> for RawArguments {
    fn from(value: Value) -> Self {
        Some(value).into()
    }
}

/// Turn a raw argument payload into a JSON object string.
///
/// Never fails: anything that does not resolve to an object yields `"{}"`.
pub fn normalize_arguments(raw: RawArguments) -> String {
    let map = match raw {
        RawArguments::Object(map) => map,
        RawArguments::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            _ => return EMPTY_ARGUMENTS.to_string(),
        },
        RawArguments::Absent => Map::new(),
    };

    to_spaced_json(&map).unwrap_or_else(|_| EMPTY_ARGUMENTS.to_string())
}

/// Serialize with `", "` and `": "` separators, e.g. `{"a": 1, "b": [1, 2]}`.
pub fn to_spaced_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Compact output with a single space after every separator
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    /// ASCII-only output: non-ASCII chars become `\uXXXX`, astral ones a surrogate pair
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut rest = fragment;
        while let Some(pos) = rest.find(|c: char| !c.is_ascii()) {
            writer.write_all(rest[..pos].as_bytes())?;
            let c = rest[pos..].chars().next().unwrap_or_default();
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            rest = &rest[pos + c.len_utf8()..];
        }
        writer.write_all(rest.as_bytes())
    }
}
