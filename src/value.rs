use serde::{Deserialize, Deserializer, de};

/// Represents a number that preserves the distinction between I64, U64, and F64.
/// Content files mix integer fields (armor_class, price) with float fields
/// (challenge_rating, weight), and writing `24` back as `24.0` would churn
/// every file a tool touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldNumber {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl FieldNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldNumber::I64(v) => *v as f64,
            FieldNumber::U64(v) => *v as f64,
            FieldNumber::F64(v) => *v,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldNumber::I64(v) => Some(*v),
            FieldNumber::U64(v) => i64::try_from(*v).ok(),
            FieldNumber::F64(_) => None,
        }
    }

    fn write(&self, out: &mut String) {
        match self {
            FieldNumber::I64(v) => out.push_str(&v.to_string()),
            FieldNumber::U64(v) => out.push_str(&v.to_string()),
            FieldNumber::F64(v) => {
                if v.is_finite() {
                    let mut buf = ryu::Buffer::new();
                    out.push_str(buf.format(*v));
                } else {
                    // JSON has no literal for non-finite floats.
                    out.push_str("null");
                }
            }
        }
    }
}

/// A single record field: flat by design. Records are one JSON object per
/// file with scalar fields plus string lists (`tags`, `notes`); nested
/// objects are not part of the content schema and fail the file's parse.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(FieldNumber),
    Text(String),
    List(Vec<String>),
}

/// Declared kind for a field, used when the caller supplies raw string
/// input (bulk edits, add-field defaults) and the engine must coerce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    List,
    Nullable,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric view with the degrade-to-zero rule used by range filters and
    /// sort keys: anything that is not a number (or a numeric-looking string)
    /// compares as 0. A record missing the field entirely gets the same 0,
    /// which means it passes any range that includes 0. Long-standing
    /// behavior the content relies on; pinned by tests.
    pub fn numeric_or_zero(&self) -> f64 {
        match self {
            FieldValue::Number(n) => n.as_f64(),
            FieldValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            FieldValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            FieldValue::Null | FieldValue::List(_) => 0.0,
        }
    }

    /// Stringified view used by search and `contains` filters.
    /// Lists join with ", " the way the editors rendered them.
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => {
                let mut out = String::new();
                n.write(&mut out);
                out
            }
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
            FieldValue::List(_) => "list",
        }
    }

    /// Best-effort classification of free-form user input: integer, then
    /// float, otherwise text. Real `parse` attempts rather than character
    /// sniffing, so inputs like `1-2` stay text.
    pub fn classify(input: &str) -> FieldValue {
        let trimmed = input.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return FieldValue::Number(FieldNumber::I64(v));
        }
        if let Ok(v) = trimmed.parse::<f64>()
            && v.is_finite()
        {
            return FieldValue::Number(FieldNumber::F64(v));
        }
        FieldValue::Text(input.to_string())
    }

    /// Coerce raw string input to a declared kind. Numeric kinds report
    /// failure instead of guessing; everything else has a total fallback.
    /// Text input is stored verbatim, whitespace included.
    pub fn coerce(kind: FieldKind, input: &str) -> Result<FieldValue, CoerceError> {
        let trimmed = input.trim();
        match kind {
            FieldKind::Text => Ok(FieldValue::Text(input.to_string())),
            FieldKind::Integer => trimmed
                .parse::<i64>()
                .map(|v| FieldValue::Number(FieldNumber::I64(v)))
                .map_err(|_| CoerceError {
                    kind,
                    input: input.to_string(),
                }),
            FieldKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| FieldValue::Number(FieldNumber::F64(v)))
                .ok_or_else(|| CoerceError {
                    kind,
                    input: input.to_string(),
                }),
            FieldKind::Boolean => Ok(FieldValue::Bool(parse_bool(trimmed))),
            FieldKind::List => Ok(FieldValue::List(split_list(trimmed))),
            FieldKind::Nullable => {
                if trimmed.is_empty()
                    || trimmed.eq_ignore_ascii_case("none")
                    || trimmed.eq_ignore_ascii_case("null")
                {
                    Ok(FieldValue::Null)
                } else {
                    Ok(FieldValue::Text(trimmed.to_string()))
                }
            }
        }
    }

    pub(crate) fn write_pretty(&self, out: &mut String, indent: usize, ensure_ascii: bool) {
        match self {
            FieldValue::Null => out.push_str("null"),
            FieldValue::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
            FieldValue::Number(n) => n.write(out),
            FieldValue::Text(s) => write_escaped_string(out, s, ensure_ascii),
            FieldValue::List(items) => {
                out.push('[');
                if !items.is_empty() {
                    out.push('\n');
                    for (i, item) in items.iter().enumerate() {
                        out.push_str(&" ".repeat(indent + 2));
                        write_escaped_string(out, item, ensure_ascii);
                        if i + 1 != items.len() {
                            out.push(',');
                        }
                        out.push('\n');
                    }
                    out.push_str(&" ".repeat(indent));
                }
                out.push(']');
            }
        }
    }
}

/// Raw string input could not be coerced to the field's declared kind.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{input:?} is not a valid {} value", kind_name(.kind))]
pub struct CoerceError {
    pub kind: FieldKind,
    pub input: String,
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "text",
        FieldKind::Integer => "integer",
        FieldKind::Float => "number",
        FieldKind::Boolean => "boolean",
        FieldKind::List => "list",
        FieldKind::Nullable => "nullable",
    }
}

/// Permissive boolean parser: the set of spellings the editors accepted.
pub fn parse_bool(input: &str) -> bool {
    matches!(
        input.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Comma-separated list parser: trim whitespace, drop empty tokens.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn write_key(out: &mut String, key: &str, ensure_ascii: bool) {
    write_escaped_string(out, key, ensure_ascii);
}

/// JSON string escaping, 2-space-indent style. With `ensure_ascii`, every
/// non-ASCII character escapes as \uXXXX (UTF-16 pairs above the BMP),
/// matching content files written by the item tooling; without it, only
/// control characters escape.
fn write_escaped_string(out: &mut String, s: &str, ensure_ascii: bool) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write as _;
                write!(out, "\\u{:04x}", c as u32).ok();
            }
            c if ensure_ascii && (c as u32) > 0x7F => {
                use std::fmt::Write as _;
                let cp = c as u32;
                if cp <= 0xFFFF {
                    write!(out, "\\u{:04x}", cp).ok();
                } else {
                    // Encode as UTF-16 surrogate pair.
                    let u = cp - 0x1_0000;
                    let high = 0xD800 + ((u >> 10) & 0x3FF);
                    let low = 0xDC00 + (u & 0x3FF);
                    write!(out, "\\u{:04x}\\u{:04x}", high, low).ok();
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

impl<'de> Deserialize<'de> for FieldNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NumberVisitor;

        impl<'de> de::Visitor<'de> for NumberVisitor {
            type Value = FieldNumber;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON number")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(FieldNumber::I64(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(FieldNumber::U64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(FieldNumber::F64(v))
            }
        }

        deserializer.deserialize_any(NumberVisitor)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = FieldValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a flat record field (scalar or list of strings)")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FieldValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(FieldValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(FieldValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(FieldValue::Number(FieldNumber::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(FieldValue::Number(FieldNumber::U64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(FieldValue::Number(FieldNumber::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(FieldValue::Text(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(FieldValue::Text(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                // List fields (tags, notes) hold strings; stray scalar
                // elements are stringified rather than dropped.
                let mut items = Vec::new();
                while let Some(value) = seq.next_element::<FieldValue>()? {
                    match value {
                        FieldValue::Text(s) => items.push(s),
                        FieldValue::List(_) => {
                            return Err(de::Error::custom("nested lists are not record fields"));
                        }
                        other => items.push(other.display_text()),
                    }
                }
                Ok(FieldValue::List(items))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, _map: A) -> Result<Self::Value, A::Error> {
                Err(de::Error::custom("nested objects are not record fields"))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
