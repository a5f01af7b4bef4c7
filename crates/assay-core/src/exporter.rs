//! Human-readable value rendering for failure messages and diffs.
//!
//! `export` produces the full multi-line form used in comparison diffs;
//! `shortened_export` produces the single-line summary used inside sentences.

use crate::value::{float_to_string, ArrayKey, Value, ValueArray};
use std::collections::HashSet;

const SHORT_LIMIT: usize = 40;

/// Full rendering of a value.
pub fn export(value: &Value) -> String {
    let mut seen = HashSet::new();
    export_inner(value, 0, &mut seen)
}

/// One-line rendering: long strings are elided, containers collapse to `(...)`.
pub fn shortened_export(value: &Value) -> String {
    match value {
        Value::String(_) => {
            let full = export(value);
            let chars: Vec<char> = full.chars().collect();
            let shortened = if chars.len() > SHORT_LIMIT {
                let head: String = chars[..30].iter().collect();
                let tail: String = chars[chars.len() - 7..].iter().collect();
                format!("{}...{}", head, tail)
            } else {
                full
            };
            shortened.replace('\n', "\\n")
        }
        Value::Array(arr) => format!("Array ({})", if arr.is_empty() { "" } else { "..." }),
        Value::Object(obj) => format!(
            "{} Object ({})",
            obj.class_name(),
            if obj.field_count() == 0 { "" } else { "..." }
        ),
        Value::DateTime(_) | Value::Markup(_) => {
            format!("{} Object (...)", value.class_name().unwrap_or_default())
        }
        _ => export(value),
    }
}

/// Render an array key the way it appears in an export.
pub fn export_key(key: &ArrayKey) -> String {
    match key {
        ArrayKey::Int(i) => i.to_string(),
        ArrayKey::Str(s) => export_string(s),
    }
}

/// Render a float literal so it always reads as a float (`1.0`, not `1`).
pub fn export_float(f: f64) -> String {
    let text = float_to_string(f);
    if f.is_finite() && !text.contains(['.', 'E']) {
        format!("{}.0", text)
    } else {
        text
    }
}

fn export_inner(value: &Value, indent: usize, seen: &mut HashSet<usize>) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => export_float(*f),
        Value::String(s) => export_string(s),
        Value::Array(arr) => export_entries("Array", arr, indent, seen),
        Value::Object(obj) => {
            let class = format!("{} Object", obj.class_name());
            if !seen.insert(obj.id()) {
                return format!("{} (*RECURSION*)", class);
            }
            let fields: ValueArray = obj
                .fields()
                .into_iter()
                .map(|(name, value)| (ArrayKey::from(name), value))
                .collect();
            let rendered = export_entries(&class, &fields, indent, seen);
            seen.remove(&obj.id());
            rendered
        }
        Value::Resource(res) => format!("resource({}) of type ({})", res.id(), res.kind()),
        Value::DateTime(dt) => format!("DateTime Object ({})", dt.format(DATETIME_FORMAT)),
        Value::Markup(doc) => format!("Document Object ({})", doc.to_compact_string()),
    }
}

/// Layout used wherever an instant is shown, e.g. `2013-03-29T04:13:35-0400`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

fn export_entries(
    prefix: &str,
    entries: &ValueArray,
    indent: usize,
    seen: &mut HashSet<usize>,
) -> String {
    if entries.is_empty() {
        return format!("{} ()", prefix);
    }
    let whitespace = " ".repeat(4 * indent);
    let mut out = format!("{} (\n", prefix);
    for (key, value) in entries.iter() {
        out.push_str(&format!(
            "{}    {} => {}\n",
            whitespace,
            export_key(key),
            export_inner(value, indent + 1, seen)
        ));
    }
    out.push_str(&whitespace);
    out.push(')');
    out
}

fn export_string(s: &str) -> String {
    if s.chars()
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        let hex: String = s.bytes().map(|b| format!("{:02x}", b)).collect();
        return format!("Binary String: 0x{}", hex);
    }
    format!("'{}'", s.replace('\r', "\\r"))
}
