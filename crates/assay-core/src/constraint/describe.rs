use super::matching::json_error;
use super::Constraint;
use crate::exporter::{export, export_key, shortened_export};
use crate::value::Value;
use std::fmt;

/// Positive phrases and their negations, applied in order.
const NEGATIONS: [(&str, &str); 10] = [
    ("contains ", "does not contain "),
    ("exists", "does not exist"),
    ("has ", "does not have "),
    ("is ", "is not "),
    ("are ", "are not "),
    ("matches ", "does not match "),
    ("starts with ", "starts not with "),
    ("ends with ", "ends not with "),
    ("reference ", "don't reference "),
    ("not not ", "not "),
];

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Anything => write!(f, "is anything"),
            Constraint::IsEqual { value, options } => {
                match value {
                    Value::String(s) if s.contains('\n') => write!(f, "is equal to <text>")?,
                    Value::String(s) => write!(f, "is equal to '{}'", s)?,
                    _ => write!(f, "is equal to {}", export(value))?,
                }
                if options.delta != 0.0 {
                    write!(f, " with delta <{:.6}>", options.delta)?;
                }
                Ok(())
            }
            Constraint::IsIdentical(value) => match value.class_name() {
                Some(class) => write!(f, "is identical to an object of class \"{}\"", class),
                None => write!(f, "is identical to {}", export(value)),
            },
            Constraint::IsType { name, .. } => write!(f, "is of type \"{}\"", name),
            Constraint::IsInstanceOf(class) => write!(f, "is instance of class \"{}\"", class),
            Constraint::IsNull => write!(f, "is null"),
            Constraint::IsTrue => write!(f, "is true"),
            Constraint::IsFalse => write!(f, "is false"),
            Constraint::IsNan => write!(f, "is nan"),
            Constraint::IsFinite => write!(f, "is finite"),
            Constraint::IsInfinite => write!(f, "is infinite"),
            Constraint::IsEmpty => write!(f, "is empty"),
            Constraint::IsJson => write!(f, "is valid JSON"),
            Constraint::JsonMatches(json) => write!(f, "matches JSON string \"{}\"", json),
            Constraint::GreaterThan(value) => write!(f, "is greater than {}", export(value)),
            Constraint::LessThan(value) => write!(f, "is less than {}", export(value)),
            Constraint::Count(expected) => write!(f, "count matches {}", expected),
            Constraint::ArrayHasKey(key) => write!(f, "has the key {}", export_key(key)),
            Constraint::TraversableContains { value, .. } => match value {
                Value::String(s) if s.contains('\n') => write!(f, "contains \"{}\"", s),
                _ => write!(f, "contains {}", export(value)),
            },
            Constraint::TraversableContainsOnly { type_name, .. } => {
                write!(f, "contains only values of type \"{}\"", type_name)
            }
            Constraint::StringContains {
                needle,
                ignore_case,
            } => {
                if *ignore_case {
                    write!(f, "contains \"{}\"", needle.to_lowercase())
                } else {
                    write!(f, "contains \"{}\"", needle)
                }
            }
            Constraint::StringStartsWith(prefix) => write!(f, "starts with \"{}\"", prefix),
            Constraint::StringEndsWith(suffix) => write!(f, "ends with \"{}\"", suffix),
            Constraint::RegexMatch(regex) => {
                write!(f, "matches regular expression pattern \"{}\"", regex.as_str())
            }
            Constraint::ObjectHasAttribute(name) => write!(f, "has attribute \"{}\"", name),
            Constraint::Callback(_) => write!(f, "is accepted by specified callback"),
            Constraint::And(children) => write_joined(f, children, " and "),
            Constraint::Or(children) => write_joined(f, children, " or "),
            Constraint::Xor(children) => write_joined(f, children, " xor "),
            Constraint::Not(inner) => {
                if inner.is_composite() {
                    write!(f, "not( {} )", inner)
                } else {
                    write!(f, "{}", negate(&inner.to_string()))
                }
            }
            Constraint::Attribute { name, inner } => write!(f, "attribute \"{}\" {}", name, inner),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Constraint], separator: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

impl Constraint {
    /// Phrase completing "Failed asserting that ..." for `other`.
    pub fn failure_description(&self, other: &Value) -> String {
        match self {
            Constraint::IsIdentical(value) => match (value, other) {
                (Value::Object(_), Value::Object(_)) => {
                    "two variables reference the same object".to_string()
                }
                (Value::String(_), Value::String(_)) => "two strings are identical".to_string(),
                (Value::Array(_), Value::Array(_)) => "two arrays are identical".to_string(),
                _ => self.default_failure_description(other),
            },
            Constraint::IsInstanceOf(class) => format!(
                "{} is an instance of class \"{}\"",
                shortened_export(other),
                class
            ),
            Constraint::IsEmpty => {
                let type_name = other.type_name();
                let article = if type_name.starts_with(['a', 'e', 'i', 'o', 'u']) {
                    "an"
                } else {
                    "a"
                };
                format!("{} {} is empty", article, type_name)
            }
            Constraint::IsJson => match other.as_str() {
                Some("") => "an empty string is valid JSON".to_string(),
                Some(text) => format!(
                    "{} is valid JSON ({})",
                    shortened_export(other),
                    json_error(text).unwrap_or_default()
                ),
                None => format!("{} is valid JSON", shortened_export(other)),
            },
            Constraint::Count(expected) => match other.count() {
                Some(actual) => format!(
                    "actual size {} matches expected size {}",
                    actual, expected
                ),
                None => self.default_failure_description(other),
            },
            Constraint::ArrayHasKey(_) | Constraint::TraversableContains { .. } => {
                format!("an array {}", self)
            }
            Constraint::ObjectHasAttribute(_) => format!(
                "object of class \"{}\" {}",
                other.class_name().unwrap_or_else(|| other.type_name().to_string()),
                self
            ),
            Constraint::Attribute { .. } => self.to_string(),
            Constraint::Not(inner) => {
                if inner.is_composite() {
                    format!("not( {} )", inner.failure_description(other))
                } else {
                    negate(&inner.failure_description(other))
                }
            }
            _ => self.default_failure_description(other),
        }
    }

    fn default_failure_description(&self, other: &Value) -> String {
        format!("{} {}", export(other), self)
    }

    fn is_composite(&self) -> bool {
        matches!(
            self,
            Constraint::And(_) | Constraint::Or(_) | Constraint::Xor(_) | Constraint::Not(_)
        )
    }
}

/// Rewrite a positive phrase into its negation.
///
/// When the text holds a single-quoted value followed by a double-quoted
/// operand, only the words between them are rewritten.
pub fn negate(text: &str) -> String {
    match quoted_middle(text) {
        Some((start, end)) => format!(
            "{}{}{}",
            &text[..start],
            negate_words(&text[start..end]),
            &text[end..]
        ),
        None => negate_words(text),
    }
}

fn negate_words(text: &str) -> String {
    NEGATIONS
        .iter()
        .fold(text.to_string(), |acc, (positive, negative)| {
            acc.replace(positive, negative)
        })
}

/// Byte range between the last `'` that still has two `"` after it and the
/// second-to-last `"`.
fn quoted_middle(text: &str) -> Option<(usize, usize)> {
    let double_quotes: Vec<usize> = text.match_indices('"').map(|(i, _)| i).collect();
    if double_quotes.len() < 2 {
        return None;
    }
    let end = double_quotes[double_quotes.len() - 2];
    let first_single = text.find('\'')?;
    let last_single = text[..end].rfind('\'')?;
    if last_single <= first_single {
        return None;
    }
    Some((last_single + 1, end))
}
