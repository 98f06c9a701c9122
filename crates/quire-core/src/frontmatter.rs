//! Front-matter parsing for content files.
//!
//! A front-matter block is a `---` line, YAML `key: value` pairs and a closing
//! `---` line at the very start of a file. Values are narrowed to the closed
//! [`FrontValue`] variant so templates only ever see strings, numbers, dates or
//! lists of strings.

use std::{collections::BTreeMap, fmt, path::Path};

use chrono::{DateTime, NaiveDate};
use serde_yaml::Value;

use crate::error::{CoreError, Result};

/// The fixed delimiter line that opens and closes a front-matter block.
pub const DELIMITER: &str = "---";

/// A single front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontValue {
    /// Free-form text (YAML booleans and nulls land here too).
    String(String),
    /// Any YAML number.
    Number(f64),
    /// An ISO date (`2023-01-01`) or the date part of an RFC 3339 timestamp.
    Date(NaiveDate),
    /// A sequence of scalars.
    List(Vec<String>),
}

impl FrontValue {
    /// Return the value as a string slice when it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the value as a date when it is one.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FrontValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.0}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// Parsed front-matter: an ordered mapping of keys to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: BTreeMap<String, FrontValue>,
}

impl FrontMatter {
    /// Create an empty front-matter mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: FrontValue) {
        self.fields.insert(key.into(), value);
    }

    /// Look up a raw value.
    pub fn get(&self, key: &str) -> Option<&FrontValue> {
        self.fields.get(key)
    }

    /// Look up a value rendered as a string.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).map(ToString::to_string)
    }

    /// Iterate over all fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Page title, empty when absent.
    pub fn title(&self) -> String {
        self.get_string("title").unwrap_or_default()
    }

    /// Publication date.
    pub fn date(&self) -> Option<NaiveDate> {
        self.get("date").and_then(FrontValue::as_date)
    }

    /// Requested layout name.
    pub fn layout(&self) -> Option<&str> {
        self.get("layout").and_then(FrontValue::as_str)
    }

    /// Explicit output location.
    pub fn permalink(&self) -> Option<&str> {
        self.get("permalink").and_then(FrontValue::as_str)
    }

    /// Explicit markup format name.
    pub fn format(&self) -> Option<&str> {
        self.get("format").and_then(FrontValue::as_str)
    }

    /// Whether the document is a draft.
    pub fn draft(&self) -> bool {
        self.get("draft").and_then(FrontValue::as_str) == Some("true")
    }

    /// Tags, from either a list or a comma separated string.
    pub fn tags(&self) -> Vec<String> {
        match self.get("tags") {
            Some(FrontValue::List(items)) => items.clone(),
            Some(FrontValue::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Result of looking for a front-matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split<'a> {
    /// The file does not open with the delimiter line.
    Absent,
    /// The opening delimiter was found but never closed.
    Unclosed,
    /// A complete block was found.
    Present { front: &'a str, body: &'a str },
}

/// Split content into its front-matter block and body.
pub fn split_frontmatter(content: &str) -> Split<'_> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Split::Absent;
    };
    if first.trim_end() != DELIMITER {
        return Split::Absent;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            let front = &content[start..offset];
            let body = content[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Split::Present { front, body };
        }
        offset += line.len();
    }

    Split::Unclosed
}

/// Parse front-matter from a file's content.
///
/// Returns `Ok(None)` when the file has no front-matter block, which makes it
/// a passthrough asset.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<Option<(FrontMatter, String)>> {
    match split_frontmatter(content) {
        Split::Absent => Ok(None),
        Split::Unclosed => Err(CoreError::malformed(
            path,
            format!("missing closing `{DELIMITER}` line"),
        )),
        Split::Present { front, body } => {
            let front = parse_block(front, path)?;
            Ok(Some((front, body.to_string())))
        }
    }
}

/// Parse the text between the delimiters.
fn parse_block(block: &str, path: &Path) -> Result<FrontMatter> {
    let mut front = FrontMatter::new();
    if block.trim().is_empty() {
        return Ok(front);
    }

    let value: Value =
        serde_yaml::from_str(block).map_err(|e| CoreError::malformed(path, e.to_string()))?;

    let Value::Mapping(mapping) = value else {
        return Err(CoreError::malformed(path, "expected `key: value` pairs"));
    };

    for (key, value) in mapping {
        let key = scalar_to_string(&key)
            .ok_or_else(|| CoreError::malformed(path, "keys must be scalars"))?;
        let value = convert_value(value).ok_or_else(|| {
            CoreError::malformed(path, format!("unsupported value for `{key}`"))
        })?;
        front.insert(key, value);
    }

    Ok(front)
}

/// Narrow a YAML value to a `FrontValue`.
fn convert_value(value: Value) -> Option<FrontValue> {
    match value {
        Value::String(s) => Some(match parse_date(&s) {
            Some(date) => FrontValue::Date(date),
            None => FrontValue::String(s),
        }),
        Value::Number(n) => n.as_f64().map(FrontValue::Number),
        Value::Bool(_) | Value::Null => scalar_to_string(&value).map(FrontValue::String),
        Value::Sequence(items) => items
            .iter()
            .map(scalar_to_string)
            .collect::<Option<Vec<_>>>()
            .map(FrontValue::List),
        Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Parse an ISO date or an RFC 3339 timestamp.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
