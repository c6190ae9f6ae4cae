//! Front matter splitting and decoding.
//!
//! A post starts with a metadata header fenced by delimiter lines:
//!
//! ```markdown
//! ---
//! draft: false
//! date: 2024-01-01T00:00:00+09:00
//! ---
//!
//! ![cat](https://example.com/cat.png)
//! ```
//!
//! `---` fences hold YAML; `+++` fences hold TOML. The delimiter must be the
//! whole first line and the closing delimiter a whole later line. A `---`
//! horizontal rule inside the body is never mistaken for the end of the
//! header because the first matching line wins.
//!
//! Any [`FrontmatterError`] means the document is misformatted. Such a
//! document has no trustworthy body, so callers do not extract images from it.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use thiserror::Error;

const YAML_DELIMITER: &str = "---";
const TOML_DELIMITER: &str = "+++";

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("no front matter: first line must be --- or +++")]
    Missing,
    #[error("unclosed front matter: no closing {0} line")]
    Unclosed(&'static str),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("front matter must be a key/value mapping")]
    NotAMapping,
}

/// Decoded header keys, ordered for stable debug output.
pub type Metadata = BTreeMap<String, FieldValue>;

/// A decoded header value.
///
/// YAML only yields the plain scalar variants; TOML can also yield the native
/// date/time variants.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    DateTime(DateTime<FixedOffset>),
    LocalDateTime(NaiveDateTime),
    Date(NaiveDate),
    List(Vec<FieldValue>),
    Table(Metadata),
}

impl FieldValue {
    /// Null or an empty/whitespace string. Blank fields count as absent.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Parse ISO-8601 text into one of the date/time variants.
    ///
    /// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, `...+09:00`), the same with a
    /// space instead of `T`, offsets without a colon, naive timestamps with or
    /// without seconds, and bare dates.
    pub fn parse_timestamp(text: &str) -> Option<FieldValue> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(FieldValue::DateTime(dt));
        }
        let normalized = match text.find(' ') {
            Some(10) => text.replacen(' ', "T", 1),
            _ => text.to_string(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
            return Some(FieldValue::DateTime(dt));
        }
        if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f%z") {
            return Some(FieldValue::DateTime(dt));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
                return Some(FieldValue::LocalDateTime(naive));
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(FieldValue::Date)
    }
}

/// Which markup the header was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    Yaml,
    Toml,
}

impl HeaderFormat {
    fn delimiter(self) -> &'static str {
        match self {
            HeaderFormat::Yaml => YAML_DELIMITER,
            HeaderFormat::Toml => TOML_DELIMITER,
        }
    }
}

/// A document split into decoded header and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter<'a> {
    pub format: HeaderFormat,
    pub metadata: Metadata,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
}

/// Split `text` into header and body and decode the header.
pub fn parse(text: &str) -> Result<Frontmatter<'_>, FrontmatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next().ok_or(FrontmatterError::Missing)?;
    let format = match first.trim_end() {
        YAML_DELIMITER => HeaderFormat::Yaml,
        TOML_DELIMITER => HeaderFormat::Toml,
        _ => return Err(FrontmatterError::Missing),
    };

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == format.delimiter() {
            let header = &text[header_start..offset];
            let body = &text[offset + line.len()..];
            let metadata = match format {
                HeaderFormat::Yaml => decode_yaml(header)?,
                HeaderFormat::Toml => decode_toml(header)?,
            };
            return Ok(Frontmatter {
                format,
                metadata,
                body,
            });
        }
        offset += line.len();
    }

    Err(FrontmatterError::Unclosed(format.delimiter()))
}

// =============================================================================
// YAML
// =============================================================================

fn decode_yaml(header: &str) -> Result<Metadata, FrontmatterError> {
    match serde_yaml::from_str::<serde_yaml::Value>(header)? {
        serde_yaml::Value::Null => Ok(Metadata::new()),
        serde_yaml::Value::Mapping(mapping) => yaml_mapping(mapping),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

fn yaml_mapping(mapping: serde_yaml::Mapping) -> Result<Metadata, FrontmatterError> {
    let mut metadata = Metadata::new();
    for (key, value) in mapping {
        let key = match key {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => return Err(FrontmatterError::NotAMapping),
        };
        metadata.insert(key, yaml_value(value)?);
    }
    Ok(metadata)
}

fn yaml_value(value: serde_yaml::Value) -> Result<FieldValue, FrontmatterError> {
    Ok(match value {
        serde_yaml::Value::Null => FieldValue::Null,
        serde_yaml::Value::Bool(b) => FieldValue::Bool(b),
        serde_yaml::Value::Number(n) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
        serde_yaml::Value::String(s) => FieldValue::String(s),
        serde_yaml::Value::Sequence(items) => FieldValue::List(
            items
                .into_iter()
                .map(yaml_value)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(mapping) => FieldValue::Table(yaml_mapping(mapping)?),
        serde_yaml::Value::Tagged(tagged) => yaml_value(tagged.value)?,
    })
}

// =============================================================================
// TOML
// =============================================================================

fn decode_toml(header: &str) -> Result<Metadata, FrontmatterError> {
    let table: toml::Table = toml::from_str(header)?;
    Ok(toml_table(table))
}

fn toml_table(table: toml::Table) -> Metadata {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_value(value)))
        .collect()
}

fn toml_value(value: toml::Value) -> FieldValue {
    match value {
        toml::Value::String(s) => FieldValue::String(s),
        toml::Value::Integer(i) => FieldValue::Number(i as f64),
        toml::Value::Float(f) => FieldValue::Number(f),
        toml::Value::Boolean(b) => FieldValue::Bool(b),
        // Datetime's Display is RFC 3339 shaped; a time-of-day alone stays text.
        toml::Value::Datetime(dt) => {
            let text = dt.to_string();
            FieldValue::parse_timestamp(&text).unwrap_or(FieldValue::String(text))
        }
        toml::Value::Array(items) => FieldValue::List(items.into_iter().map(toml_value).collect()),
        toml::Value::Table(table) => FieldValue::Table(toml_table(table)),
    }
}
