//! Output serializers and digit-level tokenization.
//!
//! The composer produces an ordered list of named sections; this module turns
//! it into the final text in one of three layouts.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{NarrataError, Result};

/// Marker line prepended by [`digit_tokenize`]
pub const DIGITS_NOTE: &str = "<digits-split>";

// ============================================================
// OUTPUT FORMAT
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One line per section
    #[default]
    Plain,
    /// `**key**: value` lines
    MarkdownKv,
    /// Token-oriented object notation, `key: value`
    Toon,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::MarkdownKv => "markdown_kv",
            Self::Toon => "toon",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = NarrataError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(Self::Plain),
            "markdown_kv" | "structured-kv" => Ok(Self::MarkdownKv),
            "toon" | "compact-table" => Ok(Self::Toon),
            other => Err(NarrataError::UnsupportedFormat(other.to_string())),
        }
    }
}

// ============================================================
// SECTIONS
// ============================================================

/// Insertion-ordered section map
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Sections(Vec<(&'static str, String)>);

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a section, keeping its original position when it already exists.
    pub fn insert(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(&'static str, String)> for Sections {
    fn from_iter<I: IntoIterator<Item = (&'static str, String)>>(iter: I) -> Self {
        let mut sections = Sections::new();
        for (k, v) in iter {
            sections.insert(k, v);
        }
        sections
    }
}

// ============================================================
// SERIALIZERS
// ============================================================

pub fn format_sections(sections: &Sections, format: OutputFormat) -> String {
    match format {
        OutputFormat::Plain => to_plain(sections.iter().map(|(_, v)| v)),
        OutputFormat::MarkdownKv => to_markdown_kv(sections),
        OutputFormat::Toon => to_toon(sections),
    }
}

/// Non-empty lines joined with newlines
pub fn to_plain<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines.into_iter().filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n")
}

pub fn to_markdown_kv(sections: &Sections) -> String {
    sections
        .iter()
        .map(|(k, v)| format!("**{k}**: {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn to_toon(sections: &Sections) -> String {
    sections
        .iter()
        .map(|(k, v)| format!("{}: {}", toon_key(k), toon_string(v)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn toon_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if bare {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Strings stay bare unless they could be misread as another token or
/// contain structural characters.
fn toon_string(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.trim() != value
        || matches!(value, "true" | "false" | "null")
        || value.parse::<f64>().is_ok()
        || value.starts_with('-')
        || value
            .chars()
            .any(|c| matches!(c, ':' | ',' | '"' | '\\' | '[' | ']' | '{' | '}' | '#') || c.is_control());
    if needs_quotes {
        quote(value)
    } else {
        value.to_string()
    }
}

fn quote(s: &str) -> String {
    // serializing a &str cannot fail
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""))
}

// ============================================================
// DIGIT TOKENIZATION
// ============================================================

/// Put every ASCII digit in its own whitespace-separated token and collapse
/// runs of whitespace to one space. With `add_note` the result is prefixed by
/// a marker line.
pub fn digit_tokenize(text: &str, add_note: bool) -> String {
    let mut spaced = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if c.is_ascii_digit() {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    let tokenized = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if add_note {
        format!("{DIGITS_NOTE}\n{tokenized}")
    } else {
        tokenized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(pairs: &[(&'static str, &str)]) -> Sections {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert_eq!("structured-kv".parse::<OutputFormat>().unwrap(), OutputFormat::MarkdownKv);
        assert_eq!("compact-table".parse::<OutputFormat>().unwrap(), OutputFormat::Toon);
        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err, NarrataError::UnsupportedFormat("invalid".into()));
        assert_eq!(err.to_string(), "Unsupported output format: invalid");
    }

    #[test]
    fn test_plain_skips_empty_lines() {
        assert_eq!(to_plain(["a", "", "b"]), "a\nb");
        assert_eq!(format_sections(&sections(&[("summary", "s"), ("sparkline", "p")]), OutputFormat::Plain), "s\np");
    }

    #[test]
    fn test_markdown_kv_preserves_order() {
        let s = sections(&[("summary", "x"), ("sparkline", "y")]);
        assert_eq!(format_sections(&s, OutputFormat::MarkdownKv), "**summary**: x\n**sparkline**: y");
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut s = sections(&[("a", "1"), ("b", "2")]);
        s.insert("a", "3");
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(s.get("a"), Some("3"));
    }

    #[test]
    fn test_toon_quoting() {
        let s = sections(&[("summary", "x"), ("regime", "Regime: Uptrend"), ("n", "42"), ("e", "")]);
        assert_eq!(
            format_sections(&s, OutputFormat::Toon),
            "summary: x\nregime: \"Regime: Uptrend\"\nn: \"42\"\ne: \"\""
        );
        assert_eq!(to_toon(&sections(&[("multi", "a\nb")])), "multi: \"a\\nb\"");
    }

    #[test]
    fn test_digit_tokenize() {
        assert_eq!(digit_tokenize("Price: 171.24", true), "<digits-split>\nPrice: 1 7 1 . 2 4");
        assert_eq!(digit_tokenize("A  10  B", true), "<digits-split>\nA 1 0 B");
        assert_eq!(digit_tokenize("No numbers here.", false), "No numbers here.");
        assert_eq!(digit_tokenize("RSI(14):", false), "RSI( 1 4 ):");
    }
}
