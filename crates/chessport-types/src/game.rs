use std::{ops::Range, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::time_control::{TimeClass, TimeControl};

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*\[([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\]\s*$"#)
            .expect("tag pair pattern is valid")
    })
}

/// Returns `(name, value)` when `line` is a PGN tag pair such as `[Event "Live Chess"]`.
pub fn parse_tag_line(line: &str) -> Option<(&str, &str)> {
    let caps = tag_pattern().captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

pub fn is_tag_line(line: &str) -> bool {
    tag_pattern().is_match(line)
}

/// One tag pair of a record together with the byte range of its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub value: &'a str,
    value_span: Range<usize>,
}

/// A single game transcript: tag pairs followed by move text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    text: String,
}

impl GameRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Tag pairs of the header section, in source order.
    pub fn tags(&self) -> Vec<Tag<'_>> {
        let mut tags = Vec::new();
        let mut offset = 0;
        for line in self.text.split_inclusive('\n') {
            let start = offset;
            offset += line.len();
            if let Some(caps) = tag_pattern().captures(line) {
                let (Some(name), Some(value)) = (caps.get(1), caps.get(2)) else {
                    continue;
                };
                tags.push(Tag {
                    name: name.as_str(),
                    value: value.as_str(),
                    value_span: start + value.start()..start + value.end(),
                });
            } else if !line.trim().is_empty() && !tags.is_empty() {
                // Move text reached; anything bracketed after this is not a header.
                break;
            }
        }
        tags
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags()
            .into_iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value)
    }

    /// Replaces the value of an existing tag in place. Returns `false` when the tag is absent.
    pub fn set_tag(&mut self, name: &str, value: &str) -> bool {
        let Some(span) = self
            .tags()
            .into_iter()
            .find(|tag| tag.name == name)
            .map(|tag| tag.value_span)
        else {
            return false;
        };
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        self.text.replace_range(span, &escaped);
        true
    }

    pub fn time_control(&self) -> Option<TimeControl> {
        self.tag("TimeControl")?.parse().ok()
    }

    pub fn time_class(&self) -> Option<TimeClass> {
        self.time_control().map(|tc| tc.class())
    }

    /// Short label used in progress output and failure reports.
    pub fn describe(&self) -> String {
        if let Some(link) = self.tag("Link").filter(|link| !link.is_empty()) {
            return link.to_string();
        }
        let white = self.tag("White").unwrap_or("?");
        let black = self.tag("Black").unwrap_or("?");
        match self.tag("UTCDate").or_else(|| self.tag("Date")) {
            Some(date) => format!("{white} vs {black} ({date})"),
            None => format!("{white} vs {black}"),
        }
    }
}
