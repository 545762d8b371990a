//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::colors::split_list;

/// Accept a YAML list, a comma separated string, or nothing
fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};

    struct CommaList;

    impl<'de> Visitor<'de> for CommaList {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a comma separated string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(split_list(value))
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<serde_yaml::Value>()? {
                if let Some(s) = scalar_to_string(&item) {
                    let s = s.trim().to_string();
                    if !s.is_empty() {
                        vec.push(s);
                    }
                }
            }
            Ok(vec)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(CommaList)
}

/// Accept any YAML scalar as a string (`title: 2024` is still a title)
fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value).filter(|s| !s.trim().is_empty()))
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Front-matter of a post: a Trello card description, a GitHub content
/// file, or a local markdown file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub date: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub slug: Option<String>,
    #[serde(alias = "author-name", deserialize_with = "scalar")]
    pub author: Option<String>,
    #[serde(alias = "author-url", alias = "authorurl", deserialize_with = "scalar")]
    pub author_url: Option<String>,
    #[serde(deserialize_with = "comma_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "comma_list")]
    pub colors: Vec<String>,
    #[serde(deserialize_with = "scalar")]
    pub image: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub summary: Option<String>,
    #[serde(deserialize_with = "scalar")]
    pub status: Option<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> (Self, &str) {
        let content = content.trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        (FrontMatter::default(), content)
    }

    /// True when the text opens with a front-matter block that parses
    pub fn is_present(content: &str) -> bool {
        let (_, body) = Self::parse(content);
        body.len() != content.trim_start().len()
    }

    fn parse_yaml(content: &str) -> (Self, &str) {
        let rest = &content[3..];
        let rest = rest.trim_start_matches(['\n', '\r']);

        let Some(end_pos) = rest.find("\n---") else {
            return (FrontMatter::default(), content);
        };

        let yaml_content = &rest[..end_pos];
        let remaining = &rest[end_pos + 4..];
        let remaining = remaining.trim_start_matches(['-']);
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        if yaml_content.trim().is_empty() {
            return (FrontMatter::default(), remaining);
        }

        // Markdown horizontal rules look like front-matter delimiters; only
        // accept blocks that contain at least one `key: value` line.
        let has_yaml_structure = yaml_content.lines().any(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return false;
            }
            if let Some(colon_pos) = trimmed.find(':') {
                let before_colon = &trimmed[..colon_pos];
                let is_valid_key = !before_colon.is_empty()
                    && before_colon
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                    && before_colon != "http"
                    && before_colon != "https"
                    && before_colon != "ftp";
                if is_valid_key {
                    let after_colon = &trimmed[colon_pos + 1..];
                    return after_colon.is_empty() || after_colon.starts_with(' ');
                }
            }
            false
        });

        if !has_yaml_structure {
            return (FrontMatter::default(), content);
        }

        match serde_yaml::from_str::<FrontMatter>(yaml_content) {
            Ok(fm) => (fm, remaining),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse YAML front-matter, treating as content: {}",
                    e
                );
                (FrontMatter::default(), content)
            }
        }
    }

    /// Parse the date field
    pub fn parse_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// Parse a date or date-time string in the formats the sources emit
pub fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.fZ",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
tags:
  - rust
  - trello
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, Some("Hello World".to_string()));
        assert_eq!(fm.tags, vec!["rust", "trello"]);
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_trello_description_keys() {
        let content = "---\nslug: custom-slug\nauthor-name: Ada\nauthor-url: https://ada.dev\nimage: cover.png\n---\nBody text";

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.slug.as_deref(), Some("custom-slug"));
        assert_eq!(fm.author.as_deref(), Some("Ada"));
        assert_eq!(fm.author_url.as_deref(), Some("https://ada.dev"));
        assert_eq!(fm.image.as_deref(), Some("cover.png"));
        assert_eq!(remaining, "Body text");
    }

    #[test]
    fn test_comma_separated_tags_and_quoted_colors() {
        let content = "---\ntags: rust, web\ncolors: \"#F97316, #0EA5E9\"\n---\n";
        let (fm, _) = FrontMatter::parse(content);
        assert_eq!(fm.tags, vec!["rust", "web"]);
        assert_eq!(fm.colors, vec!["#F97316", "#0EA5E9"]);
    }

    #[test]
    fn test_numeric_title_and_extra_fields() {
        let content = "---\ntitle: 2024\nmood: happy\n---\nbody";
        let (fm, _) = FrontMatter::parse(content);
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert!(fm.extra.contains_key("mood"));
    }

    #[test]
    fn test_scalar_tags() {
        let (fm, _) = FrontMatter::parse("---\ntitle: Year\ntags: 2024\ncolors: true\n---\nbody");
        assert_eq!(fm.title.as_deref(), Some("Year"));
        assert_eq!(fm.tags, vec!["2024"]);
        assert_eq!(fm.colors, vec!["true"]);
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("Just a description");
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(remaining, "Just a description");
        assert!(!FrontMatter::is_present("Just a description"));
        assert!(FrontMatter::is_present("---\ntitle: x\n---\nbody"));
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"
---

Some random text with markdown lists:
- Item 1
- Item 2

---
More content here.
"#;

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert!(remaining.contains("Some random text"));
    }

    #[test]
    fn test_content_with_url_not_yaml() {
        let content = "---\n\nCheck out https://example.com/path\n\n---\nMore content.\n";

        let (fm, remaining) = FrontMatter::parse(content);
        assert_eq!(fm.title, None);
        assert!(remaining.contains("https://example.com"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date_string("2024-01-15"), expected);
        assert_eq!(parse_date_string("2024/01/15"), expected);
        assert_eq!(parse_date_string("2024-01-15 10:30:00"), expected);
        assert_eq!(parse_date_string("2024-01-15T10:30:00.000Z"), expected);
        assert_eq!(parse_date_string("2024-01-15T10:30:00+00:00"), expected);
        assert_eq!(parse_date_string("yesterday"), None);
    }
}
