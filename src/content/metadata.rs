//! Metadata headers: Pelican `Key: value` lines or a YAML front-matter block

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FrontMatter, Post};

lazy_static! {
    static ref HEADER_LINE: Regex = Regex::new(r"^([A-Za-z][A-Za-z_-]*):[ \t]*(.*)$").unwrap();
}

/// How a post's metadata is written in front of its body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PostFormat {
    /// `Title: ...` lines, read by Pelican
    #[default]
    Pelican,
    /// `---` delimited YAML block
    FrontMatter,
}

/// Non-empty metadata fields in header order
fn fields(post: &Post) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Title", post.title.clone()),
        ("Date", post.date.format("%Y-%m-%d").to_string()),
        ("Slug", post.slug.clone()),
    ];
    let optional = [
        ("Author", post.author.clone()),
        ("Authorurl", post.author_url.clone()),
        ("Tags", Some(post.tags.join(", "))),
        ("Colors", Some(post.colors.join(", "))),
        ("Summary", post.summary.clone()),
        ("Image", post.image.clone()),
        ("Status", post.status.clone()),
    ];
    for (key, value) in optional {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            fields.push((key, value));
        }
    }
    fields
}

/// Render a post as a markdown document
pub fn render(post: &Post, format: PostFormat) -> String {
    let mut out = String::new();
    match format {
        PostFormat::Pelican => {
            for (key, value) in fields(post) {
                out.push_str(&format!("{}: {}\n", key, single_line(&value)));
            }
            out.push('\n');
            out.push_str(&post.body);
        }
        PostFormat::FrontMatter => {
            out.push_str("---\n");
            for (key, value) in fields(post) {
                out.push_str(&format!(
                    "{}: {}\n",
                    key.to_lowercase(),
                    yaml_scalar(&single_line(&value))
                ));
            }
            out.push_str("---\n\n");
            out.push_str(&post.body);
            if !post.body.ends_with('\n') {
                out.push('\n');
            }
        }
    }
    out
}

fn single_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Quote a scalar when plain YAML would read it as something else
fn yaml_scalar(value: &str) -> String {
    let reserved = ["null", "~", "true", "false", "yes", "no", "on", "off"];
    let needs_quotes = value.is_empty()
        || value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || value.starts_with(|c: char| "#&*!|>'\"%@`[]{},?-".contains(c))
        || reserved.contains(&value.to_lowercase().as_str())
        || !matches!(
            serde_yaml::from_str::<serde_yaml::Value>(value),
            Ok(serde_yaml::Value::String(ref s)) if s == value
        );
    if needs_quotes {
        serde_json::to_string(value).unwrap_or_else(|_| format!("'{}'", value.replace('\'', "''")))
    } else {
        value.to_string()
    }
}

/// Read metadata from either header style.
///
/// A document that opens with a YAML block is read as front matter,
/// otherwise leading `Key: value` lines up to the first blank line are
/// read as a Pelican header. Anything else is all body.
pub fn parse(text: &str) -> (FrontMatter, &str) {
    if FrontMatter::is_present(text) {
        return FrontMatter::parse(text);
    }
    parse_pelican(text)
}

fn parse_pelican(text: &str) -> (FrontMatter, &str) {
    let text = text.trim_start_matches(['\n', '\r']);
    let mut mapping = serde_yaml::Mapping::new();
    let mut consumed = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.trim().is_empty() {
            consumed += line.len();
            break;
        }
        let Some(caps) = HEADER_LINE.captures(trimmed) else {
            break;
        };
        mapping.insert(
            serde_yaml::Value::String(caps[1].to_lowercase()),
            serde_yaml::Value::String(caps[2].trim().to_string()),
        );
        consumed += line.len();
    }

    if mapping.is_empty() {
        return (FrontMatter::default(), text);
    }

    match serde_yaml::from_value::<FrontMatter>(serde_yaml::Value::Mapping(mapping)) {
        Ok(fm) => (fm, &text[consumed..]),
        Err(e) => {
            tracing::warn!("Failed to read metadata header, treating as content: {}", e);
            (FrontMatter::default(), text)
        }
    }
}
