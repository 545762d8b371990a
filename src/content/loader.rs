//! Content loader - reads posts back from the local content directory

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::slug::slugify;
use super::{metadata, Post};

/// Loads posts from the content directory
pub struct ContentLoader {
    content_dir: PathBuf,
}

impl ContentLoader {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    /// Load all `*.md` posts, newest first
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        if !self.content_dir.exists() {
            return Ok(Vec::new());
        }

        let mut posts = Vec::new();

        for entry in WalkDir::new(&self.content_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && is_markdown_file(path) {
                match self.load_post(path) {
                    Ok(post) => posts.push(post),
                    Err(e) => {
                        tracing::warn!("Failed to load post {:?}: {}", path, e);
                    }
                }
            }
        }

        // Sort by date descending (newest first)
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        Ok(posts)
    }

    /// Load a single post from a file
    pub fn load_post(&self, path: &Path) -> Result<Post> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let (fm, body) = metadata::parse(&content);

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let date = fm.parse_date().unwrap_or_else(|| file_date(path));
        let title = fm.title.clone().unwrap_or_else(|| stem.clone());
        let slug = fm
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&stem));
        let slug = if slug.is_empty() {
            "untitled".to_string()
        } else {
            slug
        };

        let source = path
            .strip_prefix(&self.content_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        let mut post = Post::new(title, date, source);
        post.slug = slug;
        post.author = fm.author;
        post.author_url = fm.author_url;
        post.tags = fm.tags;
        post.colors = fm.colors;
        post.image = fm.image;
        post.summary = fm.summary;
        post.status = fm.status;
        post.body = body.to_string();

        Ok(post)
    }
}

fn file_date(path: &Path) -> NaiveDate {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(|t| chrono::DateTime::<Local>::from(t).date_naive())
        .unwrap_or_else(|_| Local::now().date_naive())
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_posts_newest_first() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("old.md"),
            "Title: Old\nDate: 2023-01-01\nSlug: old\nTags: a, b\n\nOld body",
        )
        .unwrap();
        fs::write(
            temp.path().join("new.md"),
            "---\ntitle: New\ndate: 2024-06-01\n---\n\nNew body\n",
        )
        .unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(temp.path().join("imgs")).unwrap();
        fs::write(temp.path().join("imgs").join("nested.md"), "ignored").unwrap();

        let posts = ContentLoader::new(temp.path()).load_posts().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "New");
        assert_eq!(posts[0].slug, "new");
        assert_eq!(posts[1].tags, vec!["a", "b"]);
        assert_eq!(posts[1].body, "Old body");
        assert_eq!(posts[1].source, "old.md");
    }

    #[test]
    fn test_fallback_to_file_stem() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("My Draft.md");
        fs::write(&path, "Just text").unwrap();

        let post = ContentLoader::new(temp.path()).load_post(&path).unwrap();
        assert_eq!(post.title, "My Draft");
        assert_eq!(post.slug, "my-draft");
        assert_eq!(post.date, Local::now().date_naive());
    }

    #[test]
    fn test_unsluggable_name_gets_placeholder_slug() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("🚀.md");
        fs::write(&path, "Slug: ***\n\nLaunch notes").unwrap();

        let post = ContentLoader::new(temp.path()).load_post(&path).unwrap();
        assert_eq!(post.title, "🚀");
        assert_eq!(post.slug, "untitled");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let posts = ContentLoader::new(temp.path().join("nope"))
            .load_posts()
            .unwrap();
        assert!(posts.is_empty());
    }
}
