//! Post and Category models

use chrono::NaiveDate;
use serde::Serialize;

use super::metadata::{self, PostFormat};
use super::slug::slugify;

/// A blog post in its canonical form, whatever source it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date
    pub date: NaiveDate,

    /// Slug (URL-friendly name, also the file stem)
    pub slug: String,

    pub author: Option<String>,
    pub author_url: Option<String>,

    /// Post tags, also used as categories by the generator
    pub tags: Vec<String>,

    /// Hex colors, one per tag when they come from labels
    pub colors: Vec<String>,

    /// `imgs/<file>` when the image was stored next to the content,
    /// otherwise a remote URL
    pub image: Option<String>,

    pub summary: Option<String>,
    pub status: Option<String>,

    /// Raw markdown content
    pub body: String,

    /// Where the post was read from (card id, file path, ...)
    pub source: String,
}

impl Post {
    /// Create a new post with minimal required fields
    pub fn new(title: impl Into<String>, date: NaiveDate, source: impl Into<String>) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            title,
            date,
            slug,
            author: None,
            author_url: None,
            tags: Vec::new(),
            colors: Vec::new(),
            image: None,
            summary: None,
            status: None,
            body: String::new(),
            source: source.into(),
        }
    }

    /// File name inside the content directory
    pub fn filename(&self) -> String {
        format!("{}.md", self.slug)
    }

    /// Render metadata header and body
    pub fn to_markdown(&self, format: PostFormat) -> String {
        metadata::render(self, format)
    }

    /// Site-relative path of the rendered page
    pub fn path(&self) -> String {
        format!("/{}/", self.slug)
    }
}

/// A category (tag) with its post count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub path: String,
    pub permalink: String,
    pub count: usize,
}

impl Category {
    pub fn new(name: &str, base_url: &str) -> Self {
        let slug = slugify(name);
        let path = format!("/category/{}/", slug);
        let permalink = format!("{}{}", base_url.trim_end_matches('/'), path);
        Self {
            name: name.to_string(),
            slug,
            path,
            permalink,
            count: 0,
        }
    }

    /// Group posts by tag, most used first, ties by name
    pub fn collect(posts: &[Post], base_url: &str) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for tag in posts.iter().flat_map(|p| p.tags.iter()) {
            let slug = slugify(tag);
            if slug.is_empty() {
                continue;
            }
            match categories.iter_mut().find(|c| c.slug == slug) {
                Some(category) => category.count += 1,
                None => {
                    let mut category = Category::new(tag, base_url);
                    category.count = 1;
                    categories.push(category);
                }
            }
        }
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        categories
    }

    /// Posts carrying this category
    pub fn posts<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        posts
            .iter()
            .filter(|p| p.tags.iter().any(|t| slugify(t) == self.slug))
            .collect()
    }
}
