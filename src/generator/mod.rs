//! Generator module - renders the local content directory to static HTML
//!
//! Output layout:
//!
//! ```text
//! <out>/index.html
//! <out>/<slug>/index.html
//! <out>/category/<tag-slug>/index.html
//! <out>/sitemap.xml
//! <out>/imgs/...
//! ```

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::content::{Category, MarkdownRenderer, Post};
use crate::images::fix_image_paths;
use crate::templates::{CategoryData, PostData, SiteData, TagLink, TemplateRenderer};
use crate::Cardpress;

/// Posts shown in the sidebar of every page
const LATEST_POSTS: usize = 3;

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateReport {
    pub posts: usize,
    pub categories: usize,
    pub images: usize,
    /// HTML files whose image references were rewritten
    pub fixed: usize,
}

/// Static site generator using the embedded Tera templates
pub struct Generator {
    config: SiteConfig,
    images_dir: PathBuf,
    output_dir: PathBuf,
    renderer: TemplateRenderer,
    markdown: MarkdownRenderer,
}

impl Generator {
    pub fn new(app: &Cardpress) -> Result<Self> {
        Ok(Self {
            config: app.config.clone(),
            images_dir: app.images_dir.clone(),
            output_dir: app.output_dir.clone(),
            renderer: TemplateRenderer::new()?,
            markdown: MarkdownRenderer::new(),
        })
    }

    /// Generate the entire site
    pub fn generate(&self, posts: &[Post]) -> Result<GenerateReport> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create {:?}", self.output_dir))?;

        let mut sorted: Vec<Post> = posts.to_vec();
        sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));

        let categories = Category::collect(&sorted, &self.config.url);
        let post_data: Vec<PostData> = sorted.iter().map(|p| self.post_data(p)).collect();
        let site = SiteData {
            title: self.config.title.clone(),
            url: self.base_url().to_string(),
            categories: categories.iter().map(site_category).collect(),
            latest: post_data.iter().take(LATEST_POSTS).cloned().collect(),
        };

        for data in &post_data {
            let mut context = tera::Context::new();
            context.insert("site", &site);
            context.insert("post", data);
            let html = self.renderer.render("post.html", &context)?;
            self.write_page(&data.path, &html)?;
        }

        let mut context = tera::Context::new();
        context.insert("site", &site);
        context.insert("posts", &post_data);
        let html = self.renderer.render("index.html", &context)?;
        self.write_page("/", &html)?;

        for category in &categories {
            let slugs: HashSet<&str> = category
                .posts(&sorted)
                .into_iter()
                .map(|p| p.slug.as_str())
                .collect();
            let posts: Vec<&PostData> = post_data
                .iter()
                .zip(&sorted)
                .filter(|(_, post)| slugs.contains(post.slug.as_str()))
                .map(|(data, _)| data)
                .collect();
            let mut context = tera::Context::new();
            context.insert("site", &site);
            context.insert("category", &site_category(category));
            context.insert("posts", &posts);
            let html = self.renderer.render("category.html", &context)?;
            self.write_page(&category.path, &html)?;
        }

        let sitemap = sitemap(self.base_url(), &sorted, &categories);
        let sitemap_path = self.output_dir.join("sitemap.xml");
        fs::write(&sitemap_path, sitemap)
            .with_context(|| format!("Failed to write {:?}", sitemap_path))?;
        tracing::debug!("Generated: {:?}", sitemap_path);

        let images = self.copy_images()?;
        let fixed = fix_image_paths(&self.output_dir)?;

        Ok(GenerateReport {
            posts: sorted.len(),
            categories: categories.len(),
            images,
            fixed,
        })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    fn post_data(&self, post: &Post) -> PostData {
        let path = post.path();
        let summary = post
            .summary
            .clone()
            .or_else(|| self.markdown.first_paragraph(&post.body));
        // Posts synced with an embedded image already show it in the body
        let image = post
            .image
            .as_deref()
            .filter(|image| !post.body.contains(*image))
            .map(site_url);

        PostData {
            title: post.title.clone(),
            date: post.date.format("%Y-%m-%d").to_string(),
            permalink: format!("{}{}", self.base_url(), path),
            path,
            author: post.author.clone(),
            author_url: post.author_url.clone(),
            tags: tag_links(post, &self.config.url),
            summary,
            image,
            content: self.markdown.render(&post.body),
        }
    }

    /// Write `<out>/<path>/index.html`
    fn write_page(&self, path: &str, html: &str) -> Result<()> {
        let clean_path = path.trim_matches('/');
        let output_path = self.output_dir.join(clean_path).join("index.html");
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create dir {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(())
    }

    /// Copy the content images to `<out>/imgs`
    fn copy_images(&self) -> Result<usize> {
        if !self.images_dir.is_dir() {
            return Ok(0);
        }

        let dest_dir = self.output_dir.join("imgs");
        let mut copied = 0;
        for entry in WalkDir::new(&self.images_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let relative = path.strip_prefix(&self.images_dir)?;
            let dest = dest_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            copied += 1;
        }
        tracing::debug!("Copied {} images to {:?}", copied, dest_dir);
        Ok(copied)
    }
}

fn site_category(category: &Category) -> CategoryData {
    CategoryData {
        name: category.name.clone(),
        path: category.path.clone(),
        count: category.count,
    }
}

fn tag_links(post: &Post, base_url: &str) -> Vec<TagLink> {
    post.tags
        .iter()
        .enumerate()
        .filter(|(_, tag)| !tag.trim().is_empty())
        .map(|(i, tag)| TagLink {
            name: tag.clone(),
            path: Category::new(tag, base_url).path,
            color: post.colors.get(i).cloned(),
        })
        .collect()
}

/// `imgs/a.png` becomes `/imgs/a.png`; remote URLs are kept
fn site_url(reference: &str) -> String {
    if reference.contains("://") || reference.starts_with('/') {
        reference.to_string()
    } else {
        format!("/{}", reference)
    }
}

/// One `<url>` per post and per category
pub fn sitemap(base_url: &str, posts: &[Post], categories: &[Category]) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    let locs = posts
        .iter()
        .map(|p| p.path())
        .chain(categories.iter().map(|c| c.path.clone()));
    for path in locs {
        xml.push_str(&format!(
            "  <url><loc>{}</loc></url>\n",
            xml_escape(&format!("{}{}", base_url, path))
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// True when `dir` contains a generated site
pub fn is_generated(dir: &Path) -> bool {
    dir.join("index.html").is_file()
}
