//! Sync pipeline: source → normalized posts → documents → target.
//!
//! 1. Fetch every publishable post from the [`PostSource`]. A failing
//!    source aborts the run.
//! 2. Normalize each [`SourcePost`] into a [`Post`] (slug, title, date,
//!    tags, colors, summary).
//! 3. Download the post's image attachment through the source and store
//!    it under the images directory, or link the remote URL when that fails.
//! 4. Give colliding slugs a numeric suffix, newest post first. A different
//!    image under an already stored file name becomes `<slug>-<name>`.
//! 5. Render the documents and hand them to the [`PublishTarget`] in one
//!    batch. A failing target aborts the run; an empty batch is not published.
//!
//! Single-post problems are logged and collected in the [`SyncReport`].

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

use crate::config::SiteConfig;
use crate::content::slug::{extract_slug_tag, slugify};
use crate::content::{Post, PostFormat};
use crate::images::ImageResolver;
use crate::publish::{join_path, Document, PublishReport, PublishTarget};
use crate::sources::{PostSource, SourcePost};

/// How posts are normalized and rendered
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub format: PostFormat,
    /// Characters of body used as summary when none is given; 0 disables it
    pub summary_length: usize,
    /// Image directory relative to the target root
    pub images_dir: String,
    /// Prepend `![title](image)` to the body
    pub embed_image: bool,
    /// Directory of the target that receives the documents
    pub prefix: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}

impl SyncOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            format: config.format,
            summary_length: config.summary_length,
            images_dir: config.images_dir.clone(),
            embed_image: config.embed_image,
            prefix: String::new(),
        }
    }
}

/// A post that was not published
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPost {
    pub id: String,
    pub reason: String,
}

/// An image that is linked remotely because it could not be stored
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFailure {
    pub slug: String,
    pub url: String,
    pub reason: String,
}

/// Outcome of a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub source: String,
    pub target: String,
    /// Slugs of the published posts, newest first
    pub published: Vec<String>,
    pub skipped: Vec<SkippedPost>,
    pub image_failures: Vec<ImageFailure>,
    /// `None` when there was nothing to publish
    pub publish: Option<PublishReport>,
}

/// First `length` characters of the body followed by `...`
pub fn summarize(body: &str, length: usize) -> Option<String> {
    let body = body.trim();
    if length == 0 || body.is_empty() {
        return None;
    }
    let summary: String = body.chars().take(length).collect();
    Some(format!("{}...", summary))
}

/// Turn a source record into a canonical post (image not resolved yet)
pub fn normalize(source: SourcePost, options: &SyncOptions, today: NaiveDate) -> Result<Post> {
    let SourcePost {
        id,
        title,
        body,
        front_matter: fm,
        labels,
        updated,
        ..
    } = source;

    let raw_title = if title.trim().is_empty() {
        fm.title.clone().unwrap_or_default()
    } else {
        title
    };
    let (marker_slug, cleaned_title) = extract_slug_tag(&raw_title);

    if cleaned_title.is_empty() && body.trim().is_empty() {
        anyhow::bail!("post has neither title nor body");
    }

    let slug = [
        fm.slug.as_deref().map(slugify),
        marker_slug.as_deref().map(slugify),
        Some(slugify(&cleaned_title)),
        Some(slugify(&id)),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.is_empty())
    .unwrap_or_else(|| "untitled".to_string());

    let title = if cleaned_title.is_empty() {
        format!("Untitled-{}", id)
    } else {
        cleaned_title
    };

    let date = fm.parse_date().or(updated).unwrap_or(today);

    let mut post = Post::new(title, date, id);
    post.slug = slug;
    post.author = fm.author.clone();
    post.author_url = fm.author_url.clone();
    post.tags = if fm.tags.is_empty() {
        labels.iter().map(|l| l.name.clone()).collect()
    } else {
        fm.tags.clone()
    };
    post.colors = if fm.colors.is_empty() {
        labels.iter().filter_map(|l| l.color.clone()).collect()
    } else {
        fm.colors.clone()
    };
    post.summary = fm
        .summary
        .clone()
        .or_else(|| summarize(&body, options.summary_length));
    post.image = fm.image.clone();
    post.status = fm.status.clone();
    post.body = body;

    Ok(post)
}

/// Append `-2`, `-3`, ... to slugs already taken by an earlier post
pub fn dedupe_slugs<'a>(posts: impl IntoIterator<Item = &'a mut Post>) {
    let mut taken: HashSet<String> = HashSet::new();
    for post in posts {
        if taken.insert(post.slug.clone()) {
            continue;
        }
        let base = post.slug.clone();
        let mut n = 2;
        while taken.contains(&format!("{}-{}", base, n)) {
            n += 1;
        }
        post.slug = format!("{}-{}", base, n);
        tracing::warn!("Duplicate slug {:?} renamed to {:?}", base, post.slug);
        taken.insert(post.slug.clone());
    }
}

fn image_link(reference: &str) -> String {
    format!("]({})", reference)
}

/// Decide where a post's downloaded image is stored.
///
/// The first post keeps the plain file name. A later post whose image has
/// the same name but different bytes gets `<slug>-<name>` and its
/// references are rewritten; identical bytes are stored once.
fn place_image(
    post: &mut Post,
    document: Document,
    images_dir: &str,
    stored: &mut HashMap<String, Vec<u8>>,
) -> Option<Document> {
    let path = match stored.get(&document.path) {
        None => document.path.clone(),
        Some(bytes) if *bytes == document.bytes => return None,
        Some(_) => {
            let name = document.path.rsplit('/').next().unwrap_or(&document.path);
            let renamed = join_path(images_dir, &format!("{}-{}", post.slug, name));
            tracing::warn!(
                "Image {} is taken by another post, storing it as {}",
                document.path,
                renamed
            );
            post.body = post
                .body
                .replace(&image_link(&document.path), &image_link(&renamed));
            post.image = Some(renamed.clone());
            if stored.get(&renamed) == Some(&document.bytes) {
                return None;
            }
            renamed
        }
    };
    stored.insert(path.clone(), document.bytes.clone());
    Some(Document::new(path, document.bytes))
}

/// Run the pipeline once
pub async fn synchronise(
    source: &dyn PostSource,
    target: &dyn PublishTarget,
    options: &SyncOptions,
    today: NaiveDate,
) -> Result<SyncReport> {
    let mut report = SyncReport {
        source: source.name(),
        target: target.name(),
        ..SyncReport::default()
    };
    tracing::info!("Syncing {} -> {}", report.source, report.target);

    let fetched = source
        .fetch_posts()
        .await
        .with_context(|| format!("Failed to fetch posts from {}", report.source))?;
    tracing::info!("Fetched {} posts", fetched.len());

    let resolver = ImageResolver::new(options.images_dir.clone());
    let mut pending: Vec<(Post, Option<Document>)> = Vec::new();

    for item in fetched {
        let id = item.id.clone();
        let attachment = item.attachment.clone();

        let mut post = match normalize(item, options, today) {
            Ok(post) => post,
            Err(e) => {
                tracing::warn!("Skipping post {}: {}", id, e);
                report.skipped.push(SkippedPost {
                    id,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let mut document = None;
        if let Some(attachment) = attachment {
            let image = resolver.resolve(source, &attachment).await;
            if let Some(reason) = image.error {
                report.image_failures.push(ImageFailure {
                    slug: post.slug.clone(),
                    url: attachment.url.clone(),
                    reason,
                });
            }
            // Posts read back from a branch already carry the embedded link
            if options.embed_image && !post.body.contains(&image_link(&image.reference)) {
                post.body = format!("![{}]({})\n\n{}", post.title, image.reference, post.body);
            }
            post.image = Some(image.reference);
            document = image.document;
        }

        pending.push((post, document));
    }

    pending.sort_by(|a, b| b.0.date.cmp(&a.0.date));
    dedupe_slugs(pending.iter_mut().map(|(post, _)| post));

    let mut stored: HashMap<String, Vec<u8>> = HashMap::new();
    let mut posts = Vec::with_capacity(pending.len());
    let mut images = Vec::new();
    for (mut post, document) in pending {
        if let Some(document) = document {
            images.extend(place_image(&mut post, document, &options.images_dir, &mut stored));
        }
        posts.push(post);
    }

    let mut documents: Vec<Document> = posts
        .iter()
        .map(|p| Document::text(p.filename(), &p.to_markdown(options.format)))
        .collect();
    documents.extend(images);

    report.published = posts.iter().map(|p| p.slug.clone()).collect();
    let documents = with_prefix(documents, &options.prefix);

    if posts.is_empty() {
        tracing::info!("No posts to publish");
        return Ok(report);
    }

    let published = target
        .publish(&documents)
        .await
        .with_context(|| format!("Failed to publish to {}", report.target))?;
    tracing::info!(
        "Published {} posts ({} files, {} removed)",
        posts.len(),
        published.written.len(),
        published.deleted.len()
    );
    report.publish = Some(published);

    Ok(report)
}

/// Prefix every document path (GitHub targets keep posts under a directory)
pub fn with_prefix(documents: Vec<Document>, prefix: &str) -> Vec<Document> {
    documents
        .into_iter()
        .map(|d| Document::new(join_path(prefix, &d.path), d.bytes))
        .collect()
}
