//! List local content

use anyhow::Result;

use crate::content::{Category, Post};
use crate::Cardpress;

/// Print posts or tag counts from the content directory
pub fn run(app: &Cardpress, content_type: &str) -> Result<()> {
    let posts = app.load_posts()?;
    match content_type {
        "post" | "posts" => {
            println!("Posts ({}):", posts.len());
            for line in post_lines(&posts) {
                println!("  {}", line);
            }
        }
        "tag" | "tags" => {
            let tags = Category::collect(&posts, &app.config.url);
            println!("Tags ({}):", tags.len());
            for tag in tags {
                println!("  {} ({})", tag.name, tag.count);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, tag", content_type);
        }
    }
    Ok(())
}

fn post_lines(posts: &[Post]) -> Vec<String> {
    posts
        .iter()
        .map(|post| {
            format!(
                "{} - {} [{}]",
                post.date.format("%Y-%m-%d"),
                post.title,
                post.source
            )
        })
        .collect()
}
