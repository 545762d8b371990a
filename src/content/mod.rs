//! Content module - posts, metadata headers and markdown

pub mod colors;
mod frontmatter;
mod loader;
mod markdown;
pub mod metadata;
mod post;
pub mod slug;

pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::ContentLoader;
pub use markdown::MarkdownRenderer;
pub use metadata::PostFormat;
pub use post::{Category, Post};
