//! Generate the static site from the local content directory

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::Cardpress;

pub fn run(app: &Cardpress) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let posts = app.load_posts()?;
    tracing::info!("Loaded {} posts from {:?}", posts.len(), app.content_dir);

    let generator = Generator::new(app)?;
    let report = generator.generate(&posts)?;

    tracing::info!(
        "Generated {} posts and {} categories in {:.2}s",
        report.posts,
        report.categories,
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, SiteConfig};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_from_content_dir() {
        let temp = TempDir::new().unwrap();
        let app = Cardpress::with_config(
            temp.path().to_path_buf(),
            SiteConfig::default(),
            Credentials::default(),
        );
        fs::create_dir_all(&app.content_dir).unwrap();
        fs::write(
            app.content_dir.join("hello.md"),
            "Title: Hello\nDate: 2024-02-02\nSlug: hello\nTags: news\n\nHi there",
        )
        .unwrap();

        let report = run(&app).unwrap();
        assert_eq!(report.posts, 1);
        assert_eq!(report.categories, 1);
        assert!(app.output_dir.join("hello/index.html").is_file());
        assert!(app.output_dir.join("category/news/index.html").is_file());
        assert!(app.output_dir.join("sitemap.xml").is_file());
    }
}
