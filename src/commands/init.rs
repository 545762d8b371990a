//! Initialize a new cardpress site

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# cardpress configuration
# Secrets (API keys, tokens, passwords) belong in .env, not here.

# Site
title: CardPress
url: http://localhost:8000

# Directory
content_dir: blog/content
images_dir: imgs
output_dir: blog/output

# Writing
format: pelican        # pelican | front_matter
summary_length: 100    # 0 disables generated summaries
embed_image: true
prune: false

# Defaults for `cardpress sync`
sync:
  source: trello       # trello | cardpress | github
  target: local        # local | github_contents | github_tree
  deploy: false

trello:
  allowed_lists:
    - Ready to Publish
    - Published

cardpress:
  status: deployed

github:
  branch: md
  base_branch: main
  site_branch: generated-site
  content_path: content
  readme: true
"#;

const ENV_TEMPLATE: &str = r#"# Trello
TRELLO_API_KEY=
TRELLO_TOKEN=
BOARD_ID=

# CardPress Worker API
WORKER_URL=
ADMIN_EMAIL=
ADMIN_PASSWORD=

# GitHub
GITHUB_TOKEN=
GITHUB_REPO=owner/repo

# Deployment
CLOUDFLARE_DEPLOY_HOOK=
SITE_BASE_URL=
"#;

/// Create the configuration files and content directories in `target_dir`.
/// Existing files are left alone.
pub fn init_site(target_dir: &Path) -> Result<()> {
    let images_dir = target_dir.join("blog/content/imgs");
    fs::create_dir_all(&images_dir)
        .with_context(|| format!("Failed to create {:?}", images_dir))?;
    fs::create_dir_all(target_dir.join("blog/output"))?;

    write_new(&target_dir.join(CONFIG_FILE), CONFIG_TEMPLATE)?;
    write_new(&target_dir.join(".env.example"), ENV_TEMPLATE)?;

    Ok(())
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("{:?} already exists, keeping it", path);
        return Ok(());
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::info!("Created: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SiteConfig, SourceKind, TargetKind};

    #[test]
    fn test_init_creates_layout() {
        let temp = tempfile::TempDir::new().unwrap();
        init_site(temp.path()).unwrap();

        assert!(temp.path().join("blog/content/imgs").is_dir());
        assert!(temp.path().join("blog/output").is_dir());
        let env = fs::read_to_string(temp.path().join(".env.example")).unwrap();
        assert!(env.contains("TRELLO_API_KEY="));
        assert!(env.contains("CLOUDFLARE_DEPLOY_HOOK="));
    }

    #[test]
    fn test_config_template_matches_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        init_site(temp.path()).unwrap();

        let config = SiteConfig::load(temp.path().join(CONFIG_FILE)).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(config.content_dir, defaults.content_dir);
        assert_eq!(config.summary_length, defaults.summary_length);
        assert_eq!(config.trello.allowed_lists, defaults.trello.allowed_lists);
        assert_eq!(config.sync.source, SourceKind::Trello);
        assert_eq!(config.sync.target, TargetKind::Local);
        assert_eq!(config.github.site_branch, "generated-site");
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "title: Mine\n").unwrap();
        init_site(temp.path()).unwrap();
        assert_eq!(
            fs::read_to_string(temp.path().join(CONFIG_FILE)).unwrap(),
            "title: Mine\n"
        );
    }
}
