//! Upload the local content directory, or the generated site, to GitHub

use anyhow::Result;

use crate::config::TargetKind;
use crate::generator::is_generated;
use crate::publish::{self, collect_documents, DeployHook, DeployOutcome, Document, PublishReport};
use crate::Cardpress;

/// Documents for `publish`: the content dir under the configured content
/// path, or the whole generated site at the branch root
pub fn documents(app: &Cardpress, site: bool) -> Result<Vec<Document>> {
    let (dir, prefix) = if site {
        if !is_generated(&app.output_dir) {
            anyhow::bail!(
                "No generated site in {:?}, run `cardpress generate` first",
                app.output_dir
            );
        }
        (&app.output_dir, "")
    } else {
        (&app.content_dir, app.config.github.content_path.as_str())
    };

    let documents = collect_documents(dir, prefix)?;
    if documents.is_empty() {
        anyhow::bail!("Nothing to publish in {:?}", dir);
    }
    Ok(documents)
}

pub async fn run(
    app: &Cardpress,
    to: Option<TargetKind>,
    site: bool,
    branch: Option<&str>,
    deploy: bool,
) -> Result<PublishReport> {
    let kind = to.unwrap_or(if site {
        TargetKind::GithubTree
    } else {
        TargetKind::GithubContents
    });
    if kind == TargetKind::Local {
        anyhow::bail!("publish uploads to GitHub, use --to github-contents or --to github-tree");
    }

    let documents = documents(app, site)?;
    let branch = branch.or_else(|| site.then_some(app.config.github.site_branch.as_str()));
    let target = publish::from_config(app, kind, branch)?;

    tracing::info!("Publishing {} files to {}", documents.len(), target.name());
    let report = target.publish(&documents).await?;
    println!(
        "Published {} files ({} removed){}",
        report.written.len(),
        report.deleted.len(),
        report
            .commit
            .as_deref()
            .map(|sha| format!(" in commit {}", sha))
            .unwrap_or_default()
    );

    if deploy {
        match DeployHook::trigger_optional(app.config.deploy_hook.as_deref()).await {
            DeployOutcome::Triggered => println!("Deployment triggered"),
            DeployOutcome::Skipped => println!("No deploy hook configured"),
            DeployOutcome::Failed(e) => println!("Deployment failed: {}", e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, SiteConfig};
    use std::fs;
    use tempfile::TempDir;

    fn app(temp: &TempDir) -> Cardpress {
        Cardpress::with_config(
            temp.path().to_path_buf(),
            SiteConfig::default(),
            Credentials::default(),
        )
    }

    #[test]
    fn test_content_documents_use_content_path() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        fs::create_dir_all(app.images_dir.clone()).unwrap();
        fs::write(app.content_dir.join("a.md"), "Title: A").unwrap();
        fs::write(app.images_dir.join("a.png"), [0u8]).unwrap();

        let documents = documents(&app, false).unwrap();
        let paths: Vec<_> = documents.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["content/a.md", "content/imgs/a.png"]);
    }

    #[test]
    fn test_site_requires_generated_output() {
        let temp = TempDir::new().unwrap();
        let app = app(&temp);
        assert!(documents(&app, true).is_err());

        fs::create_dir_all(&app.output_dir).unwrap();
        fs::write(app.output_dir.join("index.html"), "<html></html>").unwrap();
        let documents = documents(&app, true).unwrap();
        assert_eq!(documents[0].path, "index.html");
    }

    #[tokio::test]
    async fn test_local_target_is_rejected() {
        let temp = TempDir::new().unwrap();
        let err = run(&app(&temp), Some(TargetKind::Local), false, None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GitHub"));
    }
}
