//! Run the sync pipeline from the configured source to the configured target

use anyhow::Result;
use chrono::Local;

use crate::config::{SourceKind, TargetKind};
use crate::publish::{self, DeployHook, DeployOutcome};
use crate::sources;
use crate::sync::{synchronise, SyncOptions, SyncReport};
use crate::Cardpress;

/// Sync options resolved against `cardpress.yml`
pub fn options_for(app: &Cardpress, target: TargetKind) -> SyncOptions {
    let mut options = SyncOptions::from_config(&app.config);
    if target != TargetKind::Local {
        options.prefix = app.config.github.content_path.clone();
    }
    options
}

/// Sync once; flags override the `sync` section of the config
pub async fn run(
    app: &Cardpress,
    from: Option<SourceKind>,
    to: Option<TargetKind>,
    deploy: bool,
) -> Result<SyncReport> {
    let from = from.unwrap_or(app.config.sync.source);
    let to = to.unwrap_or(app.config.sync.target);

    let source = sources::from_config(app, from).await?;
    let target = publish::from_config(app, to, None)?;
    let options = options_for(app, to);

    let report = synchronise(
        source.as_ref(),
        target.as_ref(),
        &options,
        Local::now().date_naive(),
    )
    .await?;

    for skipped in &report.skipped {
        println!("Skipped {}: {}", skipped.id, skipped.reason);
    }
    for failure in &report.image_failures {
        println!("Image for {} linked remotely: {}", failure.slug, failure.reason);
    }
    println!(
        "Synced {} posts from {} to {}",
        report.published.len(),
        report.source,
        report.target
    );

    if report.publish.is_some() && (deploy || app.config.sync.deploy) {
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
    use std::path::PathBuf;

    fn app() -> Cardpress {
        Cardpress::with_config(
            PathBuf::from("/tmp/site"),
            SiteConfig::default(),
            Credentials::default(),
        )
    }

    #[test]
    fn test_github_targets_write_under_content_path() {
        let app = app();
        assert_eq!(options_for(&app, TargetKind::Local).prefix, "");
        assert_eq!(options_for(&app, TargetKind::GithubContents).prefix, "content");
        assert_eq!(options_for(&app, TargetKind::GithubTree).prefix, "content");
    }

    #[tokio::test]
    async fn test_missing_credentials_abort() {
        let err = run(&app(), Some(SourceKind::Trello), Some(TargetKind::Local), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TRELLO_API_KEY"));
    }
}
