//! Commit and push the working tree with git

use anyhow::{Context, Result};
use chrono::Local;
use std::path::Path;
use std::process::Command;

use crate::Cardpress;

/// What `commit` did
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    NothingToCommit,
    Pushed { message: String },
}

pub fn commit_message() -> String {
    format!("Update blog posts: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}

/// Run `git -C <dir> <args>`, returning stdout or failing with stderr
fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Stage everything, then commit and push if anything changed
pub fn run(app: &Cardpress) -> Result<CommitOutcome> {
    let dir = &app.base_dir;
    git(dir, &["rev-parse", "--git-dir"])
        .with_context(|| format!("{:?} is not a git repository", dir))?;

    tracing::info!("Adding changes to git");
    git(dir, &["add", "."])?;

    let status = git(dir, &["status", "--porcelain"])?;
    if status.trim().is_empty() {
        tracing::info!("No changes to commit");
        return Ok(CommitOutcome::NothingToCommit);
    }
    for line in status.lines() {
        tracing::debug!("{}", line);
    }

    let message = commit_message();
    tracing::info!("Committing with message: {}", message);
    git(dir, &["commit", "-m", &message])?;

    tracing::info!("Pushing");
    git(dir, &["push"])?;

    Ok(CommitOutcome::Pushed { message })
}
