//! Local content directory target

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Document, PublishReport, PublishTarget};

pub struct LocalTarget {
    root: PathBuf,
    /// Remove `.md` files at the root that are not part of the batch
    prune: bool,
}

impl LocalTarget {
    pub fn new(root: impl Into<PathBuf>, prune: bool) -> Self {
        Self {
            root: root.into(),
            prune,
        }
    }

    fn prune_stale(&self, keep: &HashSet<&str>) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_file() && name.ends_with(".md") && !keep.contains(name) {
                fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
                tracing::info!("Removed stale post {:?}", path);
                deleted.push(name.to_string());
            }
        }
        deleted.sort();
        Ok(deleted)
    }
}

fn write_document(root: &Path, document: &Document) -> Result<PathBuf> {
    let path = document
        .path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(&path, &document.bytes).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}

#[async_trait]
impl PublishTarget for LocalTarget {
    fn name(&self) -> String {
        format!("local:{}", self.root.display())
    }

    async fn publish(&self, documents: &[Document]) -> Result<PublishReport> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create directory {:?}", self.root))?;

        let mut report = PublishReport::default();
        for document in documents {
            let path = write_document(&self.root, document)?;
            tracing::info!("Wrote {:?}", path);
            report.written.push(document.path.clone());
        }

        if self.prune {
            let keep: HashSet<&str> = documents
                .iter()
                .filter(|d| !d.path.contains('/'))
                .map(|d| d.path.as_str())
                .collect();
            report.deleted = self.prune_stale(&keep)?;
        }

        Ok(report)
    }
}
