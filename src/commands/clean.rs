//! Clean the output directory

use anyhow::{Context, Result};
use std::fs;

use crate::Cardpress;

/// Delete the generated site; returns false when there was nothing to delete
pub fn run(app: &Cardpress) -> Result<bool> {
    if !app.output_dir.exists() {
        tracing::info!("Nothing to clean in {:?}", app.output_dir);
        return Ok(false);
    }
    fs::remove_dir_all(&app.output_dir)
        .with_context(|| format!("Failed to delete {:?}", app.output_dir))?;
    tracing::info!("Deleted: {:?}", app.output_dir);
    Ok(true)
}
