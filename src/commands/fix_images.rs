//! Rewrite bare image references in generated HTML

use anyhow::Result;
use std::path::Path;

use crate::images::fix_image_paths;
use crate::Cardpress;

/// Fix `dir`, or the output directory when none is given
pub fn run(app: &Cardpress, dir: Option<&Path>) -> Result<usize> {
    let dir = dir.unwrap_or(&app.output_dir);
    if !dir.is_dir() {
        anyhow::bail!("Directory {:?} not found", dir);
    }
    let changed = fix_image_paths(dir)?;
    tracing::info!("Fixed image paths in {} files under {:?}", changed, dir);
    Ok(changed)
}
