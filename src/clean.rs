use crate::config::Configuration;
use crate::render::WORK_DIR_PREFIX;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Work dirs changed more recently than this may belong to a running render.
const IN_USE_WINDOW: Duration = Duration::from_secs(5 * 60);

pub fn run(config: &Configuration) -> Result<()> {
    let removed = clean(
        &config.output.posts_file,
        &std::env::temp_dir(),
        IN_USE_WINDOW,
    )?;
    if removed.is_empty() {
        println!("Nothing to clean.");
    }
    for path in removed {
        println!("Removed {}", path.display());
    }
    Ok(())
}

/// Remove the posts file and every work directory under `temp_dir` that
/// hasn't been modified within `in_use`.
fn clean(posts_file: &Path, temp_dir: &Path, in_use: Duration) -> Result<Vec<PathBuf>> {
    let now = SystemTime::now();
    let mut removed = Vec::new();

    if posts_file.is_file() {
        std::fs::remove_file(posts_file)
            .with_context(|| format!("Failed to remove {}", posts_file.display()))?;
        removed.push(posts_file.to_path_buf());
    }

    let entries = std::fs::read_dir(temp_dir)
        .with_context(|| format!("Failed to list {}", temp_dir.display()))?;
    for entry in entries {
        let entry = entry?;
        let is_work_dir = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(WORK_DIR_PREFIX));
        if !is_work_dir || !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        let modified = entry.metadata()?.modified()?;
        if now.duration_since(modified).unwrap_or_default() < in_use {
            log::info!("skipping {}, it may still be in use", path.display());
            continue;
        }
        log::debug!("removing work directory {}", path.display());
        std::fs::remove_dir_all(&path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
        removed.push(path);
    }

    Ok(removed)
}
