//! Version control initialization.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Run `git init` inside `path`.
pub fn init(path: &Path) -> Result<()> {
    debug!("Running git init in {}", path.display());

    let output = Command::new("git")
        .arg("init")
        .arg("--quiet")
        .current_dir(path)
        .output()
        .context("failed to run git init")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git init failed: {}", stderr.trim());
    }

    info!("Initialized git repository in {}", path.display());
    Ok(())
}
