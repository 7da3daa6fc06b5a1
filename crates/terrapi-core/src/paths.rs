//! Source and destination path resolution.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{ScaffoldError, ScaffoldResult};

/// How the user's project argument was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A bare name, resolved against the working directory.
    Name,
    /// An explicit path; its final segment is the display name.
    Path,
}

/// A resolved destination for a generated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTarget {
    /// Display name of the project.
    pub name: String,
    /// Absolute destination directory.
    pub path: PathBuf,
    pub kind: TargetKind,
}

/// Resolve a template identifier such as `standard/aws` under `base`.
///
/// The result is absolute and is guaranteed to be a readable directory.
pub fn resolve_template_dir(base: &Path, template_id: &str) -> ScaffoldResult<PathBuf> {
    let joined = base.join(template_id);
    let path = std::path::absolute(&joined).map_err(|e| ScaffoldError::io(&joined, e))?;
    let path = normalize(&path);

    match fs::read_dir(&path) {
        Ok(_) => {
            debug!("Resolved template {} to {}", template_id, path.display());
            Ok(path)
        }
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Err(ScaffoldError::NotFound(path))
        }
        Err(e) => Err(ScaffoldError::io(path, e)),
    }
}

/// Resolve the project argument into an absolute destination.
///
/// Inputs containing a path separator, and the relative references `.` and
/// `..`, are treated as paths; everything else is a bare project name
/// created under `cwd`.
pub fn resolve_target(input: &str, cwd: &Path, overwrite: bool) -> ScaffoldResult<ProjectTarget> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ScaffoldError::InvalidTarget(
            "project name is required".to_string(),
        ));
    }

    let kind = if input.contains('/') || input.contains('\\') || matches!(input, "." | "..") {
        TargetKind::Path
    } else {
        TargetKind::Name
    };

    let path = normalize(&cwd.join(input));
    let name = match kind {
        TargetKind::Name => input.to_string(),
        TargetKind::Path => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ScaffoldError::InvalidTarget(format!("{input} has no final path segment"))
            })?,
    };

    check_target(&path, overwrite)?;

    Ok(ProjectTarget { name, path, kind })
}

/// Refuse an existing destination unless overwriting is permitted.
pub fn check_target(path: &Path, overwrite: bool) -> ScaffoldResult<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(ScaffoldError::io(path, e)),
    };

    if !overwrite {
        return Err(ScaffoldError::AlreadyExists(path.to_path_buf()));
    }
    if !meta.is_dir() {
        return Err(ScaffoldError::InvalidTarget(format!(
            "{} exists and is not a directory",
            path.display()
        )));
    }
    Ok(())
}

/// Create a directory and its parents. Existing directories are fine.
///
/// `.` components are dropped first; `create_dir_all` rejects a path ending
/// in `.` whose parent does not exist yet.
pub fn ensure_dir(path: &Path) -> ScaffoldResult<()> {
    let path: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    fs::create_dir_all(&path).map_err(|e| ScaffoldError::io(&path, e))
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
