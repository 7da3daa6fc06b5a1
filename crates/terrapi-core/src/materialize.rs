//! Recursive copy-and-render of template trees.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::context::DataContext;
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::paths::ensure_dir;
use crate::render::TemplateRenderer;

/// Suffix marking a leaf that must be rendered. It is stripped from the
/// destination name.
pub const TEMPLATE_SUFFIX: &str = ".j2";

/// One entry of a template tree, relative to the tree root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    Directory {
        relative: PathBuf,
    },
    Leaf {
        relative: PathBuf,
        /// Destination path with the template marker removed.
        destination: PathBuf,
        template: bool,
    },
}

impl FileNode {
    pub fn classify(relative: &Path, is_dir: bool) -> Self {
        if is_dir {
            return FileNode::Directory {
                relative: relative.to_path_buf(),
            };
        }
        let (destination, template) = strip_marker(relative);
        FileNode::Leaf {
            relative: relative.to_path_buf(),
            destination,
            template,
        }
    }

    pub fn relative(&self) -> &Path {
        match self {
            FileNode::Directory { relative } | FileNode::Leaf { relative, .. } => relative,
        }
    }
}

/// Remove [`TEMPLATE_SUFFIX`] from the final path segment if present.
fn strip_marker(path: &Path) -> (PathBuf, bool) {
    let stripped = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(TEMPLATE_SUFFIX))
        .filter(|n| !n.is_empty());

    match stripped {
        Some(name) => (path.with_file_name(name), true),
        None => (path.to_path_buf(), false),
    }
}

/// Explicit source leaf to destination mapping used for role-based passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
    /// Leaf path relative to the pass source directory.
    pub source: PathBuf,
    /// Output path relative to the pass destination directory.
    pub destination: PathBuf,
}

impl FileMapping {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Map a leaf onto its own name minus the template marker.
    pub fn same(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let (destination, _) = strip_marker(&source);
        Self {
            source,
            destination,
        }
    }

    pub fn is_template(&self) -> bool {
        strip_marker(&self.source).1
    }
}

/// A per-file failure. `path` is relative to the materialization root.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub cause: ScaffoldError,
}

/// Overall classification of a [`MaterializationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing failed.
    Complete,
    /// Some files were written, some failed.
    Partial,
    /// Every attempted file failed.
    Failed,
}

/// Files written and files that failed during one or more passes.
///
/// Paths are relative to the destination root the result describes.
#[derive(Debug, Default)]
pub struct MaterializationResult {
    pub written: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

impl MaterializationResult {
    /// True when no file failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn outcome(&self) -> Outcome {
        match (self.written.is_empty(), self.failures.is_empty()) {
            (_, true) => Outcome::Complete,
            (false, false) => Outcome::Partial,
            (true, false) => Outcome::Failed,
        }
    }

    /// Merge `other`, rebasing its paths under `subdir`.
    pub fn absorb(&mut self, other: MaterializationResult, subdir: &Path) {
        self.written
            .extend(other.written.into_iter().map(|p| rebase(subdir, p)));
        self.failures
            .extend(other.failures.into_iter().map(|f| FileFailure {
                path: rebase(subdir, f.path),
                cause: f.cause,
            }));
    }

    fn record(&mut self, path: PathBuf, outcome: ScaffoldResult<()>) {
        match outcome {
            Ok(()) => self.written.push(path),
            Err(cause) => {
                debug!("Failed to materialize {}: {}", path.display(), cause);
                self.failures.push(FileFailure { path, cause });
            }
        }
    }
}

fn rebase(subdir: &Path, path: PathBuf) -> PathBuf {
    if subdir.as_os_str().is_empty() || subdir == Path::new(".") {
        path
    } else if path.as_os_str().is_empty() {
        subdir.to_path_buf()
    } else {
        subdir.join(path)
    }
}

/// Copies template trees into a destination, rendering marked leaves.
#[derive(Default)]
pub struct TreeMaterializer {
    renderer: TemplateRenderer,
}

impl TreeMaterializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_renderer(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// Materialize the whole tree under `source` into `dest`.
    ///
    /// Entries are visited in lexicographic order. Per-entry errors are
    /// collected in the result and siblings keep processing. An uncreatable
    /// `dest` is recorded as a single failure at the tree root; only an
    /// unreadable `source` is returned as `Err`.
    pub fn materialize(
        &self,
        source: &Path,
        dest: &Path,
        context: &DataContext,
    ) -> ScaffoldResult<MaterializationResult> {
        check_source(source)?;

        let mut result = MaterializationResult::default();
        if let Err(cause) = ensure_dir(dest) {
            result.record(PathBuf::new(), Err(cause));
            return Ok(result);
        }
        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| relative_to(source, p))
                        .unwrap_or_default();
                    let io_path = source.join(&path);
                    result.record(path, Err(ScaffoldError::io(io_path, err.into())));
                    continue;
                }
            };

            let relative = relative_to(source, entry.path());
            match FileNode::classify(&relative, entry.file_type().is_dir()) {
                FileNode::Directory { relative } => {
                    if let Err(cause) = ensure_dir(&dest.join(&relative)) {
                        result.record(relative, Err(cause));
                    }
                }
                FileNode::Leaf {
                    relative,
                    destination,
                    template,
                } => {
                    let outcome =
                        self.write_leaf(source, &relative, dest, &destination, template, context);
                    result.record(destination, outcome);
                }
            }
        }

        debug!(
            "Materialized {} -> {}: {} written, {} failed",
            source.display(),
            dest.display(),
            result.written.len(),
            result.failures.len()
        );
        Ok(result)
    }

    /// Materialize only the listed leaves of `source` into `dest`.
    pub fn materialize_files(
        &self,
        source: &Path,
        mappings: &[FileMapping],
        dest: &Path,
        context: &DataContext,
    ) -> ScaffoldResult<MaterializationResult> {
        check_source(source)?;

        // Each leaf creates its own parent, so an uncreatable `dest` fails
        // per mapping.
        let mut result = MaterializationResult::default();
        for mapping in mappings {
            let outcome = self.write_leaf(
                source,
                &mapping.source,
                dest,
                &mapping.destination,
                mapping.is_template(),
                context,
            );
            result.record(mapping.destination.clone(), outcome);
        }
        Ok(result)
    }

    fn write_leaf(
        &self,
        source_root: &Path,
        relative: &Path,
        dest_root: &Path,
        destination: &Path,
        template: bool,
        context: &DataContext,
    ) -> ScaffoldResult<()> {
        let src = source_root.join(relative);
        let dst = dest_root.join(destination);
        if let Some(parent) = dst.parent() {
            ensure_dir(parent)?;
        }

        if template {
            let body = fs::read_to_string(&src).map_err(|e| ScaffoldError::io(&src, e))?;
            let name = relative.to_string_lossy();
            let rendered = self.renderer.render_named(&name, &body, context)?;
            fs::write(&dst, rendered).map_err(|e| ScaffoldError::io(&dst, e))
        } else {
            fs::copy(&src, &dst)
                .map(|_| ())
                .map_err(|e| ScaffoldError::io(&dst, e))
        }
    }
}

/// The source root must be a readable directory; anything else is fatal.
fn check_source(source: &Path) -> ScaffoldResult<()> {
    match fs::read_dir(source) {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Err(ScaffoldError::NotFound(source.to_path_buf()))
        }
        Err(e) => Err(ScaffoldError::io(source, e)),
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx() -> DataContext {
        let mut ctx = DataContext::new();
        ctx.insert("project_name", "demo");
        ctx.insert("provider", "aws");
        ctx
    }

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn classify_strips_marker() {
        let node = FileNode::classify(Path::new("env/main.tf.j2"), false);
        assert_eq!(
            node,
            FileNode::Leaf {
                relative: PathBuf::from("env/main.tf.j2"),
                destination: PathBuf::from("env/main.tf"),
                template: true,
            }
        );

        let node = FileNode::classify(Path::new("README.md"), false);
        assert!(matches!(node, FileNode::Leaf { template: false, .. }));

        // A bare marker has nothing left to name the output.
        let node = FileNode::classify(Path::new(".j2"), false);
        assert!(matches!(node, FileNode::Leaf { template: false, .. }));
    }

    #[test]
    fn renders_templates_and_copies_plain_files() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "main.tf.j2", b"# {{ project_name }}\n");
        write(src.path(), "nested/deep/notes.txt", b"plain {{ not_rendered }}\n");

        let result = TreeMaterializer::new()
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();

        assert!(result.is_success());
        assert_eq!(
            result.written,
            vec![
                PathBuf::from("main.tf"),
                PathBuf::from("nested/deep/notes.txt")
            ]
        );
        assert_eq!(
            fs::read_to_string(dst.path().join("main.tf")).unwrap(),
            "# demo\n"
        );
        assert!(!dst.path().join("main.tf.j2").exists());
    }

    #[test]
    fn verbatim_copy_preserves_bytes() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let bytes: Vec<u8> = (0u8..=255).collect();
        write(src.path(), "blob.bin", &bytes);

        TreeMaterializer::new()
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();

        assert_eq!(fs::read(dst.path().join("blob.bin")).unwrap(), bytes);
    }

    #[test]
    fn one_bad_template_does_not_block_siblings() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "a.tf.j2", b"{{ project_name }}");
        write(src.path(), "b.tf.j2", b"{{ missing_key }}");
        write(src.path(), "c.txt", b"plain");
        write(src.path(), "d/e.tf.j2", b"{{ provider }}");

        let result = TreeMaterializer::new()
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();

        assert_eq!(result.written.len(), 3);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, PathBuf::from("b.tf"));
        assert!(matches!(
            result.failures[0].cause,
            ScaffoldError::Render { .. }
        ));
        assert_eq!(result.outcome(), Outcome::Partial);
        assert!(!dst.path().join("b.tf").exists());
    }

    #[test]
    fn all_failures_is_failed_outcome() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "only.tf.j2", b"{{ nope }}");

        let result = TreeMaterializer::new()
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();
        assert_eq!(result.outcome(), Outcome::Failed);
    }

    #[test]
    fn missing_source_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = TreeMaterializer::new()
            .materialize(&tmp.path().join("absent"), &tmp.path().join("out"), &ctx())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::NotFound(_)));
    }

    #[test]
    fn empty_directories_are_created() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("modules/empty")).unwrap();

        let result = TreeMaterializer::new()
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();
        assert!(result.is_success());
        assert!(result.written.is_empty());
        assert!(dst.path().join("modules/empty").is_dir());
    }

    #[test]
    fn rerun_into_existing_tree_succeeds() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "dir/file.tf.j2", b"{{ provider }}");
        let materializer = TreeMaterializer::new();

        materializer
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();
        let again = materializer
            .materialize(src.path(), dst.path(), &ctx())
            .unwrap();
        assert!(again.is_success());
    }

    #[test]
    fn file_mappings_rename_outputs() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "main-local.tf.j2", b"module \"{{ project_name }}\" {}\n");
        write(src.path(), "main-external.tf.j2", b"unused\n");

        let mappings = [FileMapping::new("main-local.tf.j2", "main.tf")];
        let result = TreeMaterializer::new()
            .materialize_files(src.path(), &mappings, dst.path(), &ctx())
            .unwrap();

        assert_eq!(result.written, vec![PathBuf::from("main.tf")]);
        assert_eq!(
            fs::read_to_string(dst.path().join("main.tf")).unwrap(),
            "module \"demo\" {}\n"
        );
        assert!(!dst.path().join("main-external.tf").exists());
    }

    #[test]
    fn missing_mapped_file_is_recorded() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();

        let mappings = [FileMapping::same("outputs.tf.j2")];
        let result = TreeMaterializer::new()
            .materialize_files(src.path(), &mappings, dst.path(), &ctx())
            .unwrap();
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].path, PathBuf::from("outputs.tf"));
    }

    #[test]
    fn absorb_rebases_paths() {
        let mut total = MaterializationResult::default();
        let part = MaterializationResult {
            written: vec![PathBuf::from("dev.tfvars")],
            failures: vec![],
        };
        total.absorb(part, Path::new("config"));
        total.absorb(
            MaterializationResult {
                written: vec![PathBuf::from("main.tf")],
                failures: vec![],
            },
            Path::new("."),
        );

        assert_eq!(
            total.written,
            vec![PathBuf::from("config/dev.tfvars"), PathBuf::from("main.tf")]
        );
    }

    #[test]
    fn uncreatable_destination_is_a_recorded_failure() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "env.hcl.j2", b"{{ provider }}\n");
        write(src.path(), "dev.tfvars.j2", b"{{ provider }}\n");
        fs::write(dst.path().join("config"), "occupied").unwrap();
        let materializer = TreeMaterializer::new();

        let tree = materializer
            .materialize(src.path(), &dst.path().join("config"), &ctx())
            .unwrap();
        assert_eq!(tree.outcome(), Outcome::Failed);
        assert_eq!(tree.failures.len(), 1);
        assert_eq!(tree.failures[0].path, PathBuf::new());

        let mappings = [FileMapping::same("dev.tfvars.j2")];
        let files = materializer
            .materialize_files(src.path(), &mappings, &dst.path().join("config"), &ctx())
            .unwrap();
        assert_eq!(files.failures.len(), 1);
        assert_eq!(files.failures[0].path, PathBuf::from("dev.tfvars"));
        assert!(matches!(files.failures[0].cause, ScaffoldError::Io { .. }));
    }

    #[test]
    fn absorb_names_failed_tree_root_by_its_subdir() {
        let mut total = MaterializationResult::default();
        let mut part = MaterializationResult::default();
        part.record(
            PathBuf::new(),
            Err(ScaffoldError::NotFound(PathBuf::from("x"))),
        );
        total.absorb(part, Path::new("live/dev"));

        assert_eq!(total.failures[0].path, PathBuf::from("live/dev"));
    }
}
