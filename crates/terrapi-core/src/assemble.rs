//! Orchestrates the passes that produce a complete project.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::context::DataContext;
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::layout::{LayoutOptions, Pass, ProjectLayout, Provider, Selection, TemplateStyle};
use crate::materialize::{MaterializationResult, TreeMaterializer};
use crate::paths::{check_target, ensure_dir, resolve_template_dir};
use crate::report::{Event, Reporter};

/// Caller policy for one assemble call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Write into an existing target directory.
    pub overwrite: bool,
    /// Write the version-control ignore file.
    pub gitignore: bool,
}

/// Build the context the shipped templates expect.
pub fn project_context(name: &str, provider: Provider, external_modules: bool) -> DataContext {
    let mut ctx = DataContext::new();
    ctx.insert("project_name", name);
    ctx.insert("provider", provider.as_str());
    ctx.insert("external_modules", external_modules);
    ctx
}

/// Generates projects from a templates root.
pub struct ProjectAssembler<'a> {
    templates_root: PathBuf,
    materializer: TreeMaterializer,
    reporter: &'a dyn Reporter,
}

impl<'a> ProjectAssembler<'a> {
    pub fn new(templates_root: impl Into<PathBuf>, reporter: &'a dyn Reporter) -> Self {
        Self {
            templates_root: templates_root.into(),
            materializer: TreeMaterializer::new(),
            reporter,
        }
    }

    pub fn templates_root(&self) -> &Path {
        &self.templates_root
    }

    /// Generate a project into `target_root`.
    ///
    /// The target and every pass source are checked before anything is
    /// written; those failures, and an uncreatable project root, are returned
    /// as `Err`. Per-file failures, including a pass destination that cannot
    /// be created, are collected in the returned result and later passes
    /// still run. The result succeeds only if every pass succeeded. `external_modules` is read from the context and defaults
    /// to local modules when absent.
    pub fn assemble(
        &self,
        target_root: &Path,
        style: TemplateStyle,
        provider: Provider,
        context: &DataContext,
        options: AssembleOptions,
    ) -> ScaffoldResult<MaterializationResult> {
        check_target(target_root, options.overwrite)?;

        let layout = ProjectLayout::plan(
            style,
            provider,
            LayoutOptions {
                external_modules: context.flag("external_modules").unwrap_or(false),
                gitignore: options.gitignore,
            },
        );
        let sources = layout
            .passes
            .iter()
            .map(|pass| self.resolve_source(pass))
            .collect::<ScaffoldResult<Vec<_>>>()?;
        ensure_dir(target_root)?;

        self.reporter.report(&Event::Started {
            target: target_root.to_path_buf(),
            style,
            provider,
        });

        let mut total = MaterializationResult::default();
        for (pass, source) in layout.passes.iter().zip(&sources) {
            self.reporter.report(&Event::PassStarted {
                step: pass.step,
                source: pass.source.clone(),
                target: pass.target.clone(),
            });

            let dest = target_root.join(&pass.target);
            let ctx = pass.context(context);
            let result = match &pass.selection {
                Selection::Tree => self.materializer.materialize(source, &dest, &ctx)?,
                Selection::Files(mappings) => self
                    .materializer
                    .materialize_files(source, mappings, &dest, &ctx)?,
            };

            let (written_from, failed_from) = (total.written.len(), total.failures.len());
            total.absorb(result, &pass.target);
            for path in &total.written[written_from..] {
                self.reporter
                    .report(&Event::FileWritten { path: path.clone() });
            }
            for failure in &total.failures[failed_from..] {
                self.reporter.report(&Event::FileFailed {
                    path: failure.path.clone(),
                    cause: failure.cause.to_string(),
                });
            }
        }

        debug!(
            "Assembled {} ({} {}): {} written, {} failed",
            target_root.display(),
            style,
            provider,
            total.written.len(),
            total.failures.len()
        );
        self.reporter.report(&Event::Finished {
            written: total.written.len(),
            failed: total.failures.len(),
        });
        Ok(total)
    }

    /// Resolve a pass source; listed leaves must exist as well.
    fn resolve_source(&self, pass: &Pass) -> ScaffoldResult<PathBuf> {
        let dir = resolve_template_dir(&self.templates_root, &pass.source)?;
        if let Selection::Files(mappings) = &pass.selection {
            for mapping in mappings {
                let leaf = dir.join(&mapping.source);
                if !leaf.is_file() {
                    return Err(ScaffoldError::NotFound(leaf));
                }
            }
        }
        Ok(dir)
    }
}
