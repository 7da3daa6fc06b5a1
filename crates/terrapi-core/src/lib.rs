//! terrapi-core - template materialization for Terraform project scaffolding.
//!
//! Given a templates root, a style/provider pair, and a [`DataContext`], the
//! [`ProjectAssembler`] runs an ordered set of passes that copy template
//! trees into a target directory. Leaves ending in `.j2` are rendered with
//! the context; everything else is copied byte for byte.
//!
//! ```no_run
//! use terrapi_core::{
//!     AssembleOptions, NullReporter, ProjectAssembler, Provider, TemplateStyle, project_context,
//! };
//!
//! let assembler = ProjectAssembler::new("templates", &NullReporter);
//! let result = assembler.assemble(
//!     "demo".as_ref(),
//!     TemplateStyle::Standard,
//!     Provider::Aws,
//!     &project_context("demo", Provider::Aws, false),
//!     AssembleOptions::default(),
//! )?;
//! assert!(result.is_success());
//! # Ok::<(), terrapi_core::ScaffoldError>(())
//! ```

pub mod assemble;
pub mod context;
pub mod error;
pub mod layout;
pub mod materialize;
pub mod paths;
pub mod render;
pub mod report;

pub use assemble::{AssembleOptions, ProjectAssembler, project_context};
pub use context::{ContextValue, DataContext};
pub use error::{ScaffoldError, ScaffoldResult};
pub use layout::{
    ENVIRONMENTS, LayoutOptions, Pass, ProjectLayout, Provider, Selection, Step, TemplateSet,
    TemplateStyle,
};
pub use materialize::{
    FileFailure, FileMapping, FileNode, MaterializationResult, Outcome, TEMPLATE_SUFFIX,
    TreeMaterializer,
};
pub use paths::{
    ProjectTarget, TargetKind, check_target, ensure_dir, resolve_target, resolve_template_dir,
};
pub use render::TemplateRenderer;
pub use report::{Event, MemoryReporter, NullReporter, Reporter};
