//! Template sets and the passes that make up a generated project.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::{ContextValue, DataContext};
use crate::materialize::FileMapping;

/// Environments that receive their own configuration.
pub const ENVIRONMENTS: [&str; 3] = ["dev", "staging", "prod"];

/// Template holding the provider-agnostic ignore file.
const COMMON_DIR: &str = "common";

/// Target cloud platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Amazon Web Services
    Aws,
    /// Microsoft Azure
    Azure,
    /// Google Cloud Platform
    Gcp,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Aws, Provider::Azure, Provider::Gcp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Azure => "azure",
            Provider::Gcp => "gcp",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Aws => "AWS (Amazon Web Services)",
            Provider::Azure => "Azure (Microsoft Azure)",
            Provider::Gcp => "GCP (Google Cloud Platform)",
        }
    }

    /// Module generated when local modules are requested.
    pub fn default_module(&self) -> &'static str {
        match self {
            Provider::Aws => "vpc",
            Provider::Azure => "resource_group",
            Provider::Gcp => "vpc",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown provider: {s} (expected aws, azure or gcp)"))
    }
}

/// Family of project layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TemplateStyle {
    /// Plain Terraform root module with per-environment tfvars
    Standard,
    /// Terragrunt live tree with one directory per environment
    Terragrunt,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 2] = [TemplateStyle::Standard, TemplateStyle::Terragrunt];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStyle::Standard => "standard",
            TemplateStyle::Terragrunt => "terragrunt",
        }
    }
}

impl fmt::Display for TemplateStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateStyle::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown template style: {s} (expected standard or terragrunt)"))
    }
}

/// Source subtree names for one style/provider pair, relative to the
/// templates root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSet {
    pub style: TemplateStyle,
    pub provider: Provider,
}

impl TemplateSet {
    pub fn new(style: TemplateStyle, provider: Provider) -> Self {
        Self { style, provider }
    }

    /// `<style>/<provider>`
    pub fn provider_dir(&self) -> String {
        format!("{}/{}", self.style, self.provider)
    }

    /// `<style>/modules/<provider>`
    pub fn modules_dir(&self) -> String {
        format!("{}/modules/{}", self.style, self.provider)
    }
}

/// Assembly step a pass belongs to, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Root,
    Environments,
    Modules,
    VersionControl,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Root => "root files",
            Step::Environments => "environment config",
            Step::Modules => "local modules",
            Step::VersionControl => "version control",
        };
        f.write_str(label)
    }
}

/// What a pass copies out of its source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every entry, recursively.
    Tree,
    /// Only the listed leaves.
    Files(Vec<FileMapping>),
}

/// One materialization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    pub step: Step,
    /// Template identifier relative to the templates root.
    pub source: String,
    /// Destination relative to the project root.
    pub target: PathBuf,
    pub selection: Selection,
    /// Keys added to the caller's context for this pass only.
    pub overrides: Vec<(String, ContextValue)>,
}

impl Pass {
    fn new(step: Step, source: String, target: impl Into<PathBuf>, selection: Selection) -> Self {
        Self {
            step,
            source,
            target: target.into(),
            selection,
            overrides: Vec::new(),
        }
    }

    fn with_override(mut self, key: &str, value: impl Into<ContextValue>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Context for this pass: the caller's values plus overrides.
    pub fn context(&self, base: &DataContext) -> DataContext {
        let mut ctx = base.clone();
        for (key, value) in &self.overrides {
            ctx.insert(key.clone(), value.clone());
        }
        ctx
    }
}

/// Layout switches decided by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    pub external_modules: bool,
    pub gitignore: bool,
}

/// The ordered passes that produce one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub set: TemplateSet,
    pub passes: Vec<Pass>,
}

impl ProjectLayout {
    pub fn plan(style: TemplateStyle, provider: Provider, options: LayoutOptions) -> Self {
        let set = TemplateSet::new(style, provider);
        let mut passes = match style {
            TemplateStyle::Standard => standard_passes(&set, options),
            TemplateStyle::Terragrunt => terragrunt_passes(&set),
        };

        if !options.external_modules {
            passes.push(module_pass(&set));
        }

        if options.gitignore {
            passes.push(Pass::new(
                Step::VersionControl,
                COMMON_DIR.to_string(),
                ".",
                Selection::Files(vec![FileMapping::new("gitignore", ".gitignore")]),
            ));
        }

        Self { set, passes }
    }
}

fn standard_passes(set: &TemplateSet, options: LayoutOptions) -> Vec<Pass> {
    let main = if options.external_modules {
        "main-external.tf.j2"
    } else {
        "main-local.tf.j2"
    };

    let root = Pass::new(
        Step::Root,
        set.provider_dir(),
        ".",
        Selection::Files(vec![
            FileMapping::same("versions.tf.j2"),
            FileMapping::same("providers.tf.j2"),
            FileMapping::same("backend.tf.j2"),
            FileMapping::new(main, "main.tf"),
            FileMapping::same("variables.tf.j2"),
            FileMapping::same("outputs.tf.j2"),
        ]),
    );

    let mut passes = vec![root];
    for env in ENVIRONMENTS {
        passes.push(
            Pass::new(
                Step::Environments,
                set.provider_dir(),
                "config",
                Selection::Files(vec![FileMapping::new(
                    "config.tfvars.j2",
                    format!("{env}.tfvars"),
                )]),
            )
            .with_override("environment", env),
        );
    }
    passes
}

fn terragrunt_passes(set: &TemplateSet) -> Vec<Pass> {
    let base = set.provider_dir();
    let mut passes = vec![Pass::new(
        Step::Root,
        format!("{base}/root"),
        ".",
        Selection::Tree,
    )];
    for env in ENVIRONMENTS {
        passes.push(
            Pass::new(
                Step::Environments,
                format!("{base}/environment"),
                PathBuf::from("live").join(env),
                Selection::Tree,
            )
            .with_override("environment", env),
        );
    }
    passes
}

fn module_pass(set: &TemplateSet) -> Pass {
    let module = set.provider.default_module();
    Pass::new(
        Step::Modules,
        set.modules_dir(),
        PathBuf::from("modules").join(module),
        Selection::Files(
            ["main", "variables", "outputs"]
                .into_iter()
                .map(|role| FileMapping::new(format!("{module}-{role}.tf.j2"), format!("{role}.tf")))
                .collect(),
        ),
    )
    .with_override("module_name", module)
}
