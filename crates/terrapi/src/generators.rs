//! Project creation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use terrapi_core::{
    AssembleOptions, ProjectAssembler, ProjectTarget, Provider, TemplateStyle, project_context,
    resolve_target,
};
use tracing::{debug, warn};

use crate::git;
use crate::reporter::TracingReporter;

/// Everything needed to create one project.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    /// Project name or path as given by the user.
    pub name: String,
    pub provider: Provider,
    pub style: TemplateStyle,
    pub external_modules: bool,
    pub init_git: bool,
    /// Allow writing into an existing directory.
    pub force: bool,
    pub templates_root: PathBuf,
    /// Directory bare project names are created in.
    pub cwd: PathBuf,
}

/// What was created, for the final summary.
#[derive(Debug)]
pub struct ProjectSummary {
    pub target: ProjectTarget,
    pub files_written: usize,
    pub git_initialized: bool,
}

/// Create a new project from the configured templates.
pub fn create_project(config: &ProjectConfig) -> Result<ProjectSummary> {
    let target = resolve_target(&config.name, &config.cwd, config.force)
        .with_context(|| format!("resolving project target {:?}", config.name))?;

    debug!("Project name: {}", target.name);
    debug!("Project path: {}", target.path.display());
    debug!("Provider: {}", config.provider);
    debug!("Style: {}", config.style);
    debug!("External modules: {}", config.external_modules);
    debug!("Git init: {}", config.init_git);

    let context = project_context(&target.name, config.provider, config.external_modules);
    let reporter = TracingReporter;
    let result = ProjectAssembler::new(&config.templates_root, &reporter)
        .assemble(
            &target.path,
            config.style,
            config.provider,
            &context,
            AssembleOptions {
                overwrite: config.force,
                gitignore: config.init_git,
            },
        )
        .with_context(|| format!("generating project in {}", target.path.display()))?;

    if !result.is_success() {
        for failure in &result.failures {
            eprintln!("  {}: {}", failure.path.display(), failure.cause);
        }
        anyhow::bail!(
            "{} of {} files could not be generated in {}",
            result.failures.len(),
            result.failures.len() + result.written.len(),
            target.path.display()
        );
    }

    let mut git_initialized = false;
    if config.init_git {
        match git::init(&target.path) {
            Ok(()) => git_initialized = true,
            Err(err) => {
                warn!("Failed to initialize git repository: {err:#}");
                warn!("You can initialize git manually by running: git init");
            }
        }
    }

    Ok(ProjectSummary {
        target,
        files_written: result.written.len(),
        git_initialized,
    })
}

/// Print the result and the commands to run next.
pub fn print_summary(summary: &ProjectSummary, config: &ProjectConfig) {
    println!();
    println!("Project {} initialized!", summary.target.name);
    println!();
    println!("  - Template copied ({} style)", config.style);
    println!("  - {} Terraform files generated", summary.files_written);
    if summary.git_initialized {
        println!("  - Git repository initialized");
    }
    println!();

    println!("Next steps:");
    let dir = display_dir(&summary.target.path, &config.cwd);
    println!("  cd {dir:<28} Enter your project directory");
    match config.style {
        TemplateStyle::Standard => {
            println!("  {:<31} Initialize Terraform providers and modules", "terraform init");
            println!("  {:<31} Preview infrastructure changes", "terraform plan");
        }
        TemplateStyle::Terragrunt => {
            println!("  {:<31} Enter the dev environment", "cd live/dev");
            println!("  {:<31} Preview infrastructure changes", "terragrunt run-all plan");
        }
    }
    println!();
    println!(
        "Stuck? Configure your {} credentials first.",
        config.provider.as_str().to_uppercase()
    );
}

fn display_dir(path: &Path, cwd: &Path) -> String {
    path.strip_prefix(cwd)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(cwd: &Path, name: &str) -> ProjectConfig {
        ProjectConfig {
            name: name.to_string(),
            provider: Provider::Aws,
            style: TemplateStyle::Standard,
            external_modules: false,
            init_git: false,
            force: false,
            templates_root: Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates"),
            cwd: cwd.to_path_buf(),
        }
    }

    #[test]
    fn creates_project_under_cwd() {
        let tmp = TempDir::new().unwrap();
        let summary = create_project(&config(tmp.path(), "demo")).unwrap();

        assert_eq!(summary.target.name, "demo");
        assert_eq!(summary.files_written, 12);
        assert!(!summary.git_initialized);
        assert!(tmp.path().join("demo/modules/vpc/main.tf").is_file());
    }

    #[test]
    fn path_argument_names_project_after_last_segment() {
        let tmp = TempDir::new().unwrap();
        let summary = create_project(&config(tmp.path(), "infra/network")).unwrap();

        assert_eq!(summary.target.name, "network");
        let vars = std::fs::read_to_string(tmp.path().join("infra/network/variables.tf")).unwrap();
        assert!(vars.contains("default     = \"network\""));
    }

    #[test]
    fn existing_directory_needs_force() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("demo")).unwrap();

        assert!(create_project(&config(tmp.path(), "demo")).is_err());

        let mut forced = config(tmp.path(), "demo");
        forced.force = true;
        assert!(create_project(&forced).is_ok());
    }

    #[test]
    fn missing_templates_root_fails() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), "demo");
        cfg.templates_root = tmp.path().join("no-templates");

        let err = create_project(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("template not found"));
        assert!(!tmp.path().join("demo").exists());
    }

    #[test]
    fn display_dir_is_relative_to_cwd() {
        assert_eq!(
            display_dir(Path::new("/work/demo"), Path::new("/work")),
            "demo"
        );
        assert_eq!(
            display_dir(Path::new("/elsewhere/demo"), Path::new("/work")),
            "/elsewhere/demo"
        );
    }
}
