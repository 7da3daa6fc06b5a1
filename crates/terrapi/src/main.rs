//! terrapi - scaffold Terraform and Terragrunt projects from templates.
//!
//! ## Usage
//!
//! ```bash
//! # Create a standard AWS project in ./my-project
//! terrapi init my-project
//!
//! # Pick provider and style
//! terrapi init my-project --provider=azure --style=terragrunt
//!
//! # Use registry modules instead of generating local ones
//! terrapi init infra/network --provider=gcp --external-modules
//!
//! # List available templates
//! terrapi templates
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use terrapi_core::{Provider, TemplateStyle};

mod config;
mod generators;
mod git;
mod reporter;
mod templates;

/// Project name used when none is given.
const DEFAULT_PROJECT_NAME: &str = "terraform-project";

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .init();

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(cli: Cli) -> Result<()> {
    let scaffold_config = config::ScaffoldConfig::load()?;

    match cli.command {
        Command::Init(args) => {
            let project = args.into_project_config(&scaffold_config)?;
            let summary = generators::create_project(&project)?;
            generators::print_summary(&summary, &project);
        }
        Command::Templates {
            templates: explicit,
        } => {
            let path = scaffold_config.templates_path(explicit.as_deref());
            templates::list_templates(&path)?;
        }
        Command::Config { example } => {
            if example {
                println!("{}", config::ScaffoldConfig::example_config());
            } else {
                show_config(&scaffold_config);
            }
        }
    }

    Ok(())
}

fn show_config(config: &config::ScaffoldConfig) {
    println!("Current terrapi configuration:\n");

    println!("Config file locations (in priority order):");
    println!("  1. TERRAPI_CONFIG env var");
    println!("  2. ~/.config/terrapi/config.toml");
    println!("  3. /etc/terrapi/config.toml");
    println!("  4. Built-in defaults\n");

    let path = config.templates_path(None);
    println!("Templates path: {}", path.display());
    if path.exists() {
        println!("  (exists)");
    } else {
        println!("  (not found)");
    }

    let defaults = config.defaults();
    println!("\nDefaults:");
    println!("  provider: {}", defaults.provider);
    println!("  style: {}", defaults.style);
    println!("  external_modules: {}", defaults.external_modules);
    println!("  git_init: {}", defaults.git_init);

    println!("\nRun 'terrapi config --example' to see a full example config.");
}

#[derive(Parser, Debug)]
#[command(
    name = "terrapi",
    author,
    version,
    about = "Scaffold Terraform and Terragrunt projects from templates",
    after_help = "Examples:\n  \
        terrapi init my-project --provider=aws\n  \
        terrapi init infra/network --provider=gcp --style=terragrunt --external-modules\n  \
        terrapi templates"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize a new Terraform project
    Init(InitArgs),

    /// List available templates
    Templates {
        /// Path to templates directory (defaults to configured path)
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Show or generate configuration
    Config {
        /// Print example configuration file
        #[arg(long)]
        example: bool,
    },
}

#[derive(Debug, Args)]
struct InitArgs {
    /// Project name or path
    name: Option<String>,

    /// Cloud provider
    #[arg(short, long)]
    provider: Option<Provider>,

    /// Template style
    #[arg(short, long)]
    style: Option<TemplateStyle>,

    /// Use external modules instead of local modules
    #[arg(long, conflicts_with = "local_modules")]
    external_modules: bool,

    /// Generate local modules (overrides the configured default)
    #[arg(long)]
    local_modules: bool,

    /// Initialize a new git repository
    #[arg(long, conflicts_with = "no_git")]
    git_init: bool,

    /// Skip git initialization
    #[arg(long)]
    no_git: bool,

    /// Force overwrite existing directory
    #[arg(short, long)]
    force: bool,

    /// Path to templates directory (defaults to configured path)
    #[arg(long, env = "TERRAPI_TEMPLATES_PATH")]
    templates: Option<PathBuf>,
}

impl InitArgs {
    /// Fill unset flags from the configuration defaults.
    fn into_project_config(
        self,
        scaffold_config: &config::ScaffoldConfig,
    ) -> Result<generators::ProjectConfig> {
        let defaults = scaffold_config.defaults();
        let cwd = std::env::current_dir().context("reading current directory")?;

        Ok(generators::ProjectConfig {
            name: self
                .name
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            provider: self.provider.unwrap_or(defaults.provider),
            style: self.style.unwrap_or(defaults.style),
            external_modules: pick(
                self.external_modules,
                self.local_modules,
                defaults.external_modules,
            ),
            init_git: pick(self.git_init, self.no_git, defaults.git_init),
            force: self.force,
            templates_root: scaffold_config.templates_path(self.templates.as_deref()),
            cwd,
        })
    }
}

/// Resolve a `--flag` / `--no-flag` pair against a default.
fn pick(on: bool, off: bool, default: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn init_args(argv: &[&str]) -> InitArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Init(args) => args,
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn init_uses_config_defaults() {
        let args = init_args(&["terrapi", "init"]);
        let project = args
            .into_project_config(&config::ScaffoldConfig::default())
            .unwrap();

        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        assert_eq!(project.provider, Provider::Aws);
        assert_eq!(project.style, TemplateStyle::Standard);
        assert!(!project.external_modules);
        assert!(project.init_git);
        assert!(!project.force);
    }

    #[test]
    fn init_flags_override_defaults() {
        let args = init_args(&[
            "terrapi",
            "init",
            "infra/app",
            "--provider",
            "gcp",
            "--style",
            "terragrunt",
            "--external-modules",
            "--no-git",
            "--force",
        ]);
        let project = args
            .into_project_config(&config::ScaffoldConfig::default())
            .unwrap();

        assert_eq!(project.name, "infra/app");
        assert_eq!(project.provider, Provider::Gcp);
        assert_eq!(project.style, TemplateStyle::Terragrunt);
        assert!(project.external_modules);
        assert!(!project.init_git);
        assert!(project.force);
    }

    #[test]
    fn conflicting_flags_are_rejected() {
        assert!(
            Cli::try_parse_from(["terrapi", "init", "--git-init", "--no-git"]).is_err()
        );
        assert!(
            Cli::try_parse_from([
                "terrapi",
                "init",
                "--external-modules",
                "--local-modules"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["terrapi", "init", "--provider", "oracle"]).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["terrapi", "init", "demo", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn pick_prefers_explicit_flags() {
        assert!(pick(true, false, false));
        assert!(!pick(false, true, true));
        assert!(pick(false, false, true));
    }
}
