//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use terrapi_core::{Provider, TemplateStyle};
use tracing::debug;

/// System-wide config file, read first.
const SYSTEM_CONFIG: &str = "/etc/terrapi/config.toml";

/// Environment variable pointing at a config file.
const CONFIG_ENV: &str = "TERRAPI_CONFIG";

/// Environment variable overriding the templates directory.
const TEMPLATES_ENV: &str = "TERRAPI_TEMPLATES_PATH";

/// Complete terrapi configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScaffoldConfig {
    /// Templates directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates_path: Option<String>,

    /// Defaults for `terrapi init` flags that were not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,
}

/// Default answers for a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default = "default_style")]
    pub style: TemplateStyle,
    #[serde(default)]
    pub external_modules: bool,
    #[serde(default = "default_true")]
    pub git_init: bool,
}

fn default_provider() -> Provider {
    Provider::Aws
}

fn default_style() -> TemplateStyle {
    TemplateStyle::Standard
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            style: default_style(),
            external_modules: false,
            git_init: true,
        }
    }
}

impl ScaffoldConfig {
    /// Load configuration from files and environment.
    ///
    /// Later files override earlier ones, field by field:
    /// 1. /etc/terrapi/config.toml
    /// 2. ~/.config/terrapi/config.toml
    /// 3. the file named by TERRAPI_CONFIG, which must exist when set
    pub fn load() -> Result<Self> {
        Self::load_files(&Self::config_files()?)
    }

    /// Existing config files, lowest priority first.
    fn config_files() -> Result<Vec<PathBuf>> {
        let candidates = [Some(PathBuf::from(SYSTEM_CONFIG)), Self::user_config_path()];
        let mut files: Vec<PathBuf> = candidates
            .into_iter()
            .flatten()
            .filter(|path| path.is_file())
            .collect();

        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = expand(&env_path);
            anyhow::ensure!(
                path.is_file(),
                "{CONFIG_ENV} points at a missing config file: {}",
                path.display()
            );
            files.push(path);
        }
        Ok(files)
    }

    fn load_files(files: &[PathBuf]) -> Result<Self> {
        files.iter().try_fold(Self::default(), |config, path| {
            debug!("Loading config from {}", path.display());
            Ok(Self::merge(config, Self::load_file(path)?))
        })
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join("terrapi").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn merge(base: Self, overlay: Self) -> Self {
        Self {
            templates_path: overlay.templates_path.or(base.templates_path),
            defaults: overlay.defaults.or(base.defaults),
        }
    }

    /// Effective defaults, falling back to the built-in ones.
    pub fn defaults(&self) -> Defaults {
        self.defaults.clone().unwrap_or_default()
    }

    /// Resolve the templates directory.
    ///
    /// An explicit path wins, then TERRAPI_TEMPLATES_PATH, then the config
    /// file, then an installed data directory, then the templates shipped
    /// alongside the workspace.
    pub fn templates_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return expand(&path.to_string_lossy());
        }

        if let Ok(path) = std::env::var(TEMPLATES_ENV) {
            return expand(&path);
        }

        if let Some(path) = &self.templates_path {
            return expand(path);
        }

        if let Some(installed) = dirs_next::data_dir().map(|p| p.join("terrapi").join("templates"))
            && installed.is_dir()
        {
            return installed;
        }

        bundled_templates()
    }

    /// Generate an example configuration file.
    pub fn example_config() -> String {
        let config = Self {
            templates_path: Some("~/.local/share/terrapi/templates".to_string()),
            defaults: Some(Defaults::default()),
        };
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

/// Templates shipped with the binary.
///
/// An installed binary looks for `templates/` beside itself or in
/// `../share/terrapi/templates`; a binary run from the build tree falls back
/// to the workspace copy.
fn bundled_templates() -> PathBuf {
    bundled_templates_near(std::env::current_exe().ok().as_deref())
}

fn bundled_templates_near(exe: Option<&Path>) -> PathBuf {
    let workspace = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("templates");

    exe.and_then(Path::parent)
        .into_iter()
        .flat_map(|dir| {
            [
                dir.join("templates"),
                dir.join("..").join("share").join("terrapi").join("templates"),
            ]
        })
        .find(|candidate| candidate.is_dir())
        .unwrap_or(workspace)
}
