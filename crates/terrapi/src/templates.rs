//! Template style discovery.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use terrapi_core::{Provider, TemplateStyle};
use tracing::warn;
use walkdir::WalkDir;

/// A template style found on disk.
#[derive(Debug, Clone)]
pub struct StyleInfo {
    pub name: String,
    pub description: Option<String>,
    /// Providers declared by the style manifest that also have a template
    /// directory.
    pub providers: Vec<Provider>,
}

impl StyleInfo {
    /// Whether terrapi knows how to assemble this style.
    pub fn is_supported(&self) -> bool {
        self.name.parse::<TemplateStyle>().is_ok()
    }
}

/// Discover template styles in a templates root.
pub fn discover_styles(path: &Path) -> Result<Vec<StyleInfo>> {
    let mut styles = Vec::new();

    if !path.exists() {
        return Ok(styles);
    }

    for entry in WalkDir::new(path).min_depth(1).max_depth(1) {
        let entry = entry.context("reading templates directory")?;
        let path = entry.path();

        if !path.is_dir() {
            continue;
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        // Hidden directories and shared assets are not styles
        if name.starts_with('.') || name == "common" {
            continue;
        }

        styles.push(StyleInfo::read(name, path));
    }

    styles.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(styles)
}

/// Optional `template.json` at the top of a style directory.
#[derive(Debug, Default, Deserialize)]
struct StyleManifest {
    #[serde(default)]
    description: Option<String>,
    /// Providers the style claims to support. Absent means every provider
    /// with a directory.
    #[serde(default)]
    providers: Option<Vec<Provider>>,
}

impl StyleManifest {
    fn read(dir: &Path) -> Self {
        let path = dir.join("template.json");
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!("Ignoring malformed {}: {}", path.display(), err);
            Self::default()
        })
    }
}

impl StyleInfo {
    fn read(name: String, dir: &Path) -> Self {
        let manifest = StyleManifest::read(dir);
        let declared = manifest.providers.unwrap_or_else(|| Provider::ALL.to_vec());
        let providers = Provider::ALL
            .into_iter()
            .filter(|p| declared.contains(p) && dir.join(p.as_str()).is_dir())
            .collect();

        Self {
            name,
            description: manifest.description.or_else(|| readme_summary(dir)),
            providers,
        }
    }
}

/// First prose line of the style README.
fn readme_summary(dir: &Path) -> Option<String> {
    let content = std::fs::read_to_string(dir.join("README.md")).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// List available template styles.
pub fn list_templates(path: &Path) -> Result<()> {
    let styles = discover_styles(path)?;

    if styles.is_empty() {
        println!("No templates found in: {}", path.display());
        println!("\nSet the templates path via:");
        println!("  --templates <directory>");
        println!("  TERRAPI_TEMPLATES_PATH environment variable");
        println!("  templates_path in ~/.config/terrapi/config.toml");
        return Ok(());
    }

    println!("Available templates in {}:\n", path.display());
    for style in styles {
        print!("  {}", style.name);
        if let Some(desc) = &style.description {
            print!(" - {}", desc);
        }
        if !style.is_supported() {
            print!(" (unsupported)");
        }
        println!();

        if style.providers.is_empty() {
            println!("    Providers: none");
        } else {
            let names: Vec<_> = style.providers.iter().map(Provider::as_str).collect();
            println!("    Providers: {}", names.join(", "));
        }
    }

    Ok(())
}
