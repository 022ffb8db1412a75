//! Asset loading with embedded fallbacks
//!
//! Page templates, static files and the example config are compiled into
//! the binary. When `TEMPLATES_DIR` is set, templates found there take
//! priority over the embedded ones, which lets a deployment restyle pages
//! without rebuilding.

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Embedded page templates (Tera)
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Embedded static files served under /static
#[derive(RustEmbed)]
#[folder = "static/"]
struct EmbeddedStatic;

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

/// Asset category for selective operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Templates,
    Config,
}

/// Report of init (extraction) operations
#[derive(Debug, Default)]
pub struct InitReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Asset loader with optional filesystem override for templates
pub struct AssetLoader {
    /// External templates directory (from TEMPLATES_DIR env var)
    templates_dir: Option<PathBuf>,
}

impl AssetLoader {
    /// Create a new asset loader
    ///
    /// `templates_dir` should be `Some` only if the env var was set.
    pub fn new(templates_dir: Option<PathBuf>) -> Self {
        Self { templates_dir }
    }

    /// Loader that only uses embedded assets
    pub fn embedded() -> Self {
        Self::new(None)
    }

    /// Read a template, filesystem first when configured
    pub fn read_template(&self, name: &str) -> io::Result<String> {
        if let Some(ref dir) = self.templates_dir {
            let full_path = dir.join(name);
            if full_path.exists() {
                tracing::trace!(path = %full_path.display(), "Loading template from filesystem");
                return fs::read_to_string(&full_path);
            }
        }

        let file = EmbeddedTemplates::get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("Template not found: {name}"))
        })?;
        tracing::trace!(template = %name, "Loading template from embedded assets");
        String::from_utf8(file.data.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// All template names (merged view of embedded + external)
    pub fn list_templates(&self) -> Vec<String> {
        let mut names: HashSet<String> =
            EmbeddedTemplates::iter().map(|s| s.to_string()).collect();

        if let Some(ref dir) = self.templates_dir {
            if let Ok(entries) = fs::read_dir(dir) {
                for entry in entries.flatten() {
                    if let Some(name) = entry.file_name().to_str() {
                        if name.ends_with(".html") {
                            names.insert(name.to_string());
                        }
                    }
                }
            }
        }

        let mut result: Vec<_> = names.into_iter().collect();
        result.sort();
        result
    }

    /// Static file contents, if embedded
    pub fn read_static(name: &str) -> Option<Cow<'static, [u8]>> {
        EmbeddedStatic::get(name).map(|f| f.data)
    }

    /// Extract embedded assets to filesystem (init command)
    pub fn init(&self, categories: &[AssetCategory], force: bool) -> io::Result<InitReport> {
        let mut report = InitReport::default();

        for category in categories {
            match category {
                AssetCategory::Templates => {
                    let dir = self
                        .templates_dir
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("./templates"));
                    fs::create_dir_all(&dir)?;

                    for file in EmbeddedTemplates::iter() {
                        let path = dir.join(file.as_ref());
                        if let Some(data) = EmbeddedTemplates::get(&file) {
                            write_asset(&path, &data.data, force, &mut report)?;
                        }
                    }
                }
                AssetCategory::Config => {
                    if let Some(data) = EmbeddedConfig::get("config.yaml") {
                        write_asset(Path::new("./config.yaml"), &data.data, force, &mut report)?;
                    }
                }
            }
        }

        Ok(report)
    }

    /// List embedded assets by category (for display)
    pub fn list_embedded(category: AssetCategory) -> Vec<String> {
        match category {
            AssetCategory::Templates => EmbeddedTemplates::iter().map(|s| s.to_string()).collect(),
            AssetCategory::Config => vec!["config.yaml".to_string()],
        }
    }
}

fn write_asset(path: &Path, data: &[u8], force: bool, report: &mut InitReport) -> io::Result<()> {
    if !force && path.exists() {
        report.skipped.push(path.display().to_string());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)?;
    report.written.push(path.display().to_string());
    Ok(())
}
