//! Project descriptor loading.
//!
//! The descriptor format is picked from the file suffix: `.yaml`/`.yml` or
//! `.json`. Loading normalizes the few fields that have implicit defaults, so
//! downstream stages never see an empty source path.

mod types;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use types::{BuildConfig, BuildMode, BuildSpec, ProjectDescriptor, Service, ToolchainOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse YAML config {}: {source}", path.display())]
  Yaml { path: PathBuf, source: serde_yaml::Error },

  #[error("failed to parse JSON config {}: {source}", path.display())]
  Json { path: PathBuf, source: serde_json::Error },

  #[error("unsupported config file type: {} (expected .yaml, .yml or .json)", path.display())]
  UnsupportedFormat { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
  Yaml,
  Json,
}

impl Format {
  fn from_path(path: &Path) -> Option<Self> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
      "yaml" | "yml" => Some(Format::Yaml),
      "json" => Some(Format::Json),
      _ => None,
    }
  }
}

/// Load a project descriptor from `path`.
pub fn load(path: &Path) -> Result<ProjectDescriptor, ConfigError> {
  let format = Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
    path: path.to_path_buf(),
  })?;

  let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let config = parse(&content, format).map_err(|err| err.with_path(path))?;
  debug!(path = %path.display(), project = %config.project.name, "loaded project descriptor");

  Ok(normalize(config.project))
}

/// Parse descriptor text. Exposed for callers that already hold the content.
pub fn from_yaml_str(content: &str) -> Result<ProjectDescriptor, ConfigError> {
  let config = parse(content, Format::Yaml).map_err(|err| err.with_path(Path::new("<string>")))?;
  Ok(normalize(config.project))
}

enum ParseError {
  Yaml(serde_yaml::Error),
  Json(serde_json::Error),
}

impl ParseError {
  fn with_path(self, path: &Path) -> ConfigError {
    let path = path.to_path_buf();
    match self {
      ParseError::Yaml(source) => ConfigError::Yaml { path, source },
      ParseError::Json(source) => ConfigError::Json { path, source },
    }
  }
}

fn parse(content: &str, format: Format) -> Result<BuildConfig, ParseError> {
  match format {
    // An empty YAML document is a valid (empty) descriptor.
    Format::Yaml if content.trim().is_empty() => Ok(BuildConfig::default()),
    Format::Yaml => serde_yaml::from_str(content).map_err(ParseError::Yaml),
    Format::Json => serde_json::from_str(content).map_err(ParseError::Json),
  }
}

fn normalize(mut project: ProjectDescriptor) -> ProjectDescriptor {
  if project.build.source_path.as_os_str().is_empty() {
    project.build.source_path = PathBuf::from(".");
  }
  project
}
