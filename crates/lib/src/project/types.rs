//! Project descriptor types.
//!
//! These mirror the layout of the descriptor file. A descriptor is immutable
//! once loaded; every stage of the build pipeline only reads from it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root of a descriptor file. Everything lives under the `project` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
  #[serde(default)]
  pub project: ProjectDescriptor,
}

/// A project to build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDescriptor {
  pub name: String,
  pub version: String,
  pub build: BuildSpec,
  /// Toolchain options (`go:` in the descriptor).
  #[serde(rename = "go")]
  pub toolchain: ToolchainOptions,
  /// Services linked into the generated entry point, keyed by service name.
  pub services: BTreeMap<String, Service>,
}

/// How the entry point is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
  /// Generate `main.go` into a fresh hidden directory.
  #[default]
  Default,
  /// Build the `main.go` already present in the source path.
  Origin,
}

impl<'de> Deserialize<'de> for BuildMode {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    // Anything other than "origin" (including an empty string) means generate.
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value.as_deref().map(str::trim) {
      Some(mode) if mode.eq_ignore_ascii_case("origin") => BuildMode::Origin,
      _ => BuildMode::Default,
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSpec {
  #[serde(rename = "type")]
  pub mode: BuildMode,
  /// Directory the entry point is built from.
  #[serde(rename = "path")]
  pub source_path: PathBuf,
  #[serde(rename = "static")]
  pub static_link: bool,
  /// Raw arguments appended to `go build`, separated by whitespace.
  #[serde(rename = "flags")]
  pub extra_flags: String,
  /// Template rendered into `-ldflags`.
  #[serde(rename = "ldflags")]
  pub link_flags_template: String,
  #[serde(rename = "ext_ldflags")]
  pub extra_linker_flags: Vec<String>,
  #[serde(rename = "delete_build_file")]
  pub delete_artifacts_after_build: bool,
}

impl Default for BuildSpec {
  fn default() -> Self {
    Self {
      mode: BuildMode::Default,
      source_path: PathBuf::from("."),
      static_link: false,
      extra_flags: String::new(),
      link_flags_template: String::new(),
      extra_linker_flags: Vec::new(),
      delete_artifacts_after_build: false,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainOptions {
  pub cgo: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
  pub url: String,
}
