//! Entry point generation.
//!
//! Renders `main.go` for a project and writes it into a freshly allocated,
//! hidden directory under the project's source path:
//! - one blank import per distinct service URL
//! - directory name `.<uuid>`, so concurrent builds of the same source path
//!   never share a directory
//!
//! In origin mode nothing is rendered or created; the `main.go` already in the
//! source path is used as is.

mod templates;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, ErrorKind, context};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::build::{Artifact, ArtifactAlreadySet, BuildRunState};
use crate::project::{BuildMode, ProjectDescriptor};

pub use templates::MAIN_GO_TEMPLATE;

#[derive(Debug, Error)]
pub enum EntryError {
  #[error("failed to render entry point template: {0}")]
  Template(#[from] minijinja::Error),

  #[error("failed to create build directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed writing entry file to temp dir {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },

  #[error(transparent)]
  State(#[from] ArtifactAlreadySet),
}

/// Distinct service URLs in first occurrence order.
///
/// Services are visited in name order; a URL referenced by several services
/// is only kept the first time it is seen.
pub fn service_imports(project: &ProjectDescriptor) -> Vec<&str> {
  let mut seen = HashSet::new();
  project
    .services
    .values()
    .map(|service| service.url.as_str())
    .filter(|url| !url.is_empty() && seen.insert(*url))
    .collect()
}

/// Quote `value` as a Go interpreted string literal.
///
/// JSON string escapes are a subset of Go's, so the JSON encoding of a string
/// is always a valid Go literal for the same bytes.
pub fn go_quote(value: &str) -> Result<String, minijinja::Error> {
  serde_json::to_string(value)
    .map_err(|err| minijinja::Error::new(ErrorKind::InvalidOperation, "cannot quote value").with_source(err))
}

/// Render the entry point source for `project`.
pub fn render_entry(project: &ProjectDescriptor) -> Result<String, EntryError> {
  let mut env = Environment::new();
  env.set_keep_trailing_newline(true);
  env.add_filter("goquote", go_quote);
  env.add_template("main.go", MAIN_GO_TEMPLATE)?;

  let rendered = env.get_template("main.go")?.render(context! {
    name => project.name,
    version => project.version,
    imports => service_imports(project),
  })?;

  Ok(rendered)
}

/// Name of a fresh hidden build directory under `source_path`.
pub fn unique_build_dir(source_path: &Path) -> PathBuf {
  source_path.join(format!(".{}", Uuid::new_v4()))
}

/// Resolve the entry file for this run and record it in `state`.
///
/// Generates `main.go` unless the project is in origin mode. Returns the
/// entry file path.
pub fn prepare_entry(project: &ProjectDescriptor, state: &BuildRunState) -> Result<PathBuf, EntryError> {
  match project.build.mode {
    BuildMode::Origin => {
      let artifact = Artifact::origin(&project.build.source_path);
      let entry_file = artifact.entry_file.clone();
      debug!(entry = %entry_file.display(), "origin mode, using existing entry file");
      state.set_artifact(artifact)?;
      Ok(entry_file)
    }
    BuildMode::Default => generate_entry(project, state),
  }
}

/// Render `main.go` and write it into a newly allocated directory.
pub fn generate_entry(project: &ProjectDescriptor, state: &BuildRunState) -> Result<PathBuf, EntryError> {
  let content = render_entry(project)?;

  let dir = unique_build_dir(&project.build.source_path);
  fs::create_dir_all(&dir).map_err(|source| EntryError::CreateDir {
    path: dir.clone(),
    source,
  })?;

  write_entry(dir, content, state)
}

/// Record `dir` as this run's artifact and write `content` to its `main.go`.
fn write_entry(dir: PathBuf, content: String, state: &BuildRunState) -> Result<PathBuf, EntryError> {
  // Recorded before writing so cleanup still finds the directory if the
  // write fails.
  let artifact = Artifact::allocated(dir);
  let entry_file = artifact.entry_file.clone();
  state.set_artifact(artifact)?;

  if state.verbose() {
    println!("{content}");
  }

  fs::write(&entry_file, content).map_err(|source| EntryError::WriteFile {
    path: entry_file.clone(),
    source,
  })?;

  info!(entry = %entry_file.display(), "generated entry point");
  Ok(entry_file)
}
