//! Per-invocation build state.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::consts::ENTRY_FILENAME;

/// Where the entry point of this run lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Directory the toolchain builds from.
  pub dir: PathBuf,
  /// `dir` joined with the entry file name.
  pub entry_file: PathBuf,
  /// Whether `dir` was created by this run. Only allocated directories are
  /// ever removed during cleanup.
  pub allocated: bool,
}

impl Artifact {
  pub fn allocated(dir: PathBuf) -> Self {
    Self::new(dir, true)
  }

  pub fn origin(dir: &Path) -> Self {
    Self::new(dir.to_path_buf(), false)
  }

  fn new(dir: PathBuf, allocated: bool) -> Self {
    let entry_file = dir.join(ENTRY_FILENAME);
    Self {
      dir,
      entry_file,
      allocated,
    }
  }
}

#[derive(Debug, thiserror::Error)]
#[error("artifact directory already set to {}", existing.display())]
pub struct ArtifactAlreadySet {
  pub existing: PathBuf,
}

/// State shared between the pipeline task and the lifecycle controller.
///
/// Exactly one exists per invocation. The artifact is written once by the
/// entry stage and only read afterwards.
#[derive(Debug, Default)]
pub struct BuildRunState {
  verbose: bool,
  artifact: OnceLock<Artifact>,
}

impl BuildRunState {
  pub fn new(verbose: bool) -> Self {
    Self {
      verbose,
      artifact: OnceLock::new(),
    }
  }

  pub fn verbose(&self) -> bool {
    self.verbose
  }

  /// Record the artifact for this run. Fails if one was already recorded.
  pub fn set_artifact(&self, artifact: Artifact) -> Result<(), ArtifactAlreadySet> {
    self.artifact.set(artifact).map_err(|rejected| ArtifactAlreadySet {
      existing: self.artifact_dir().map(Path::to_path_buf).unwrap_or(rejected.dir),
    })
  }

  pub fn artifact(&self) -> Option<&Artifact> {
    self.artifact.get()
  }

  /// Directory holding the entry file, empty until the entry stage ran.
  pub fn artifact_dir(&self) -> Option<&Path> {
    self.artifact().map(|a| a.dir.as_path())
  }

  pub fn entry_file(&self) -> Option<&Path> {
    self.artifact().map(|a| a.entry_file.as_path())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_empty() {
    let state = BuildRunState::new(false);
    assert!(state.artifact_dir().is_none());
    assert!(state.entry_file().is_none());
  }

  #[test]
  fn entry_file_is_inside_artifact_dir() {
    let state = BuildRunState::new(false);
    state.set_artifact(Artifact::allocated(PathBuf::from("/src/.abc"))).unwrap();

    assert_eq!(state.artifact_dir(), Some(Path::new("/src/.abc")));
    assert_eq!(state.entry_file(), Some(Path::new("/src/.abc/main.go")));
  }

  #[test]
  fn artifact_is_set_at_most_once() {
    let state = BuildRunState::new(false);
    state.set_artifact(Artifact::origin(Path::new("first"))).unwrap();

    let err = state.set_artifact(Artifact::origin(Path::new("second"))).unwrap_err();
    assert_eq!(err.existing, PathBuf::from("first"));
    assert_eq!(state.artifact_dir(), Some(Path::new("first")));
  }
}
