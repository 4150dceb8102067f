//! The build pipeline: entry point, link flags, toolchain.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::BuildRunState;
use crate::entry::{self, EntryError};
use crate::ldflags::{EnvQuery, LinkFlagsComposer, LinkFlagsError, SystemEnvQuery};
use crate::platform::Os;
use crate::project::ProjectDescriptor;
use crate::toolchain::{Toolchain, ToolchainError};

#[derive(Debug, Error)]
pub enum BuildError {
  #[error("failed to prepare entry point")]
  Entry(#[source] EntryError),

  #[error("failed to compose link flags")]
  LinkFlags(#[source] LinkFlagsError),

  #[error("toolchain build failed")]
  Toolchain(#[source] ToolchainError),

  #[error("build cancelled")]
  Cancelled,

  #[error("build task aborted: {0}")]
  Aborted(String),
}

impl From<EntryError> for BuildError {
  fn from(err: EntryError) -> Self {
    BuildError::Entry(err)
  }
}

impl From<LinkFlagsError> for BuildError {
  fn from(err: LinkFlagsError) -> Self {
    BuildError::LinkFlags(err)
  }
}

impl From<ToolchainError> for BuildError {
  fn from(err: ToolchainError) -> Self {
    match err {
      ToolchainError::Cancelled => BuildError::Cancelled,
      other => BuildError::Toolchain(other),
    }
  }
}

/// One full build of a project.
pub struct Pipeline {
  project: Arc<ProjectDescriptor>,
  state: Arc<BuildRunState>,
  toolchain: Toolchain,
  query: Arc<dyn EnvQuery>,
  target: Os,
}

impl Pipeline {
  pub fn new(project: Arc<ProjectDescriptor>, state: Arc<BuildRunState>, toolchain: Toolchain) -> Self {
    let query = Arc::new(SystemEnvQuery::new(toolchain.program()));
    Self {
      project,
      state,
      toolchain,
      query,
      target: Os::target(),
    }
  }

  pub fn with_query(mut self, query: Arc<dyn EnvQuery>) -> Self {
    self.query = query;
    self
  }

  pub fn with_target(mut self, target: Os) -> Self {
    self.target = target;
    self
  }

  pub fn state(&self) -> &Arc<BuildRunState> {
    &self.state
  }

  /// Generate (or locate) the entry point, compose link flags and build.
  ///
  /// Returns the path of the produced binary.
  pub async fn run(&self, cancel: &CancellationToken) -> Result<PathBuf, BuildError> {
    let project = Arc::clone(&self.project);
    let state = Arc::clone(&self.state);
    let entry_file = tokio::task::spawn_blocking(move || entry::prepare_entry(&project, &state))
      .await
      .map_err(|err| BuildError::Aborted(err.to_string()))??;

    // Template functions may shell out (`go version`, `whoami`).
    let composer = LinkFlagsComposer::new(Arc::clone(&self.query), self.target.clone());
    let project = Arc::clone(&self.project);
    let ldflags = tokio::task::spawn_blocking(move || composer.compose(&project))
      .await
      .map_err(|err| BuildError::Aborted(err.to_string()))??;

    if cancel.is_cancelled() {
      debug!("cancelled before invoking toolchain");
      return Err(BuildError::Cancelled);
    }

    let output = self
      .toolchain
      .build(
        &self.project,
        &entry_file,
        &ldflags,
        &self.target,
        self.state.verbose(),
        cancel,
      )
      .await?;

    Ok(output)
  }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use crate::project::{BuildMode, Service};
  use crate::util::testutil::{fake_toolchain, read_recorded};
  use chrono::{DateTime, Local, TimeZone};
  use std::path::Path;
  use tempfile::TempDir;

  struct FixedQuery;

  impl EnvQuery for FixedQuery {
    fn compiler_version(&self) -> Option<String> {
      Some("go1.22.1".to_string())
    }

    fn author(&self) -> Option<String> {
      Some("ci".to_string())
    }

    fn hostname(&self) -> Option<String> {
      None
    }

    fn now(&self) -> DateTime<Local> {
      Local.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap()
    }
  }

  fn svc_project(source: &Path) -> ProjectDescriptor {
    let mut project = ProjectDescriptor {
      name: "svc".to_string(),
      version: "0.1.0".to_string(),
      ..Default::default()
    };
    project.build.source_path = source.to_path_buf();
    for name in ["a", "b"] {
      project.services.insert(
        name.to_string(),
        Service {
          url: "pkg/x".to_string(),
        },
      );
    }
    project
  }

  fn pipeline(project: ProjectDescriptor, toolchain: &Path, target: Os) -> Pipeline {
    Pipeline::new(
      Arc::new(project),
      Arc::new(BuildRunState::new(false)),
      Toolchain::new(toolchain),
    )
    .with_query(Arc::new(FixedQuery))
    .with_target(target)
  }

  #[tokio::test]
  async fn builds_generated_entry_with_dedup_imports() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let pipeline = pipeline(svc_project(temp.path()), &go, Os::Linux);

    let output = pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(output, PathBuf::from("svc"));
    let recorded = read_recorded(temp.path());
    let entry = pipeline.state().entry_file().unwrap().to_string_lossy().into_owned();
    assert_eq!(recorded.args[..3], ["build", "-o", "svc"]);
    assert_eq!(recorded.args.last(), Some(&entry));
    assert_eq!(recorded.cgo, "0");
    let source = recorded.entry.unwrap();
    assert_eq!(source.matches(r#"import _ "pkg/x""#).count(), 1);
  }

  #[tokio::test]
  async fn windows_target_builds_exe() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let pipeline = pipeline(svc_project(temp.path()), &go, Os::Windows);

    pipeline.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(read_recorded(temp.path()).args[2], "svc.exe");
  }

  #[tokio::test]
  async fn ldflags_and_cgo_reach_the_toolchain() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let mut project = svc_project(temp.path());
    project.toolchain.cgo = true;
    project.build.static_link = true;
    project.build.extra_flags = "-trimpath".to_string();
    project.build.link_flags_template = "-X main.Compiler={{ compiler() }}\n-X main.By={{ author() }}".to_string();

    pipeline(project, &go, Os::Linux)
      .run(&CancellationToken::new())
      .await
      .unwrap();

    let recorded = read_recorded(temp.path());
    assert_eq!(recorded.cgo, "1");
    assert_eq!(
      recorded.args[3..6],
      [
        "-trimpath",
        "-ldflags",
        "-X main.Compiler=go1.22.1 -X main.By=ci -extldflags '-static'"
      ]
    );
  }

  #[tokio::test]
  async fn origin_mode_builds_existing_main() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let mut project = svc_project(temp.path());
    project.build.mode = BuildMode::Origin;

    let pipeline = pipeline(project, &go, Os::Linux);
    pipeline.run(&CancellationToken::new()).await.unwrap();

    let recorded = read_recorded(temp.path());
    let expected = temp.path().join("main.go").to_string_lossy().into_owned();
    assert_eq!(recorded.args.last(), Some(&expected));
    assert!(!pipeline.state().artifact().unwrap().allocated);
  }

  #[tokio::test(flavor = "current_thread")]
  async fn builds_on_current_thread_runtime() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let pipeline = pipeline(svc_project(temp.path()), &go, Os::Linux);

    pipeline.run(&CancellationToken::new()).await.unwrap();

    let entry = pipeline.state().entry_file().unwrap();
    assert!(entry.starts_with(temp.path()));
    assert!(std::fs::read_to_string(entry).unwrap().contains(r#"import _ "pkg/x""#));
  }

  #[tokio::test]
  async fn entry_failure_stops_before_toolchain() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let err = pipeline(svc_project(&blocker), &go, Os::Linux)
      .run(&CancellationToken::new())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::Entry(EntryError::CreateDir { .. })));
    assert!(!temp.path().join("record/args").exists());
  }

  #[tokio::test]
  async fn template_error_stops_before_toolchain() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 0);
    let mut project = svc_project(temp.path());
    project.build.link_flags_template = "{{ broken".to_string();

    let err = pipeline(project, &go, Os::Linux)
      .run(&CancellationToken::new())
      .await
      .unwrap_err();

    assert!(matches!(err, BuildError::LinkFlags(_)));
    assert!(!temp.path().join("record/args").exists());
  }

  #[tokio::test]
  async fn toolchain_failure_is_reported() {
    let temp = TempDir::new().unwrap();
    let go = fake_toolchain(temp.path(), 1);

    let err = pipeline(svc_project(temp.path()), &go, Os::Linux)
      .run(&CancellationToken::new())
      .await
      .unwrap_err();

    assert!(matches!(
      err,
      BuildError::Toolchain(ToolchainError::Failed { code: Some(1) })
    ));
  }
}
