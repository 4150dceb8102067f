//! Link flag composition.
//!
//! The `ldflags` template of a project is rendered with MiniJinja. Besides the
//! project fields (`name`, `version`, `build`, `go`, `services`) it can call:
//!
//! - `compiler()`: toolchain version string
//! - `datetime(layout)`: current local time, strftime layout
//! - `author()`: user running the build
//! - `hostname()`: build host name
//!
//! Each rendered line becomes one flag. Static linking policy and `ext_ldflags`
//! are appended as a single `-extldflags '...'` fragment.

mod query;

use std::fmt::Write;
use std::sync::Arc;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use thiserror::Error;
use tracing::debug;

use crate::platform::Os;
use crate::project::{BuildSpec, ProjectDescriptor};

pub use query::{EnvQuery, SystemEnvQuery, command_output};

/// External linker flag requesting a fully static binary.
pub const STATIC_MARKER: &str = "-static";

#[derive(Debug, Error)]
pub enum LinkFlagsError {
  #[error("failed to render ldflags template: {0}")]
  Template(#[from] minijinja::Error),
}

pub struct LinkFlagsComposer {
  query: Arc<dyn EnvQuery>,
  target: Os,
}

impl LinkFlagsComposer {
  pub fn new(query: Arc<dyn EnvQuery>, target: Os) -> Self {
    Self { query, target }
  }

  /// Compose the full `-ldflags` value for `project`. May be empty.
  pub fn compose(&self, project: &ProjectDescriptor) -> Result<String, LinkFlagsError> {
    let mut fragments = self.render_template(project)?;

    let ext = external_linker_flags(&project.build, &self.target);
    if !ext.is_empty() {
      fragments.push(format!("-extldflags '{}'", ext.join(" ")));
    }

    let flags = fragments.join(" ");
    debug!(ldflags = %flags, target = %self.target, "composed link flags");
    Ok(flags)
  }

  /// Render the project's ldflags template into one fragment per line.
  pub fn render_template(&self, project: &ProjectDescriptor) -> Result<Vec<String>, LinkFlagsError> {
    let template = &project.build.link_flags_template;
    if template.trim().is_empty() {
      return Ok(Vec::new());
    }

    let env = self.environment();
    let rendered = env.render_str(template, project)?;

    Ok(
      rendered
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  fn environment(&self) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);

    let query = Arc::clone(&self.query);
    env.add_function("compiler", move || query.compiler_version().unwrap_or_default());

    let query = Arc::clone(&self.query);
    env.add_function("datetime", move |layout: String| format_datetime(query.as_ref(), &layout));

    let query = Arc::clone(&self.query);
    env.add_function("author", move || query.author().unwrap_or_default());

    let query = Arc::clone(&self.query);
    env.add_function("hostname", move || query.hostname().unwrap_or_default());

    env
  }
}

fn format_datetime(query: &dyn EnvQuery, layout: &str) -> Result<String, minijinja::Error> {
  let mut out = String::new();
  write!(out, "{}", query.now().format(layout)).map_err(|_| {
    minijinja::Error::new(
      ErrorKind::InvalidOperation,
      format!("invalid datetime layout: {layout:?}"),
    )
  })?;
  Ok(out)
}

/// External linker flags after applying the static linking policy.
///
/// `-static` is added when static linking is requested, the target OS allows
/// it, and it is not already present.
pub fn external_linker_flags(spec: &BuildSpec, target: &Os) -> Vec<String> {
  let mut flags = spec.extra_linker_flags.clone();
  if spec.static_link && !target.disallows_static_linking() && !flags.iter().any(|f| f == STATIC_MARKER) {
    flags.push(STATIC_MARKER.to_string());
  }
  flags
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{DateTime, Local, TimeZone};

  struct FakeQuery {
    compiler: Option<&'static str>,
    author: Option<&'static str>,
  }

  impl EnvQuery for FakeQuery {
    fn compiler_version(&self) -> Option<String> {
      self.compiler.map(str::to_string)
    }

    fn author(&self) -> Option<String> {
      self.author.map(str::to_string)
    }

    fn hostname(&self) -> Option<String> {
      Some("buildbox".to_string())
    }

    fn now(&self) -> DateTime<Local> {
      Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }
  }

  fn composer(target: Os) -> LinkFlagsComposer {
    let query = FakeQuery {
      compiler: Some("go version go1.22.1 linux/amd64"),
      author: Some("henry"),
    };
    LinkFlagsComposer::new(Arc::new(query), target)
  }

  fn project(template: &str) -> ProjectDescriptor {
    let mut project = ProjectDescriptor {
      name: "svc".to_string(),
      version: "1.4.0".to_string(),
      ..Default::default()
    };
    project.build.link_flags_template = template.to_string();
    project
  }

  #[test]
  fn blank_template_contributes_nothing() {
    assert_eq!(composer(Os::Linux).compose(&project("  \n\t ")).unwrap(), "");
  }

  #[test]
  fn template_functions_and_fields() {
    let template = r#"-X 'main.Version={{ version }}'
-X 'main.Compiler={{ compiler() }}'
-X 'main.BuildTime={{ datetime("%Y-%m-%d %H:%M") }}'
-X main.Author={{ author() }}
-X main.Host={{ hostname() }}
"#;
    let flags = composer(Os::Linux).compose(&project(template)).unwrap();

    assert_eq!(
      flags,
      "-X 'main.Version=1.4.0' -X 'main.Compiler=go version go1.22.1 linux/amd64' \
       -X 'main.BuildTime=2024-03-09 14:05' -X main.Author=henry -X main.Host=buildbox"
    );
  }

  #[test]
  fn composition_is_deterministic() {
    let template = "-X main.Name={{ name }}\n-X main.Time={{ datetime(\"%s\") }}";
    let mut p = project(template);
    p.build.static_link = true;

    let first = composer(Os::Linux).compose(&p).unwrap();
    let second = composer(Os::Linux).compose(&p).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn failed_queries_render_empty() {
    let query = FakeQuery {
      compiler: None,
      author: None,
    };
    let composer = LinkFlagsComposer::new(Arc::new(query), Os::Linux);

    let flags = composer
      .compose(&project("-X main.C={{ compiler() }}\n-X main.A={{ author() }}"))
      .unwrap();
    assert_eq!(flags, "-X main.C= -X main.A=");
  }

  #[test]
  fn malformed_template_is_an_error() {
    let err = composer(Os::Linux).compose(&project("-X main.V={{ version ")).unwrap_err();
    assert!(matches!(err, LinkFlagsError::Template(_)));
  }

  #[test]
  fn unknown_variable_is_an_error() {
    assert!(composer(Os::Linux).compose(&project("-X main.V={{ nope }}")).is_err());
  }

  #[test]
  fn static_marker_added_once() {
    let mut p = project("");
    p.build.static_link = true;
    assert_eq!(composer(Os::Linux).compose(&p).unwrap(), "-extldflags '-static'");

    p.build.extra_linker_flags = vec!["-lm".to_string(), "-static".to_string()];
    let flags = composer(Os::Linux).compose(&p).unwrap();
    assert_eq!(flags, "-extldflags '-lm -static'");
    assert_eq!(flags.matches("-static").count(), 1);
  }

  #[test]
  fn static_marker_never_on_exempt_targets() {
    let mut p = project("");
    p.build.static_link = true;

    assert_eq!(composer(Os::Darwin).compose(&p).unwrap(), "");
    assert_eq!(composer(Os::Solaris).compose(&p).unwrap(), "");

    p.build.extra_linker_flags = vec!["-lm".to_string()];
    assert_eq!(composer(Os::Darwin).compose(&p).unwrap(), "-extldflags '-lm'");
  }

  #[test]
  fn template_and_ext_flags_are_joined() {
    let mut p = project("-s -w\n");
    p.build.extra_linker_flags = vec!["-L/opt/lib".to_string(), "-lfoo".to_string()];

    assert_eq!(
      composer(Os::Linux).compose(&p).unwrap(),
      "-s -w -extldflags '-L/opt/lib -lfoo'"
    );
  }
}
