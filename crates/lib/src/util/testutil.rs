//! Test utilities for trellis-lib.
//!
//! Cross-platform helpers for tests that run commands, plus a fake toolchain
//! script that records how it was invoked.

use std::fs;
use std::path::{Path, PathBuf};

/// Returns the command and args to echo a message.
///
/// On Unix, this uses /bin/echo directly.
/// On Windows, echo is a shell builtin, so we wrap it in cmd.exe.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("/bin/echo", vec![msg.to_string()])
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), format!("echo {}", msg)])
}

/// Writes an executable stand-in for `go` into `dir`.
///
/// `version` prints a fixed version string. Any other invocation records its
/// arguments (one per line), `CGO_ENABLED`, and a copy of the last argument if
/// it is a file, then exits with `exit_code`.
#[cfg(unix)]
pub fn fake_toolchain(dir: &Path, exit_code: i32) -> PathBuf {
  slow_fake_toolchain(dir, exit_code, 0)
}

/// Like [`fake_toolchain`], sleeping `sleep_secs` before exiting.
#[cfg(unix)]
pub fn slow_fake_toolchain(dir: &Path, exit_code: i32, sleep_secs: u32) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let record = dir.join("record");
  fs::create_dir_all(&record).unwrap();

  let script = format!(
    r#"#!/bin/sh
if [ "$1" = "version" ]; then
  echo "go version go1.22.1 fake/amd64"
  exit 0
fi
for arg in "$@"; do printf '%s\n' "$arg"; done > "{record}/args"
printf '%s' "$CGO_ENABLED" > "{record}/cgo"
eval "last=\${{$#}}"
if [ -f "$last" ]; then cp "$last" "{record}/entry"; fi
sleep {sleep_secs}
exit {exit_code}
"#,
    record = record.display(),
  );

  let path = dir.join("fake-go");
  fs::write(&path, script).unwrap();
  fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// What a fake toolchain saw.
#[derive(Debug)]
pub struct Recorded {
  pub args: Vec<String>,
  pub cgo: String,
  /// Content of the entry file at build time, if it existed.
  pub entry: Option<String>,
}

pub fn read_recorded(dir: &Path) -> Recorded {
  let record = dir.join("record");
  let args = fs::read_to_string(record.join("args")).unwrap();
  Recorded {
    args: args.lines().map(str::to_string).collect(),
    cgo: fs::read_to_string(record.join("cgo")).unwrap(),
    entry: fs::read_to_string(record.join("entry")).ok(),
  }
}
