//! Changelog check.
//!
//! Release headings are level-two markdown headings carrying a version:
//! `## [1.2.0] - 2024-01-01`, `## v1.2.0` or `## 1.2.0`. `## [Unreleased]`
//! and other headings are ignored. Releases must be listed newest first.

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChangelogError {
  #[error("failed to read changelog {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("invalid version {version:?}: {source}")]
  InvalidVersion { version: String, source: semver::Error },

  #[error("invalid release heading on line {line}: {source}")]
  InvalidHeading { line: usize, source: semver::Error },

  #[error("changelog has no release entries")]
  NoReleases,

  #[error("release {newer} on line {line} is listed below older release {older}")]
  OutOfOrder { line: usize, older: Version, newer: Version },

  #[error("latest changelog release is {latest}, expected {expected}")]
  VersionMismatch { latest: Version, expected: Version },
}

/// A release heading found in a changelog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
  pub version: Version,
  /// 1-based line number of the heading.
  pub line: usize,
}

/// Release headings in `content`, in document order.
pub fn parse_releases(content: &str) -> Result<Vec<Release>, ChangelogError> {
  let mut releases = Vec::new();

  for (idx, line) in content.lines().enumerate() {
    let Some(heading) = line.strip_prefix("## ") else {
      continue;
    };
    let Some(raw) = heading_version(heading) else {
      continue;
    };
    let version = Version::parse(raw).map_err(|source| ChangelogError::InvalidHeading { line: idx + 1, source })?;
    releases.push(Release { version, line: idx + 1 });
  }

  Ok(releases)
}

fn heading_version(heading: &str) -> Option<&str> {
  let token = heading.split_whitespace().next()?;
  let token = token.trim_start_matches('[').trim_end_matches(']');
  let token = token.strip_prefix('v').unwrap_or(token);
  token.starts_with(|c: char| c.is_ascii_digit()).then_some(token)
}

/// Check that `content` lists releases newest first and that the newest one
/// is `expected`.
pub fn check_changelog(content: &str, expected: &str) -> Result<Release, ChangelogError> {
  let expected_version = Version::parse(expected.trim_start_matches('v')).map_err(|source| {
    ChangelogError::InvalidVersion {
      version: expected.to_string(),
      source,
    }
  })?;

  let releases = parse_releases(content)?;

  for pair in releases.windows(2) {
    if pair[1].version >= pair[0].version {
      return Err(ChangelogError::OutOfOrder {
        line: pair[1].line,
        older: pair[0].version.clone(),
        newer: pair[1].version.clone(),
      });
    }
  }

  let latest = releases.into_iter().next().ok_or(ChangelogError::NoReleases)?;
  if latest.version != expected_version {
    return Err(ChangelogError::VersionMismatch {
      latest: latest.version,
      expected: expected_version,
    });
  }

  Ok(latest)
}

/// Read the changelog at `path` and check it against `expected`.
pub fn check_changelog_file(path: &Path, expected: &str) -> Result<Release, ChangelogError> {
  let content = fs::read_to_string(path).map_err(|source| ChangelogError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  check_changelog(&content, expected)
}
