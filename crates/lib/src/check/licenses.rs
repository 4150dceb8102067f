//! License header check.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// A file passes when one of its head lines contains one of these (lowercased).
const VALID_HEADER_MARKERS: &[&str] = &["copyright", "generated"];

const VENDOR_DIR: &str = "vendor";

#[derive(Debug, Error)]
pub enum LicenseError {
  #[error("failed to walk {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Clone)]
pub struct LicenseCheck {
  /// File name suffixes to check, e.g. `.go`.
  pub extensions: Vec<String>,
  /// Number of lines read from the head of each file.
  pub length: usize,
  pub location: PathBuf,
}

impl Default for LicenseCheck {
  fn default() -> Self {
    Self {
      extensions: vec![".go".to_string()],
      length: 10,
      location: PathBuf::from("."),
    }
  }
}

impl LicenseCheck {
  /// Files under `location` that lack a license header, in walk order.
  pub fn missing_headers(&self) -> Result<Vec<PathBuf>, LicenseError> {
    let mut missing = Vec::new();

    let walker = WalkDir::new(&self.location)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| !is_vendor(&self.location, entry.path()));

    for entry in walker {
      let entry = entry.map_err(|source| LicenseError::Walk {
        path: self.location.clone(),
        source,
      })?;

      if !entry.file_type().is_file() || !self.matches_extension(entry.path()) {
        continue;
      }

      if !has_header(entry.path(), self.length)? {
        debug!(path = %entry.path().display(), "missing license header");
        missing.push(entry.into_path());
      }
    }

    Ok(missing)
  }

  fn matches_extension(&self, path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
      return false;
    };
    self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
  }
}

fn is_vendor(root: &Path, path: &Path) -> bool {
  let relative = path.strip_prefix(root).unwrap_or(path);
  relative.components().next().is_some_and(|c| c.as_os_str() == VENDOR_DIR)
}

fn has_header(path: &Path, length: usize) -> Result<bool, LicenseError> {
  let file = File::open(path).map_err(|source| LicenseError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  for line in BufReader::new(file).lines().take(length) {
    let line = line.map_err(|source| LicenseError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let line = line.to_lowercase();
    if VALID_HEADER_MARKERS.iter().any(|marker| line.contains(marker)) {
      return Ok(true);
    }
  }

  Ok(false)
}
