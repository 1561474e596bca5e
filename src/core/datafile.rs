//! Structured-document load/store for JSON and YAML data files
//!
//! Catalogs, manifests and release plans are plain data files; the encoding
//! is picked by extension (`.json` vs `.yml`/`.yaml`). Writes go through a
//! temp file and a rename so a reader never observes a half-written
//! document.

use crate::core::error::{InputError, StagehandError, StagehandResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const JSON_EXTENSIONS: &[&str] = &["json"];
const YAML_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// On-disk encoding of a data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
  Json,
  Yaml,
}

impl DataFormat {
  /// Detect the format from a file extension; `None` for non-data files
  pub fn detect(path: &Path) -> Option<DataFormat> {
    let ext = path.extension()?.to_str()?;
    if JSON_EXTENSIONS.contains(&ext) {
      Some(DataFormat::Json)
    } else if YAML_EXTENSIONS.contains(&ext) {
      Some(DataFormat::Yaml)
    } else {
      None
    }
  }
}

/// Whether the path looks like a JSON or YAML data file
pub fn is_data_file(path: &Path) -> bool {
  DataFormat::detect(path).is_some()
}

/// Read and deserialize one data file, failing fast on shape mismatches
pub fn read<T: DeserializeOwned>(path: &Path) -> StagehandResult<T> {
  let content = fs::read_to_string(path)?;
  let format = DataFormat::detect(path).ok_or_else(|| {
    StagehandError::Input(InputError::Malformed {
      path: path.to_path_buf(),
      detail: "data file must be either in json or yaml format".to_string(),
    })
  })?;

  let parsed = match format {
    DataFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
    DataFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
  };

  parsed.map_err(|detail| {
    StagehandError::Input(InputError::Malformed {
      path: path.to_path_buf(),
      detail,
    })
  })
}

/// Serialize and write one data file in the encoding its extension names.
///
/// The content lands in a sibling temp file first and is renamed into place,
/// so a failed write leaves the previous document intact.
pub fn write<T: Serialize>(path: &Path, value: &T) -> StagehandResult<()> {
  let format = DataFormat::detect(path).unwrap_or(DataFormat::Json);
  let content = match format {
    DataFormat::Json => {
      let mut s = serde_json::to_string_pretty(value)?;
      s.push('\n');
      s
    }
    DataFormat::Yaml => serde_yaml::to_string(value)?,
  };

  let tmp = temp_sibling(path);
  fs::write(&tmp, content)?;
  if let Err(e) = fs::rename(&tmp, path) {
    let _ = fs::remove_file(&tmp);
    return Err(e.into());
  }
  Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
  let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Find data files directly in `dir`, or anywhere below it when `recursive`.
///
/// Results are sorted for deterministic traversal order.
pub fn find_data_files(dir: &Path, recursive: bool) -> StagehandResult<Vec<PathBuf>> {
  let mut paths = Vec::new();
  for ext in JSON_EXTENSIONS.iter().chain(YAML_EXTENSIONS) {
    let pattern = if recursive {
      format!("{}/**/*.{}", dir.display(), ext)
    } else {
      format!("{}/*.{}", dir.display(), ext)
    };
    for entry in glob::glob(&pattern)? {
      paths.push(entry?);
    }
  }
  paths.sort();
  Ok(paths)
}
