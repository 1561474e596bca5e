//! Kustomize-style per-service configuration
//!
//! One `configMap.env` per resolved service with `NAME=value` lines
//! (CRLF-terminated). Contents are rendered for the whole graph before the
//! first write so a missing value cannot leave partial output behind.

use crate::core::error::{ExportError, StagehandResult};
use crate::resolver::ResolvedGraph;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `<dir>/<service>/configMap.env` for every service in the graph
pub fn export_services(dir: &Path, graph: &ResolvedGraph) -> StagehandResult<()> {
  let mut files: Vec<(PathBuf, String)> = Vec::new();

  for service in graph.iter() {
    let mut data = String::new();
    for variable in service.environment_variables.values() {
      let value = variable.value.as_ref().ok_or_else(|| ExportError::MissingVariableValue {
        service: service.name.clone(),
        variable: variable.name.clone(),
      })?;
      data.push_str(&format!("{}={}\r\n", variable.name, value));
    }
    files.push((dir.join(&service.name), data));
  }

  for (service_dir, data) in files {
    fs::create_dir_all(&service_dir)?;
    fs::write(service_dir.join("configMap.env"), data)?;
  }
  Ok(())
}
