//! Artifact exporters: render the overlaid graph into deployment files
//!
//! Exporters run only after a fully successful resolve + overlay, and every
//! file's content is rendered before anything touches disk, so a failed run
//! leaves no partial artifacts behind. The hard precondition is that every
//! exported service's variable map is fully valued; an unset variable is a
//! fatal `MissingVariableValue`.

pub mod gateway;
pub mod kustomize;

use crate::core::error::{ExportError, StagehandResult};
use crate::manifest::EnvironmentManifest;
use crate::resolver::ResolvedGraph;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Supported rendering formats for per-service artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Kustomize,
}

impl FromStr for OutputFormat {
  type Err = ExportError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "kustomize" => Ok(OutputFormat::Kustomize),
      other => Err(ExportError::UnsupportedOutputFormat {
        format: other.to_string(),
      }),
    }
  }
}

impl fmt::Display for OutputFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OutputFormat::Kustomize => write!(f, "kustomize"),
    }
  }
}

/// Render gateway descriptors and per-service configuration below
/// `output_dir`
pub fn export(
  output_dir: &Path,
  format: OutputFormat,
  graph: &ResolvedGraph,
  environment: &EnvironmentManifest,
) -> StagehandResult<()> {
  verify_variables(graph)?;

  let gateways_dir = output_dir.join("infrastructure").join("vamp").join("gateways");
  gateway::export_gateways(&gateways_dir, graph, environment)?;

  match format {
    OutputFormat::Kustomize => kustomize::export_services(&output_dir.join("services"), graph),
  }
}

/// Every variable of every service must have a value before export starts
fn verify_variables(graph: &ResolvedGraph) -> StagehandResult<()> {
  for service in graph.iter() {
    for variable in service.environment_variables.values() {
      if variable.value.is_none() {
        return Err(
          ExportError::MissingVariableValue {
            service: service.name.clone(),
            variable: variable.name.clone(),
          }
          .into(),
        );
      }
    }
  }
  Ok(())
}
