//! Application and environment manifests
//!
//! The application manifest names the desired services and their version
//! constraints; the environment manifest carries per-environment overrides
//! (variable values, labels, replica counts) and gateway policy. Both
//! declare the environment they belong to, and a mismatch between the two
//! is a fatal startup error.
//!
//! After a successful pass the environment manifest is rewritten in place
//! with the computed service list and an `updated` marker.

use crate::catalog::Dependency;
use crate::core::datafile;
use crate::core::error::{InputError, StagehandResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The environment a manifest belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentRef {
  pub name: String,
}

/// One requested service in the application manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationService {
  pub name: String,
  /// Version constraint range
  pub version: String,
  /// Variable values keyed by the lower-cased variable key
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub environment_variables: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub labels: BTreeMap<String, String>,
}

/// Desired services and application-level property values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationManifest {
  pub environment: EnvironmentRef,
  #[serde(default)]
  pub services: Vec<ApplicationService>,
}

impl ApplicationManifest {
  /// Load from a single data file
  pub fn load(path: &Path) -> StagehandResult<Self> {
    datafile::read(path)
  }

  /// Load from the first data file directly inside `dir`
  pub fn load_from_dir(dir: &Path) -> StagehandResult<Self> {
    let paths = datafile::find_data_files(dir, false)?;
    match paths.first() {
      Some(path) => Self::load(path),
      None => Err(
        InputError::Malformed {
          path: dir.to_path_buf(),
          detail: "no application definition data file found".to_string(),
        }
        .into(),
      ),
    }
  }

  /// The requested services as dependency edges for the resolver
  pub fn requested(&self) -> Vec<Dependency> {
    self
      .services
      .iter()
      .map(|s| Dependency::new(&s.name, &s.version))
      .collect()
  }
}

/// Gateway selector policy for one environment service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySelector {
  #[serde(rename = "type")]
  pub selector_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub discriminator: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub policy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
  pub selector: GatewaySelector,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VampConfig {
  pub gateway: GatewayConfig,
}

/// Per-environment overrides for one service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentService {
  pub name: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub environment_variables: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub labels: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub replicas: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub port: Option<u16>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub vamp: Option<VampConfig>,
}

/// A `(name, version)` pair recorded after a successful pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedService {
  pub name: String,
  pub version: String,
}

/// Environment-level overrides, gateway policy, and the computed result of
/// the latest planning pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentManifest {
  pub environment: EnvironmentRef,
  #[serde(default)]
  pub services: Vec<EnvironmentService>,
  #[serde(rename = "computed-services", default, skip_serializing_if = "Vec::is_empty")]
  pub computed_services: Vec<ComputedService>,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub updated: bool,
}

impl EnvironmentManifest {
  /// Load from a single data file
  pub fn load(path: &Path) -> StagehandResult<Self> {
    datafile::read(path)
  }

  /// Find the definition for `environment` below `dir`: a data file whose
  /// name starts with the environment name, searched directly in `dir` and
  /// then in `dir/<environment>/`.
  pub fn find_in_dir(dir: &Path, environment: &str) -> StagehandResult<PathBuf> {
    let mut candidates = datafile::find_data_files(dir, false)?;
    candidates.extend(datafile::find_data_files(&dir.join(environment), false)?);

    candidates
      .into_iter()
      .find(|p| {
        p.file_name()
          .and_then(|n| n.to_str())
          .is_some_and(|n| n.starts_with(environment))
      })
      .ok_or_else(|| {
        InputError::NoEnvironmentDefinition {
          environment: environment.to_string(),
          dir: dir.to_path_buf(),
        }
        .into()
      })
  }

  /// Record the computed service list and mark the manifest updated
  pub fn record_computed(&mut self, services: Vec<ComputedService>) {
    self.computed_services = services;
    self.updated = true;
  }

  /// Write the manifest back to `path` in the encoding its extension names
  pub fn store(&self, path: &Path) -> StagehandResult<()> {
    datafile::write(path, self)
  }

  /// The override block for one service, if present
  pub fn service(&self, name: &str) -> Option<&EnvironmentService> {
    self.services.iter().find(|s| s.name == name)
  }
}

/// Fail when the application and environment manifests disagree on the
/// environment they describe
pub fn check_environment_match(
  application: &ApplicationManifest,
  environment: &EnvironmentManifest,
) -> StagehandResult<()> {
  if application.environment.name != environment.environment.name {
    return Err(
      InputError::EnvironmentMismatch {
        application: application.environment.name.clone(),
        environment: environment.environment.name.clone(),
      }
      .into(),
    );
  }
  Ok(())
}
