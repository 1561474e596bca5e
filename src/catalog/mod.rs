//! Service catalog: versioned service definitions loaded from disk
//!
//! One data file per service, searched recursively below the
//! service-definition directory. The catalog is loaded once per run and is
//! immutable afterwards; the resolver flattens a chosen version into its
//! parent definition when building the deployment graph.

use crate::core::datafile;
use crate::core::error::{InputError, StagehandResult};
use log::{debug, warn};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// A dependency edge: target service plus a version constraint range.
///
/// Appears both as a top-level application requirement and nested inside a
/// `ServiceVersion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
  pub name: String,
  pub version: String,
}

impl Dependency {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
    }
  }
}

/// One published version of a service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceVersion {
  /// Semantic version tag
  pub tag: String,
  /// Services this version depends on
  #[serde(default)]
  pub dependencies: Vec<Dependency>,
  /// Environment variable names this version adds to the base set
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub environment_variables: Option<Vec<String>>,
  /// Label maps this version adds to the base set; values may be
  /// `<placeholder>` references
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub labels: Option<Vec<BTreeMap<String, String>>>,
}

/// One service's full definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDef {
  /// Unique service name
  pub name: String,
  /// Published versions, as declared
  #[serde(default)]
  pub versions: Vec<ServiceVersion>,
  /// Environment variable names common to all versions
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub environment_variables: Vec<String>,
  /// Label maps common to all versions
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub labels: Vec<BTreeMap<String, String>>,
}

impl ServiceDef {
  /// Look up one declared version by tag
  pub fn version(&self, tag: &str) -> Option<&ServiceVersion> {
    self.versions.iter().find(|v| v.tag == tag)
  }

  /// All declared tags parsed as semantic versions.
  ///
  /// Unparsable tags are skipped with a warning so one bad entry does not
  /// take the whole service out of resolution.
  pub fn tags(&self) -> Vec<Version> {
    self
      .versions
      .iter()
      .filter_map(|v| match Version::parse(&v.tag) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
          warn!("{}: skipping unparsable version tag `{}`", self.name, v.tag);
          None
        }
      })
      .collect()
  }
}

/// All service definitions for one run, keyed by service name
#[derive(Debug, Default)]
pub struct ServiceCatalog {
  services: HashMap<String, ServiceDef>,
}

impl ServiceCatalog {
  /// Create an empty catalog
  pub fn new() -> Self {
    Self::default()
  }

  /// Load every data file below `dir` as a service definition.
  ///
  /// An empty scan is fatal: a planning run without a catalog cannot
  /// resolve anything. Later files win on duplicate names, matching the
  /// per-file overwrite of a keyed load.
  pub fn load(dir: &Path) -> StagehandResult<Self> {
    let paths = datafile::find_data_files(dir, true)?;
    if paths.is_empty() {
      return Err(InputError::NoServiceDefinitions { dir: dir.to_path_buf() }.into());
    }

    let mut catalog = Self::new();
    for path in paths {
      let def: ServiceDef = datafile::read(&path)?;
      debug!("loaded service definition `{}` from {}", def.name, path.display());
      if catalog.services.insert(def.name.clone(), def).is_some() {
        warn!("duplicate service definition in {}; keeping the later one", path.display());
      }
    }
    Ok(catalog)
  }

  /// Add or replace one definition
  pub fn insert(&mut self, def: ServiceDef) {
    self.services.insert(def.name.clone(), def);
  }

  /// Look up a service by name
  pub fn get(&self, name: &str) -> Option<&ServiceDef> {
    self.services.get(name)
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn def_json() -> &'static str {
    r#"{
      "name": "api",
      "environment_variables": ["DB_HOST"],
      "versions": [
        {"tag": "1.0.0", "dependencies": [{"name": "db", "version": "^2.0.0"}]},
        {"tag": "1.1.0", "dependencies": [], "environment_variables": ["FEATURE_FLAG"]}
      ]
    }"#
  }

  #[test]
  fn test_load_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("team-a")).unwrap();
    std::fs::write(dir.path().join("team-a/api.json"), def_json()).unwrap();
    std::fs::write(
      dir.path().join("db.yaml"),
      "name: db\nversions:\n  - tag: 2.0.0\n    dependencies: []\n",
    )
    .unwrap();

    let catalog = ServiceCatalog::load(dir.path()).unwrap();
    assert_eq!(catalog.len(), 2);

    let api = catalog.get("api").unwrap();
    assert_eq!(api.versions.len(), 2);
    assert_eq!(api.version("1.0.0").unwrap().dependencies[0].name, "db");
    assert!(catalog.get("cache").is_none());
  }

  #[test]
  fn test_empty_directory_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let result = ServiceCatalog::load(dir.path());
    assert!(result.is_err());
  }

  #[test]
  fn test_tags_skip_unparsable() {
    let def = ServiceDef {
      name: "api".to_string(),
      versions: vec![
        ServiceVersion {
          tag: "1.0.0".to_string(),
          dependencies: vec![],
          environment_variables: None,
          labels: None,
        },
        ServiceVersion {
          tag: "latest".to_string(),
          dependencies: vec![],
          environment_variables: None,
          labels: None,
        },
      ],
      environment_variables: vec![],
      labels: vec![],
    };

    let tags = def.tags();
    assert_eq!(tags, vec![Version::new(1, 0, 0)]);
  }
}
