//! Dependency resolver: constraint-driven selection of a consistent
//! service graph
//!
//! Requested services expand recursively into a flat, deduplicated graph.
//! A service already resolved at a tag satisfying a newly encountered
//! constraint is reused as-is (first satisfying version wins; constraints
//! are deliberately not intersected). Candidate versions are gated by the
//! release-plan index: when the best match is release-blocked for the
//! target environment, the candidate set is rebuilt without blocked tags
//! and the best match recomputed. Any failure anywhere in the expansion
//! discards the entire graph.

pub mod overlay;

use crate::catalog::{Dependency, ServiceCatalog, ServiceDef};
use crate::core::error::{ResolveError, StagehandError, StagehandResult};
use crate::core::range::VersionRange;
use crate::release::ReleaseIndex;
use log::debug;
use semver::Version;
use std::collections::BTreeMap;

/// One environment variable of a resolved service; the value is filled by
/// the overlay engine and must be set before export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
  /// Original, case-sensitive variable name
  pub name: String,
  pub value: Option<String>,
}

/// A label value: either resolved text or a placeholder satisfied from the
/// service's environment-variable values at export time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValue {
  Literal(String),
  Unresolved(String),
}

impl LabelValue {
  /// Interpret `<placeholder>` syntax. `<name>` and `<tag>` refer to the
  /// service itself and resolve immediately; other placeholders are
  /// deferred references into the variable map.
  pub fn parse(raw: &str, service_name: &str, tag: &str) -> LabelValue {
    if let Some(key) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
      match key {
        "name" => LabelValue::Literal(service_name.to_string()),
        "tag" => LabelValue::Literal(tag.to_string()),
        other => LabelValue::Unresolved(other.to_string()),
      }
    } else {
      LabelValue::Literal(raw.to_string())
    }
  }

  pub fn as_literal(&self) -> Option<&str> {
    match self {
      LabelValue::Literal(value) => Some(value),
      LabelValue::Unresolved(_) => None,
    }
  }
}

/// The flattened runtime view of one chosen service version
#[derive(Debug, Clone)]
pub struct ResolvedService {
  pub name: String,
  /// Selected version tag
  pub tag: String,
  /// Variables keyed by lower-cased name (case-insensitive keying,
  /// case-sensitive names)
  pub environment_variables: BTreeMap<String, EnvVar>,
  pub labels: BTreeMap<String, LabelValue>,
  pub replicas: u32,
}

impl ResolvedService {
  /// Mutable variable lookup by case-insensitive key
  pub fn variable_mut(&mut self, key: &str) -> Option<&mut EnvVar> {
    self.environment_variables.get_mut(&key.to_lowercase())
  }

  /// Variable lookup by case-insensitive key
  pub fn variable(&self, key: &str) -> Option<&EnvVar> {
    self.environment_variables.get(&key.to_lowercase())
  }
}

/// The entire deployable set for one run, keyed by service name
#[derive(Debug, Default)]
pub struct ResolvedGraph {
  services: BTreeMap<String, ResolvedService>,
}

impl ResolvedGraph {
  pub fn insert(&mut self, service: ResolvedService) {
    self.services.insert(service.name.clone(), service);
  }

  pub fn get(&self, name: &str) -> Option<&ResolvedService> {
    self.services.get(name)
  }

  pub fn get_mut(&mut self, name: &str) -> Option<&mut ResolvedService> {
    self.services.get_mut(name)
  }

  /// Services in name order
  pub fn iter(&self) -> impl Iterator<Item = &ResolvedService> {
    self.services.values()
  }

  pub fn len(&self) -> usize {
    self.services.len()
  }

  pub fn is_empty(&self) -> bool {
    self.services.is_empty()
  }
}

/// A chosen version merged into its parent definition, prior to
/// normalization into a `ResolvedService`
#[derive(Debug, Clone)]
struct FlatService {
  name: String,
  tag: Version,
  dependencies: Vec<Dependency>,
  environment_variables: Vec<String>,
  labels: Vec<BTreeMap<String, String>>,
}

/// Resolves requested services against a catalog, gated by the release
/// index for one target environment
pub struct Resolver<'a> {
  catalog: &'a ServiceCatalog,
  index: &'a ReleaseIndex,
}

impl<'a> Resolver<'a> {
  pub fn new(catalog: &'a ServiceCatalog, index: &'a ReleaseIndex) -> Self {
    Self { catalog, index }
  }

  /// Expand `requested` into the full deployment graph.
  ///
  /// All-or-nothing: an unresolvable dependency anywhere in the transitive
  /// closure fails the whole resolution and no graph is returned.
  pub fn resolve(&self, requested: &[Dependency]) -> StagehandResult<ResolvedGraph> {
    let mut flats = BTreeMap::new();
    let mut in_progress = Vec::new();
    self.expand(requested, &mut flats, &mut in_progress)?;

    let mut graph = ResolvedGraph::default();
    for flat in flats.into_values() {
      graph.insert(normalize(flat));
    }
    Ok(graph)
  }

  fn expand(
    &self,
    requested: &[Dependency],
    resolved: &mut BTreeMap<String, FlatService>,
    in_progress: &mut Vec<String>,
  ) -> StagehandResult<()> {
    for dep in requested {
      let range = VersionRange::parse(&dep.version)?;

      if let Some(existing) = resolved.get(&dep.name) {
        if range.satisfies(&existing.tag) {
          debug!("{}: tag {} already satisfies {}", dep.name, existing.tag, range);
          continue;
        }
        // an incompatible constraint back into the active expansion path
        // can never settle; fail instead of looping
        if in_progress.iter().any(|n| n == &dep.name) {
          let mut chain = in_progress.clone();
          chain.push(dep.name.clone());
          return Err(
            ResolveError::CyclicDependency {
              name: dep.name.clone(),
              chain,
            }
            .into(),
          );
        }
      }

      let def = self
        .catalog
        .get(&dep.name)
        .ok_or_else(|| ResolveError::ServiceNotFound { name: dep.name.clone() })?;

      let tags = def.tags();
      let chosen = self.select(&dep.name, &range, &tags)?;
      let flat = flatten(def, &chosen)?;
      debug!("{}: resolved {} for constraint {}", dep.name, chosen, range);

      let dependencies = flat.dependencies.clone();
      resolved.insert(dep.name.clone(), flat);
      in_progress.push(dep.name.clone());
      self.expand(&dependencies, resolved, in_progress)?;
      in_progress.pop();
    }
    Ok(())
  }

  /// Pick the highest usable tag for one constraint, distinguishing "no
  /// version satisfies at all" from "satisfying versions exist but all are
  /// release-blocked"
  fn select(&self, name: &str, range: &VersionRange, tags: &[Version]) -> StagehandResult<Version> {
    let Some(best) = range.max_satisfying(tags) else {
      return Err(
        ResolveError::NoMatchingVersion {
          name: name.to_string(),
          range: range.to_string(),
          available: version_strings(tags),
        }
        .into(),
      );
    };

    if self.index.is_usable(name, &best.to_string()) {
      return Ok(best.clone());
    }

    let usable: Vec<Version> = tags
      .iter()
      .filter(|tag| self.index.is_usable(name, &tag.to_string()))
      .cloned()
      .collect();

    match range.max_satisfying(&usable) {
      Some(fallback) => {
        debug!(
          "{}: {} is release-blocked in `{}`, falling back to {}",
          name,
          best,
          self.index.environment(),
          fallback
        );
        Ok(fallback.clone())
      }
      None => Err(
        ResolveError::ReleasePlanBlocked {
          name: name.to_string(),
          range: range.to_string(),
          environment: self.index.environment().to_string(),
          available: version_strings(tags),
          usable: version_strings(&usable),
        }
        .into(),
      ),
    }
  }
}

fn version_strings(tags: &[Version]) -> Vec<String> {
  tags.iter().map(ToString::to_string).collect()
}

/// Merge the chosen version into its parent definition: the version's tag
/// and dependencies replace, its variables and labels extend the base sets
fn flatten(def: &ServiceDef, tag: &Version) -> StagehandResult<FlatService> {
  let version = def.version(&tag.to_string()).ok_or_else(|| {
    StagehandError::message(format!("{}: no declared version with tag {}", def.name, tag))
  })?;

  let mut environment_variables = def.environment_variables.clone();
  if let Some(extra) = &version.environment_variables {
    for name in extra {
      if !environment_variables.contains(name) {
        environment_variables.push(name.clone());
      }
    }
  }

  let mut labels = def.labels.clone();
  if let Some(extra) = &version.labels {
    labels.extend(extra.iter().cloned());
  }

  Ok(FlatService {
    name: def.name.clone(),
    tag: tag.clone(),
    dependencies: version.dependencies.clone(),
    environment_variables,
    labels,
  })
}

/// Build the runtime view: case-insensitive variable map with unset values,
/// flattened label map with placeholders interpreted, default replica count
fn normalize(flat: FlatService) -> ResolvedService {
  let tag = flat.tag.to_string();

  let mut environment_variables = BTreeMap::new();
  for name in flat.environment_variables {
    environment_variables.insert(name.to_lowercase(), EnvVar { name, value: None });
  }

  let mut labels = BTreeMap::new();
  for label_map in flat.labels {
    for (label, value) in label_map {
      labels.insert(label, LabelValue::parse(&value, &flat.name, &tag));
    }
  }

  ResolvedService {
    name: flat.name,
    tag,
    environment_variables,
    labels,
    replicas: 1,
  }
}
