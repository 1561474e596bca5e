//! Overlay engine: application- and environment-level property overrides
//!
//! Applied onto the resolved graph in place, later sources winning:
//! application variable/label values first, then environment variable/label
//! values, then environment replica counts. Lookups that miss a target key
//! are logged and skipped, never fatal: an older resolved version may
//! simply not know a variable the manifest still sets (downgrades).

use crate::manifest::{ApplicationManifest, EnvironmentManifest};
use crate::resolver::{LabelValue, ResolvedGraph};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Apply all overrides from both manifests onto `graph`
pub fn apply_overlays(graph: &mut ResolvedGraph, application: &ApplicationManifest, environment: &EnvironmentManifest) {
  for service in &application.services {
    set_variables(graph, &service.name, &service.environment_variables, "application");
    set_labels(graph, &service.name, &service.labels, "application");
  }

  for service in &environment.services {
    set_variables(graph, &service.name, &service.environment_variables, "environment");
    set_labels(graph, &service.name, &service.labels, "environment");
    if let Some(replicas) = service.replicas {
      set_replicas(graph, &service.name, replicas);
    }
  }
}

fn set_variables(graph: &mut ResolvedGraph, name: &str, values: &BTreeMap<String, String>, source: &str) {
  if values.is_empty() {
    return;
  }
  let Some(service) = graph.get_mut(name) else {
    warn!("{} overlay: `{}` is not in the resolved graph, skipping", source, name);
    return;
  };

  for (key, value) in values {
    match service.variable_mut(key) {
      Some(variable) => variable.value = Some(value.clone()),
      None => warn!(
        "{} overlay: `{}` {} has no environment variable `{}`, skipping",
        source, name, service.tag, key
      ),
    }
  }
}

fn set_labels(graph: &mut ResolvedGraph, name: &str, labels: &BTreeMap<String, String>, source: &str) {
  if labels.is_empty() {
    return;
  }
  let Some(service) = graph.get_mut(name) else {
    warn!("{} overlay: `{}` is not in the resolved graph, skipping", source, name);
    return;
  };

  let service_name = service.name.clone();
  let tag = service.tag.clone();
  for (label, value) in labels {
    service
      .labels
      .insert(label.clone(), LabelValue::parse(value, &service_name, &tag));
  }
}

fn set_replicas(graph: &mut ResolvedGraph, name: &str, replicas: u32) {
  let Some(service) = graph.get_mut(name) else {
    warn!("environment overlay: `{}` is not in the resolved graph, skipping", name);
    return;
  };
  debug!("{}: replicas {}", name, replicas);
  service.replicas = replicas;
}
