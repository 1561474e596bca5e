//! Gateway selector descriptors
//!
//! One descriptor per environment-manifest service carrying gateway
//! configuration. For `label`-type selectors the descriptor matches on the
//! resolved service's labels: the discriminator label becomes a capture
//! term, every other label a fixed `label(name)(value)` term.

use crate::core::error::{ExportError, StagehandError, StagehandResult};
use crate::manifest::EnvironmentManifest;
use crate::resolver::{LabelValue, ResolvedGraph, ResolvedService};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `<name>.yaml` descriptors for every gateway-configured service
pub fn export_gateways(dir: &Path, graph: &ResolvedGraph, environment: &EnvironmentManifest) -> StagehandResult<()> {
  // render everything first so a bad selector leaves no partial output
  let mut files: Vec<(PathBuf, String)> = Vec::new();

  for env_service in &environment.services {
    let Some(vamp) = &env_service.vamp else {
      continue;
    };
    let selector_config = &vamp.gateway.selector;

    let mut selector = String::new();
    if selector_config.selector_type == "label" {
      let Some(service) = graph.get(&env_service.name) else {
        warn!(
          "gateway export: `{}` is not in the resolved graph, skipping",
          env_service.name
        );
        continue;
      };

      let mut terms = Vec::new();
      for (label, value) in &service.labels {
        if selector_config.discriminator.as_deref() == Some(label.as_str()) {
          terms.push(format!("label({})((.*))", label));
        } else {
          terms.push(format!("label({})({})", label, resolve_label_value(service, value)?));
        }
      }
      selector = terms.join(" && ");
    }

    let port = env_service.port.ok_or_else(|| {
      StagehandError::message(format!(
        "Gateway for `{}` has no port in the environment manifest",
        env_service.name
      ))
    })?;

    let data = format!("name: {}\nport: {}\nselector: {}\n", env_service.name, port, selector);
    files.push((dir.join(format!("{}.yaml", env_service.name)), data));
  }

  if !files.is_empty() {
    fs::create_dir_all(dir)?;
  }
  for (path, data) in files {
    fs::write(path, data)?;
  }
  Ok(())
}

/// A label's selector value: literal text, or a deferred reference into the
/// service's variable map
fn resolve_label_value(service: &ResolvedService, value: &LabelValue) -> StagehandResult<String> {
  match value {
    LabelValue::Literal(text) => Ok(text.clone()),
    LabelValue::Unresolved(key) => service
      .variable(key)
      .and_then(|v| v.value.clone())
      .ok_or_else(|| {
        ExportError::MissingVariableValue {
          service: service.name.clone(),
          variable: key.clone(),
        }
        .into()
      }),
  }
}
