//! Release plan inspection and explicit transitions
//!
//! `status` renders the persisted plan documents (table or JSON for CI);
//! `transition` is the operational entry point for moving one
//! `(environment, service, version)` through the rollout state machine.

use crate::core::error::StagehandResult;
use crate::release::{PlanStore, ReleasePlanDocument, ReleaseStatus, transition};
use std::path::Path;

/// Show the state of all persisted release plans
pub fn run_release_status(release_plans: &Path, service: Option<&str>, json: bool) -> StagehandResult<()> {
  let store = PlanStore::open(release_plans)?;
  let documents: Vec<&ReleasePlanDocument> = store
    .documents()
    .filter(|d| service.is_none_or(|s| d.service.name == s))
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&documents)?);
    return Ok(());
  }

  if documents.is_empty() {
    println!("No release plans found.");
    return Ok(());
  }

  println!("📋 Release Plans\n");
  println!("{:<20} {:<12} {:<12} Groups", "Service", "Version", "Status");
  println!("──────────────────────────────────────────────────────────────");
  for doc in documents {
    let groups = doc
      .release_groups
      .iter()
      .map(|g| {
        let gate = if g.can_start { "" } else { " (gated)" };
        format!("{}:{}{}", g.sequence, g.status.as_str(), gate)
      })
      .collect::<Vec<_>>()
      .join(", ");
    println!(
      "{:<20} {:<12} {:<12} {}",
      doc.service.name,
      doc.service.version,
      doc.status.as_str(),
      groups
    );
  }
  Ok(())
}

/// Apply one explicit status change and persist the document
pub fn run_release_transition(
  release_plans: &Path,
  environment: &str,
  service: &str,
  version: &str,
  status: &str,
) -> StagehandResult<()> {
  let status: ReleaseStatus = status.parse()?;
  let mut store = PlanStore::open(release_plans)?;
  transition(&mut store, environment, service, version, status)?;
  println!("✅ {} {}: `{}` -> {}", service, version, environment, status.as_str());
  Ok(())
}
