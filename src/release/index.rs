//! Release plan index: effective status lookup for one target environment
//!
//! Built once per run from all persisted plan documents, consumed by the
//! resolver, never mutated in place. Mutations go through the transition
//! engine and land on disk; the index is not re-read mid-run.

use crate::release::document::{ReleasePlanDocument, ReleaseStatus};
use std::collections::HashMap;

/// `(service, version) → effective status` for one environment.
///
/// A pair with no entry has no release plan at all and is unconstrained:
/// absence is permissive, not blocking.
#[derive(Debug)]
pub struct ReleaseIndex {
  environment: String,
  entries: HashMap<String, HashMap<String, ReleaseStatus>>,
}

impl ReleaseIndex {
  /// Aggregate all documents into the lookup for `environment`.
  ///
  /// A terminal document status (`Failed`, `Aborted`, `Skipped`) blocks the
  /// version in every environment regardless of per-environment state.
  /// Otherwise the environment's own entry decides, demoted to `Pending`
  /// while its group is gated shut and the entry has not started.
  pub fn build<'a, I>(environment: &str, documents: I) -> Self
  where
    I: IntoIterator<Item = &'a ReleasePlanDocument>,
  {
    let mut entries: HashMap<String, HashMap<String, ReleaseStatus>> = HashMap::new();

    for doc in documents {
      let effective = if doc.status.is_terminal() {
        Some(doc.status)
      } else {
        doc.environment_entry(environment).map(|(group, entry)| {
          if !group.can_start && entry.status == ReleaseStatus::NotStarted {
            ReleaseStatus::Pending
          } else {
            entry.status
          }
        })
      };

      if let Some(status) = effective {
        entries
          .entry(doc.service.name.clone())
          .or_default()
          .insert(doc.service.version.clone(), status);
      }
    }

    Self {
      environment: environment.to_string(),
      entries,
    }
  }

  /// The environment this index was built for
  pub fn environment(&self) -> &str {
    &self.environment
  }

  /// Effective status of a `(service, version)`, `None` when no plan
  /// document mentions it for this environment
  pub fn effective_status(&self, service: &str, version: &str) -> Option<ReleaseStatus> {
    self.entries.get(service).and_then(|v| v.get(version)).copied()
  }

  /// Whether the resolver may select this `(service, version)`
  pub fn is_usable(&self, service: &str, version: &str) -> bool {
    self
      .effective_status(service, version)
      .is_none_or(|status| status.can_release())
  }
}
