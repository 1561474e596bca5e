//! Persisted release-plan documents
//!
//! One document per `(service, version)` records how far a rollout has
//! progressed through ordered groups of environments. Documents are plain
//! data files in the release-plan directory; the store remembers where each
//! one came from so the transition engine can rewrite exactly that file.

use crate::core::datafile;
use crate::core::error::{StagehandError, StagehandResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Rollout status of a document, group or environment entry.
///
/// `NotStarted`, `Started` and `Finished` permit resolution (CAN_RELEASE);
/// `Failed`, `Aborted`, `Skipped` and `Pending` block it. `Pending` is
/// synthetic: never persisted, only computed when a gated-shut group holds
/// a `NotStarted` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
  NotStarted,
  Started,
  Finished,
  Failed,
  Aborted,
  Skipped,
  Pending,
}

impl ReleaseStatus {
  /// Whether the resolver may select a version in this status
  pub fn can_release(self) -> bool {
    matches!(
      self,
      ReleaseStatus::NotStarted | ReleaseStatus::Started | ReleaseStatus::Finished
    )
  }

  /// Whether this status ends a whole plan unconditionally
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      ReleaseStatus::Failed | ReleaseStatus::Aborted | ReleaseStatus::Skipped
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      ReleaseStatus::NotStarted => "not-started",
      ReleaseStatus::Started => "started",
      ReleaseStatus::Finished => "finished",
      ReleaseStatus::Failed => "failed",
      ReleaseStatus::Aborted => "aborted",
      ReleaseStatus::Skipped => "skipped",
      ReleaseStatus::Pending => "pending",
    }
  }
}

impl fmt::Display for ReleaseStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for ReleaseStatus {
  type Err = StagehandError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "not-started" => Ok(ReleaseStatus::NotStarted),
      "started" => Ok(ReleaseStatus::Started),
      "finished" => Ok(ReleaseStatus::Finished),
      "failed" => Ok(ReleaseStatus::Failed),
      "aborted" => Ok(ReleaseStatus::Aborted),
      "skipped" => Ok(ReleaseStatus::Skipped),
      "pending" => Ok(ReleaseStatus::Pending),
      other => Err(StagehandError::with_help(
        format!("Unknown release status: `{}`", other),
        "Valid statuses: not-started, started, finished, failed, aborted, skipped",
      )),
    }
  }
}

/// The `(service, version)` a plan document belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
  pub name: String,
  pub version: String,
}

/// One environment's rollout state within a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentEntry {
  pub name: String,
  pub status: ReleaseStatus,
}

/// An ordered group of environments rolled out together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseGroup {
  /// Rollout order; group N+1 is gated on group N finishing
  #[serde(rename = "group")]
  pub sequence: i64,
  pub status: ReleaseStatus,
  /// Gate: whether this group's environments may begin rollout
  #[serde(rename = "canStart")]
  pub can_start: bool,
  pub environments: Vec<EnvironmentEntry>,
}

impl ReleaseGroup {
  /// Entry for one environment, if this group contains it
  pub fn environment(&self, name: &str) -> Option<&EnvironmentEntry> {
    self.environments.iter().find(|e| e.name == name)
  }

  /// Whether every entry is `Finished` or `Skipped`
  pub fn is_complete(&self) -> bool {
    self
      .environments
      .iter()
      .all(|e| matches!(e.status, ReleaseStatus::Finished | ReleaseStatus::Skipped))
  }
}

/// One persisted release plan for a `(service, version)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasePlanDocument {
  pub service: ServiceRef,
  pub status: ReleaseStatus,
  #[serde(rename = "releaseGroups")]
  pub release_groups: Vec<ReleaseGroup>,
}

impl ReleasePlanDocument {
  /// The group and entry holding `environment`, if any
  pub fn environment_entry(&self, environment: &str) -> Option<(&ReleaseGroup, &EnvironmentEntry)> {
    self
      .release_groups
      .iter()
      .find_map(|g| g.environment(environment).map(|e| (g, e)))
  }
}

/// A document plus the file it was loaded from
#[derive(Debug, Clone)]
pub struct StoredPlan {
  pub path: PathBuf,
  pub document: ReleasePlanDocument,
}

/// All release-plan documents of one directory.
///
/// Read fully at the start of a run; individual documents are rewritten in
/// place (atomic replace) by the transition engine. There is no in-memory
/// authoritative copy across runs.
#[derive(Debug, Default)]
pub struct PlanStore {
  plans: Vec<StoredPlan>,
}

impl PlanStore {
  /// An empty store, for runs without a release-plan directory
  pub fn empty() -> Self {
    Self::default()
  }

  /// Scan `dir` recursively and load every data file as a plan document
  pub fn open(dir: &Path) -> StagehandResult<Self> {
    let mut plans = Vec::new();
    for path in datafile::find_data_files(dir, true)? {
      let document: ReleasePlanDocument = datafile::read(&path)?;
      plans.push(StoredPlan { path, document });
    }
    Ok(Self { plans })
  }

  pub fn documents(&self) -> impl Iterator<Item = &ReleasePlanDocument> {
    self.plans.iter().map(|p| &p.document)
  }

  pub fn len(&self) -> usize {
    self.plans.len()
  }

  pub fn is_empty(&self) -> bool {
    self.plans.is_empty()
  }

  /// The plan for one `(service, version)`, if present
  pub fn find(&self, service: &str, version: &str) -> Option<&StoredPlan> {
    self
      .plans
      .iter()
      .find(|p| p.document.service.name == service && p.document.service.version == version)
  }

  pub(crate) fn find_mut(&mut self, service: &str, version: &str) -> Option<&mut StoredPlan> {
    self
      .plans
      .iter_mut()
      .find(|p| p.document.service.name == service && p.document.service.version == version)
  }
}

impl StoredPlan {
  /// Persist the document back to its source file, replace-on-success
  pub fn save(&self) -> StagehandResult<()> {
    datafile::write(&self.path, &self.document)
  }
}
