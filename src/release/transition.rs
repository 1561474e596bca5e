//! Release plan transition engine
//!
//! Applies one status change to one `(environment, service, version)` and
//! propagates it through the document's group- and plan-level state. The
//! gate is strictly sequential: group N+1 opens only when group N is fully
//! finished, a failed document is sticky and never auto-retried.

use crate::core::error::{StagehandError, StagehandResult};
use crate::release::document::{PlanStore, ReleasePlanDocument, ReleaseStatus};
use log::{debug, info};

/// Apply `new_status` to `environment` in the plan for `(service, version)`
/// and persist the mutated document back to its source file.
pub fn transition(
  store: &mut PlanStore,
  environment: &str,
  service: &str,
  version: &str,
  new_status: ReleaseStatus,
) -> StagehandResult<()> {
  let stored = store.find_mut(service, version).ok_or_else(|| {
    StagehandError::message(format!("No release plan found for {} {}", service, version))
  })?;

  apply(&mut stored.document, environment, new_status)?;
  stored.save()?;
  info!(
    "release plan {} {}: {} -> {}",
    service, version, environment, new_status
  );
  Ok(())
}

/// The in-memory half of a transition; persistence is the caller's job
fn apply(doc: &mut ReleasePlanDocument, environment: &str, new_status: ReleaseStatus) -> StagehandResult<()> {
  if new_status == ReleaseStatus::Pending {
    return Err(StagehandError::message(
      "`pending` is a computed status and cannot be assigned",
    ));
  }

  if new_status == ReleaseStatus::Started && doc.status == ReleaseStatus::NotStarted {
    doc.status = ReleaseStatus::Started;
  }

  let located = doc.release_groups.iter().enumerate().find_map(|(gi, g)| {
    g.environments
      .iter()
      .position(|e| e.name == environment)
      .map(|ei| (gi, ei))
  });
  let Some((group_idx, entry_idx)) = located else {
    return Err(StagehandError::message(format!(
      "Environment `{}` does not appear in the release plan for {} {}",
      environment, doc.service.name, doc.service.version
    )));
  };

  let group = &mut doc.release_groups[group_idx];

  // the sequential gate: a shut group's environments may not begin rollout
  if new_status == ReleaseStatus::Started && !group.can_start && group.status == ReleaseStatus::NotStarted {
    return Err(StagehandError::message(format!(
      "Group {} of {} {} is gated: the preceding group has not finished",
      group.sequence, doc.service.name, doc.service.version
    )));
  }

  group.environments[entry_idx].status = new_status;

  match new_status {
    ReleaseStatus::Started => {
      if group.status == ReleaseStatus::NotStarted {
        group.status = ReleaseStatus::Started;
      }
    }
    ReleaseStatus::Failed | ReleaseStatus::Aborted => {
      group.status = new_status;
      group.can_start = false;
      // a failed group fails the whole plan; an aborted one does not
      if new_status == ReleaseStatus::Failed {
        doc.status = ReleaseStatus::Failed;
      }
    }
    ReleaseStatus::Finished => {
      if group.is_complete() {
        group.status = ReleaseStatus::Finished;
        group.can_start = false;
        let next_sequence = group.sequence + 1;
        debug!(
          "group {} of {} {} finished",
          group.sequence, doc.service.name, doc.service.version
        );

        if let Some(next) = doc.release_groups.iter_mut().find(|g| g.sequence == next_sequence)
          && next.status == ReleaseStatus::NotStarted
          && !next.can_start
        {
          next.can_start = true;
        }

        if doc.release_groups.iter().all(|g| g.status == ReleaseStatus::Finished) {
          doc.status = ReleaseStatus::Finished;
        }
      }
    }
    // Skipped is an absorbing terminal on the entry itself; NotStarted is
    // a plain reset of the entry. Pending was rejected above.
    ReleaseStatus::NotStarted | ReleaseStatus::Skipped | ReleaseStatus::Pending => {}
  }

  Ok(())
}
