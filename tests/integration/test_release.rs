//! Release plan transitions driven the way the CLI drives them

use crate::helpers::{TestFixture, rollout_plan};
use anyhow::Result;
use stagehand::commands::{run_release_status, run_release_transition};
use stagehand::release::{PlanStore, ReleaseStatus};

#[test]
fn test_full_rollout_cascade() -> Result<()> {
  let fixture = TestFixture::new()?;
  fixture.write_release_plan(
    "api-1.1.0.json",
    &rollout_plan("api", "1.1.0", "not-started", "not-started"),
  )?;
  let dir = fixture.release_plans_dir();

  run_release_transition(&dir, "staging", "api", "1.1.0", "started")?;
  run_release_transition(&dir, "staging", "api", "1.1.0", "finished")?;

  // group 1 finished, gate to group 2 opened
  let store = PlanStore::open(&dir)?;
  let document = &store.find("api", "1.1.0").unwrap().document;
  assert_eq!(document.release_groups[0].status, ReleaseStatus::Finished);
  assert!(!document.release_groups[0].can_start);
  assert!(document.release_groups[1].can_start);
  assert_eq!(document.status, ReleaseStatus::Started);

  run_release_transition(&dir, "prod", "api", "1.1.0", "started")?;
  run_release_transition(&dir, "prod", "api", "1.1.0", "finished")?;

  // finishing the last environment of the last group finishes the plan
  let store = PlanStore::open(&dir)?;
  let document = &store.find("api", "1.1.0").unwrap().document;
  assert_eq!(document.release_groups[1].status, ReleaseStatus::Finished);
  assert_eq!(document.status, ReleaseStatus::Finished);

  Ok(())
}

#[test]
fn test_gated_group_cannot_start_early() -> Result<()> {
  let fixture = TestFixture::new()?;
  fixture.write_release_plan(
    "api-1.1.0.json",
    &rollout_plan("api", "1.1.0", "started", "started"),
  )?;
  let dir = fixture.release_plans_dir();

  // staging (group 1) is still rolling out; prod (group 2) must wait
  let err = run_release_transition(&dir, "prod", "api", "1.1.0", "started").unwrap_err();
  assert!(format!("{}", err).contains("gated"));

  // and the document on disk is untouched
  let store = PlanStore::open(&dir)?;
  let document = &store.find("api", "1.1.0").unwrap().document;
  assert_eq!(document.release_groups[1].environments[0].status, ReleaseStatus::NotStarted);

  Ok(())
}

#[test]
fn test_failure_marks_document_failed() -> Result<()> {
  let fixture = TestFixture::new()?;
  fixture.write_release_plan(
    "api-1.1.0.json",
    &rollout_plan("api", "1.1.0", "started", "started"),
  )?;
  let dir = fixture.release_plans_dir();

  run_release_transition(&dir, "staging", "api", "1.1.0", "failed")?;

  let store = PlanStore::open(&dir)?;
  let document = &store.find("api", "1.1.0").unwrap().document;
  assert_eq!(document.status, ReleaseStatus::Failed);
  assert_eq!(document.release_groups[0].status, ReleaseStatus::Failed);
  assert!(!document.release_groups[0].can_start);

  Ok(())
}

#[test]
fn test_transition_rejects_unknown_plan_and_status() -> Result<()> {
  let fixture = TestFixture::new()?;
  fixture.write_release_plan(
    "api-1.1.0.json",
    &rollout_plan("api", "1.1.0", "not-started", "not-started"),
  )?;
  let dir = fixture.release_plans_dir();

  assert!(run_release_transition(&dir, "staging", "api", "9.9.9", "started").is_err());
  assert!(run_release_transition(&dir, "staging", "api", "1.1.0", "green").is_err());

  Ok(())
}

#[test]
fn test_status_renders_table_and_json() -> Result<()> {
  let fixture = TestFixture::new()?;
  fixture.write_release_plan(
    "api-1.1.0.json",
    &rollout_plan("api", "1.1.0", "started", "started"),
  )?;
  let dir = fixture.release_plans_dir();

  run_release_status(&dir, None, false)?;
  run_release_status(&dir, Some("api"), true)?;
  run_release_status(&dir, Some("ghost"), false)?;

  Ok(())
}
