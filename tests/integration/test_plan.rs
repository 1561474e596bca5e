//! End-to-end planning passes: resolution, overlays, artifacts, write-back

use crate::helpers::{APPLICATION_YML, STAGING_JSON, TestFixture, rollout_plan, write_default_catalog};
use anyhow::Result;
use stagehand::commands::run_plan;
use stagehand::manifest::EnvironmentManifest;
use stagehand::release::{PlanStore, ReleaseStatus};

#[test]
fn test_plan_end_to_end() -> Result<()> {
  let fixture = TestFixture::new()?;
  write_default_catalog(&fixture)?;
  let app = fixture.write_application(APPLICATION_YML)?;
  let env = fixture.write_environment("staging", STAGING_JSON)?;

  run_plan(&fixture.plan_options(app, env.clone()))?;

  // api resolved at the highest tag satisfying ^1.0.0
  let api_config = std::fs::read_to_string(fixture.output_dir().join("services/api/configMap.env"))?;
  assert_eq!(
    api_config,
    "CACHE_URL=redis://cache.staging.local\r\nDB_HOST=db.staging.local\r\n"
  );

  let frontend_config = std::fs::read_to_string(fixture.output_dir().join("services/frontend/configMap.env"))?;
  assert_eq!(frontend_config, "API_URL=http://api:8080\r\n");

  // gateway descriptor: discriminator label becomes the capture term
  let gateway = std::fs::read_to_string(
    fixture
      .output_dir()
      .join("infrastructure/vamp/gateways/frontend.yaml"),
  )?;
  assert_eq!(
    gateway,
    "name: frontend\nport: 9050\nselector: label(app)(frontend) && label(version)((.*))\n"
  );

  // environment manifest rewritten in place with the computed service list
  let manifest = EnvironmentManifest::load(&env)?;
  assert!(manifest.updated);
  let computed: Vec<(&str, &str)> = manifest
    .computed_services
    .iter()
    .map(|c| (c.name.as_str(), c.version.as_str()))
    .collect();
  assert_eq!(computed, vec![("api", "1.1.0"), ("frontend", "0.3.0")]);

  Ok(())
}

#[test]
fn test_plan_falls_back_when_best_version_is_blocked() -> Result<()> {
  let fixture = TestFixture::new()?;
  write_default_catalog(&fixture)?;
  let app = fixture.write_application(APPLICATION_YML)?;
  let env = fixture.write_environment("staging", STAGING_JSON)?;
  fixture.write_release_plan("api-1.1.0.json", &rollout_plan("api", "1.1.0", "aborted", "started"))?;

  run_plan(&fixture.plan_options(app, env.clone()))?;

  // the next usable candidate within range wins
  let manifest = EnvironmentManifest::load(&env)?;
  assert!(
    manifest
      .computed_services
      .iter()
      .any(|c| c.name == "api" && c.version == "1.0.0")
  );

  // 1.0.0 does not declare CACHE_URL; the environment override for it is
  // skipped, not fatal
  let api_config = std::fs::read_to_string(fixture.output_dir().join("services/api/configMap.env"))?;
  assert_eq!(api_config, "DB_HOST=db.staging.local\r\n");

  Ok(())
}

#[test]
fn test_plan_aborts_when_every_candidate_is_blocked() -> Result<()> {
  let fixture = TestFixture::new()?;
  write_default_catalog(&fixture)?;
  let app = fixture.write_application(APPLICATION_YML)?;
  let env = fixture.write_environment("staging", STAGING_JSON)?;
  fixture.write_release_plan("api-1.0.0.json", &rollout_plan("api", "1.0.0", "not-started", "failed"))?;
  fixture.write_release_plan("api-1.1.0.json", &rollout_plan("api", "1.1.0", "aborted", "started"))?;

  let err = run_plan(&fixture.plan_options(app, env.clone())).unwrap_err();
  let message = format!("{}", err);
  assert!(message.contains("api"), "unexpected message: {}", message);
  assert!(message.contains("release-blocked"), "unexpected message: {}", message);

  // all-or-nothing: no artifacts, no manifest write-back
  assert!(!fixture.output_dir().join("services").exists());
  assert!(!fixture.output_dir().join("infrastructure").exists());
  assert!(!EnvironmentManifest::load(&env)?.updated);

  Ok(())
}

#[test]
fn test_plan_starts_rollout_for_entering_versions() -> Result<()> {
  let fixture = TestFixture::new()?;
  write_default_catalog(&fixture)?;
  let app = fixture.write_application(APPLICATION_YML)?;
  let env = fixture.write_environment("staging", STAGING_JSON)?;
  fixture.write_release_plan(
    "api-1.1.0.json",
    &rollout_plan("api", "1.1.0", "not-started", "not-started"),
  )?;

  run_plan(&fixture.plan_options(app, env))?;

  let store = PlanStore::open(&fixture.release_plans_dir())?;
  let document = &store.find("api", "1.1.0").unwrap().document;
  assert_eq!(document.status, ReleaseStatus::Started);
  assert_eq!(document.release_groups[0].status, ReleaseStatus::Started);
  assert_eq!(document.release_groups[0].environments[0].status, ReleaseStatus::Started);
  // prod stays gated
  assert!(!document.release_groups[1].can_start);
  assert_eq!(document.release_groups[1].environments[0].status, ReleaseStatus::NotStarted);

  Ok(())
}

#[test]
fn test_plan_rejects_environment_mismatch() -> Result<()> {
  let fixture = TestFixture::new()?;
  write_default_catalog(&fixture)?;
  let app = fixture.write_application(APPLICATION_YML)?;
  let env = fixture.write_environment("prod", &STAGING_JSON.replace("staging", "prod"))?;

  let err = run_plan(&fixture.plan_options(app, env)).unwrap_err();
  assert!(format!("{}", err).contains("mismatch"));

  Ok(())
}

#[test]
fn test_plan_rejects_unsupported_output_format() -> Result<()> {
  let fixture = TestFixture::new()?;
  write_default_catalog(&fixture)?;
  let app = fixture.write_application(APPLICATION_YML)?;
  let env = fixture.write_environment("staging", STAGING_JSON)?;

  let mut options = fixture.plan_options(app, env);
  options.output_format = "ksonnet".to_string();

  let err = run_plan(&options).unwrap_err();
  assert!(format!("{}", err).contains("Unsupported output format"));

  Ok(())
}
