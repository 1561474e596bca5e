//! Test fixtures: a deployable catalog, manifests and release plans on disk

use anyhow::Result;
use stagehand::commands::PlanOptions;
use std::path::PathBuf;
use tempfile::TempDir;

/// A temp directory laid out like a deployment repository
pub struct TestFixture {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestFixture {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    for dir in ["services", "environments", "release-plans", "output"] {
      std::fs::create_dir_all(path.join(dir))?;
    }
    Ok(Self { _root: root, path })
  }

  pub fn write_service(&self, name: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join("services").join(format!("{}.json", name)), content)?;
    Ok(())
  }

  pub fn write_application(&self, content: &str) -> Result<PathBuf> {
    let path = self.path.join("application.yml");
    std::fs::write(&path, content)?;
    Ok(path)
  }

  pub fn write_environment(&self, name: &str, content: &str) -> Result<PathBuf> {
    let path = self.path.join("environments").join(format!("{}.json", name));
    std::fs::write(&path, content)?;
    Ok(path)
  }

  pub fn write_release_plan(&self, file: &str, content: &str) -> Result<PathBuf> {
    let path = self.path.join("release-plans").join(file);
    std::fs::write(&path, content)?;
    Ok(path)
  }

  pub fn release_plans_dir(&self) -> PathBuf {
    self.path.join("release-plans")
  }

  pub fn output_dir(&self) -> PathBuf {
    self.path.join("output")
  }

  /// Options for a full pass over this fixture
  pub fn plan_options(&self, application: PathBuf, environment: PathBuf) -> PlanOptions {
    PlanOptions {
      service_defs: self.path.join("services"),
      application: Some(application),
      application_defs: None,
      environment: Some(environment),
      environment_defs: None,
      release_plans: Some(self.release_plans_dir()),
      output: self.output_dir(),
      output_format: "kustomize".to_string(),
    }
  }
}

/// Two services: `frontend@0.3.0` depending on `api@^1.0.0`, with `api`
/// published at 1.0.0, 1.1.0 and 2.0.0
pub fn write_default_catalog(fixture: &TestFixture) -> Result<()> {
  fixture.write_service(
    "api",
    r#"{
      "name": "api",
      "environment_variables": ["DB_HOST"],
      "labels": [{"app": "<name>", "version": "<tag>"}],
      "versions": [
        {"tag": "1.0.0", "dependencies": []},
        {"tag": "1.1.0", "dependencies": [], "environment_variables": ["CACHE_URL"]},
        {"tag": "2.0.0", "dependencies": []}
      ]
    }"#,
  )?;
  fixture.write_service(
    "frontend",
    r#"{
      "name": "frontend",
      "environment_variables": ["API_URL"],
      "labels": [{"app": "<name>", "version": "<tag>"}],
      "versions": [
        {"tag": "0.3.0", "dependencies": [{"name": "api", "version": "^1.0.0"}]}
      ]
    }"#,
  )?;
  Ok(())
}

pub const APPLICATION_YML: &str = "\
environment:
  name: staging
services:
  - name: frontend
    version: ^0.3.0
    environment_variables:
      api_url: http://api:8080
";

pub const STAGING_JSON: &str = r#"{
  "environment": {"name": "staging"},
  "services": [
    {
      "name": "frontend",
      "port": 9050,
      "replicas": 2,
      "vamp": {"gateway": {"selector": {"type": "label", "discriminator": "version"}}}
    },
    {
      "name": "api",
      "environment_variables": {
        "db_host": "db.staging.local",
        "cache_url": "redis://cache.staging.local"
      }
    }
  ]
}"#;

/// A two-group rollout plan for one `(service, version)`: staging first,
/// prod gated behind it
pub fn rollout_plan(service: &str, version: &str, staging_status: &str, document_status: &str) -> String {
  format!(
    r#"{{
      "service": {{"name": "{}", "version": "{}"}},
      "status": "{}",
      "releaseGroups": [
        {{
          "group": 1,
          "status": "not-started",
          "canStart": true,
          "environments": [{{"name": "staging", "status": "{}"}}]
        }},
        {{
          "group": 2,
          "status": "not-started",
          "canStart": false,
          "environments": [{{"name": "prod", "status": "not-started"}}]
        }}
      ]
    }}"#,
    service, version, document_status, staging_status
  )
}
