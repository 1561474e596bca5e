//! The planning pass: load, resolve, overlay, export, kick off rollouts
//!
//! One offline computation per invocation: catalog and manifests are read,
//! the release-plan index is built once, the graph is resolved and
//! overlaid, artifacts are rendered, and only then are `Started`
//! transitions applied and the environment manifest rewritten. A failure
//! anywhere before export leaves plan state and output untouched.

use crate::catalog::ServiceCatalog;
use crate::core::error::{StagehandError, StagehandResult};
use crate::export::{self, OutputFormat};
use crate::manifest::{self, ApplicationManifest, ComputedService, EnvironmentManifest};
use crate::release::{PlanStore, ReleaseIndex, ReleaseStatus, transition};
use crate::resolver::{ResolvedGraph, Resolver, overlay};
use log::info;
use std::path::PathBuf;

/// Inputs of one planning pass
#[derive(Debug, Clone)]
pub struct PlanOptions {
  /// Service-definition directory
  pub service_defs: PathBuf,
  /// Application manifest file
  pub application: Option<PathBuf>,
  /// Application manifest directory (first data file wins)
  pub application_defs: Option<PathBuf>,
  /// Environment manifest file
  pub environment: Option<PathBuf>,
  /// Environment manifest directory, searched by environment name
  pub environment_defs: Option<PathBuf>,
  /// Release-plan document directory; omitted means no gating
  pub release_plans: Option<PathBuf>,
  /// Output directory for rendered artifacts
  pub output: PathBuf,
  /// Artifact format selector
  pub output_format: String,
}

/// Run one resolve-and-render pass
pub fn run_plan(options: &PlanOptions) -> StagehandResult<()> {
  let format: OutputFormat = options.output_format.parse()?;

  let catalog = ServiceCatalog::load(&options.service_defs)?;
  info!("loaded {} service definitions", catalog.len());

  let application = load_application(options)?;
  let environment_path = locate_environment(options, &application)?;
  let mut environment = EnvironmentManifest::load(&environment_path)?;
  manifest::check_environment_match(&application, &environment)?;

  let mut store = match &options.release_plans {
    Some(dir) => PlanStore::open(dir)?,
    None => PlanStore::empty(),
  };
  let target = application.environment.name.clone();
  let index = ReleaseIndex::build(&target, store.documents());

  let graph = {
    let resolver = Resolver::new(&catalog, &index);
    let mut graph = resolver.resolve(&application.requested())?;
    overlay::apply_overlays(&mut graph, &application, &environment);
    graph
  };
  info!("resolved {} services for `{}`", graph.len(), target);

  export::export(&options.output, format, &graph, &environment)?;

  start_rollouts(&mut store, &target, &graph)?;

  let computed = graph
    .iter()
    .map(|s| ComputedService {
      name: s.name.clone(),
      version: s.tag.clone(),
    })
    .collect();
  environment.record_computed(computed);
  environment.store(&environment_path)?;

  print_summary(&target, &graph, options);
  Ok(())
}

fn load_application(options: &PlanOptions) -> StagehandResult<ApplicationManifest> {
  match (&options.application, &options.application_defs) {
    (Some(file), _) => ApplicationManifest::load(file),
    (None, Some(dir)) => ApplicationManifest::load_from_dir(dir),
    (None, None) => Err(StagehandError::with_help(
      "No application definition given",
      "Pass --application <file> or --application-defs <dir>",
    )),
  }
}

fn locate_environment(options: &PlanOptions, application: &ApplicationManifest) -> StagehandResult<PathBuf> {
  match (&options.environment, &options.environment_defs) {
    (Some(file), _) => Ok(file.clone()),
    (None, Some(dir)) => EnvironmentManifest::find_in_dir(dir, &application.environment.name),
    (None, None) => Err(StagehandError::with_help(
      "No environment definition given",
      "Pass --environment <file> or --environment-defs <dir>",
    )),
  }
}

/// Mark every resolved version that has a plan entry still `NotStarted` for
/// this environment as `Started`
fn start_rollouts(store: &mut PlanStore, environment: &str, graph: &ResolvedGraph) -> StagehandResult<()> {
  let mut entering: Vec<(String, String)> = Vec::new();
  for service in graph.iter() {
    if let Some(stored) = store.find(&service.name, &service.tag)
      && let Some((_, entry)) = stored.document.environment_entry(environment)
      && entry.status == ReleaseStatus::NotStarted
    {
      entering.push((service.name.clone(), service.tag.clone()));
    }
  }

  for (name, version) in entering {
    transition(store, environment, &name, &version, ReleaseStatus::Started)?;
  }
  Ok(())
}

fn print_summary(environment: &str, graph: &ResolvedGraph, options: &PlanOptions) {
  println!("📦 Deployment plan for `{}`\n", environment);
  println!("{:<24} {:<12} Replicas", "Service", "Version");
  println!("─────────────────────────────────────────────");
  for service in graph.iter() {
    println!("{:<24} {:<12} {}", service.name, service.tag, service.replicas);
  }
  println!("\nArtifacts written to {}", options.output.display());
}
