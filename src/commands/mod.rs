//! CLI commands for stagehand
//!
//! - **plan**: the resolve-and-render pass: load catalog and manifests,
//!   resolve the graph under release-plan gating, overlay properties,
//!   export artifacts, kick off rollouts, rewrite the environment manifest
//! - **release**: inspect persisted release plans and apply explicit
//!   status transitions

pub mod plan;
pub mod release;

pub use plan::{PlanOptions, run_plan};
pub use release::{run_release_status, run_release_transition};
