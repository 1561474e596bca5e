//! stagehand: deployment planning with release-gated version resolution
//!
//! Given a catalog of versioned service definitions, an application manifest
//! and an environment manifest, stagehand resolves a concrete service graph
//! (semver-constrained, release-plan-gated), overlays per-application and
//! per-environment properties, and renders deployment artifacts. Release
//! plans track staged rollouts across ordered environment groups and feed
//! back into which versions the resolver may pick.

pub mod catalog;
pub mod commands;
pub mod core;
pub mod export;
pub mod manifest;
pub mod release;
pub mod resolver;
