//! Core building blocks shared by every stagehand engine
//!
//! - **datafile**: JSON/YAML document load/store with atomic replace
//! - **error**: unified error type with contextual help and exit codes
//! - **range**: npm-style semantic-version range matching

pub mod datafile;
pub mod error;
pub mod range;
