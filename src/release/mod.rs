//! Release plans: staged rollouts across ordered environment groups
//!
//! - **document**: the persisted plan model and its file-backed store
//! - **index**: per-run `(service, version) → effective status` lookup
//! - **transition**: the sequential-gate state machine

pub mod document;
pub mod index;
pub mod transition;

pub use document::{PlanStore, ReleasePlanDocument, ReleaseStatus};
pub use index::ReleaseIndex;
pub use transition::transition;
