//! Access evaluators.
//!
//! - [`permission`] - RBAC: union of role-granted permissions
//! - [`clearance`] - MAC: clearance dominance over classification
//!
//! The two models are orthogonal. Operations gated by both must pass both.

pub mod clearance;
pub mod permission;

pub use clearance::{ClearanceEvaluator, can_access};
pub use permission::PermissionEvaluator;
