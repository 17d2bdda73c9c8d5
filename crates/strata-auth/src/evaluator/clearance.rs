//! Mandatory access control over classified resources.
//!
//! Access is granted when the subject's clearance rank dominates the
//! resource's classification rank. Role membership plays no part here.

use crate::types::SecurityLabel;

/// Returns `true` if `subject_clearance` dominates `resource_classification`.
///
/// Unrecognized labels on either side rank as `public`.
#[must_use]
pub fn can_access(
    subject_clearance: &SecurityLabel,
    resource_classification: &SecurityLabel,
) -> bool {
    for label in [subject_clearance, resource_classification] {
        if !label.is_recognized() {
            tracing::warn!(label = %label, "Unrecognized security label ranked as public");
        }
    }
    subject_clearance.rank() >= resource_classification.rank()
}

/// Stateless clearance evaluator.
///
/// Exists so the guard can hold evaluators uniformly; it performs no store
/// access.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearanceEvaluator;

impl ClearanceEvaluator {
    /// See [`can_access`].
    #[must_use]
    pub fn can_access(&self, subject: &SecurityLabel, resource: &SecurityLabel) -> bool {
        can_access(subject, resource)
    }
}
