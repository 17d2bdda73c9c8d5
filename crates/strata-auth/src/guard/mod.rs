//! Policy guard: the composition point of authentication presence,
//! evaluators, auditing and dispatch.
//!
//! Decision order for every invocation:
//!
//! 1. no subject in the context → `Unauthenticated(NoSession)`
//! 2. subject unknown or inactive in the directory → `Unauthenticated(SessionExpired)`
//! 3. a classified target cannot be resolved → `NotFound`
//! 4. requirements evaluated in declaration order
//! 5. first failure → one audit entry, then `Denied`
//! 6. all pass → the wrapped operation runs, then `Allowed`
//!
//! Steps 1 to 3 never write audit entries.

pub mod context;
pub mod outcome;
pub mod policy;

pub use context::RequestContext;
pub use outcome::{Denial, DenialContext, DenialKind, GuardOutcome, UnauthenticatedReason};
pub use policy::{Authorized, GuardServices, Guarded, PolicyGuard, Requirement, TargetResolver};
