//! HTTP routes.
//!
//! Organized by functionality:
//! - `files` - classified file access (RBAC + MAC)
//! - `admin` - role administration and the audit trail
//! - `health` - liveness probe

pub mod admin;
pub mod files;
pub mod health;
