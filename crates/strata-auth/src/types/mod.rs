//! Typed records read from the directory store.

pub mod label;
pub mod resource;
pub mod role;
pub mod user;

pub use label::{ClearanceLevel, SecurityLabel};
pub use resource::{FILE_TARGET, ProtectedResource};
pub use role::{Permission, Role, default_permissions, default_roles};
pub use user::{User, UserBuilder, UserId};
