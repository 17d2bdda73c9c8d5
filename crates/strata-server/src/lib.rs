//! HTTP adapter for the Strata authorization engine.
//!
//! Resolves the request context, runs route guards against a
//! request-scoped directory transaction and translates guard outcomes into
//! redirects.

pub mod config;
pub mod error;
pub mod extract;
pub mod observability;
pub mod response;
pub mod routes;
pub mod server;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{AppState, build_app, build_router, run};
