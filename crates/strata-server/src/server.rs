use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use strata_auth::{AuditLogger, AuthConfig, GuardServices};
use strata_db_memory::{MemoryDirectory, MemoryTransaction};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, SessionConfig};
use crate::routes;

/// Shared application state.
///
/// Cheap to clone; every request opens its own transaction via
/// [`AppState::begin`].
#[derive(Clone)]
pub struct AppState {
    directory: MemoryDirectory,
    auth: Arc<AuthConfig>,
    session: Arc<SessionConfig>,
    audit_page_limit: usize,
}

impl AppState {
    /// Creates state from configuration, seeding the directory from the
    /// bootstrap section.
    pub fn new(cfg: &AppConfig) -> Self {
        Self::with_directory(cfg, MemoryDirectory::from_seed(cfg.bootstrap.to_seed()))
    }

    /// Creates state over an existing directory.
    pub fn with_directory(cfg: &AppConfig, directory: MemoryDirectory) -> Self {
        Self {
            directory,
            auth: Arc::new(cfg.auth.clone()),
            session: Arc::new(cfg.session.clone()),
            audit_page_limit: cfg.server.audit_page_limit,
        }
    }

    pub fn directory(&self) -> &MemoryDirectory {
        &self.directory
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn audit_page_limit(&self) -> usize {
        self.audit_page_limit
    }

    /// Opens a request transaction and the guard services bound to it.
    ///
    /// Directory reads and audit writes made through the services share the
    /// transaction. Commit it once the handler succeeds; dropping it rolls
    /// everything back.
    pub fn begin(&self) -> (Arc<MemoryTransaction>, GuardServices) {
        let tx = self.directory.begin();
        let audit = AuditLogger::new(tx.clone(), self.auth.audit.clone());
        let services = GuardServices::new(tx.clone(), audit);
        (tx, services)
    }
}

pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/files/{file_id}/download", get(routes::files::download))
        .route(
            "/admin/users/{user_id}/roles/{role}",
            post(routes::admin::assign_role).delete(routes::admin::revoke_role),
        )
        .route("/admin/audit", get(routes::admin::list_audit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit_bytes)),
        )
        .with_state(state)
}

/// Builds the application router from configuration.
pub fn build_app(cfg: &AppConfig) -> Router {
    let state = AppState::new(cfg);
    tracing::info!(
        roles = cfg.bootstrap.roles.len(),
        users = cfg.bootstrap.users.len(),
        resources = cfg.bootstrap.resources.len(),
        default_roles = cfg.bootstrap.default_roles,
        "Directory bootstrapped"
    );
    build_router(state, cfg.server.body_limit_bytes)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn run(cfg: AppConfig) -> std::io::Result<()> {
    let addr = cfg.addr();
    let app = build_app(&cfg);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
