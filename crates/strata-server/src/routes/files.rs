//! Classified file access.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use strata_auth::types::role::FILE_DOWNLOAD;
use strata_auth::{
    AuditAction, AuthError, Authorized, FILE_TARGET, PolicyGuard, ProtectedResource,
    TargetResolver,
};

use crate::error::ApiError;
use crate::extract::GuardContext;
use crate::response::respond;
use crate::server::AppState;

/// `file.download` and clearance over the file named by `{file_id}`.
pub fn download_guard() -> PolicyGuard {
    PolicyGuard::permission(FILE_DOWNLOAD)
        .and(PolicyGuard::clearance(TargetResolver::path_param(
            FILE_TARGET,
            "file_id",
        )))
        .audit_success(AuditAction::FileDownload)
}

/// `GET /files/{file_id}/download`
///
/// Returns the file's metadata record once both the permission and the
/// clearance checks pass.
pub async fn download(
    State(state): State<AppState>,
    GuardContext(ctx): GuardContext,
) -> Result<Response, ApiError> {
    let (tx, services) = state.begin();

    let handler = download_guard().wrap(|authorized: Authorized| async move {
        authorized
            .targets
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::internal("download authorized without a target"))
    });
    let outcome = handler.call(&services, &ctx).await?;

    // Denials carry their audit entry; commit it along with any success entry.
    tx.commit().await?;

    Ok(respond(outcome, state.session(), |file: ProtectedResource| {
        tracing::info!(file_id = %file.id, classification = %file.classification, "File released");
        Json(file).into_response()
    }))
}
