//! Role administration and audit trail routes.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use strata_auth::types::role::{ADMIN_MANAGE_ROLES, ADMIN_VIEW_LOGS};
use strata_auth::{
    AuditQuery, Authorized, GuardOutcome, PolicyGuard, RequestContext, RoleAdmin, UserId,
};

use crate::error::ApiError;
use crate::extract::GuardContext;
use crate::response::respond;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct RoleChangeResponse {
    pub user_id: UserId,
    pub role: String,
    pub assigned: bool,
    /// `false` when membership was already in the requested state.
    pub changed: bool,
}

#[derive(Clone, Copy)]
enum Membership {
    Assign,
    Revoke,
}

/// `POST /admin/users/{user_id}/roles/{role}`
pub async fn assign_role(
    State(state): State<AppState>,
    GuardContext(ctx): GuardContext,
) -> Result<Response, ApiError> {
    change_membership(state, ctx, Membership::Assign).await
}

/// `DELETE /admin/users/{user_id}/roles/{role}`
pub async fn revoke_role(
    State(state): State<AppState>,
    GuardContext(ctx): GuardContext,
) -> Result<Response, ApiError> {
    change_membership(state, ctx, Membership::Revoke).await
}

async fn change_membership(
    state: AppState,
    ctx: RequestContext,
    membership: Membership,
) -> Result<Response, ApiError> {
    let (Some(user_id), Some(role)) = (ctx.param("user_id"), ctx.param("role")) else {
        return Err(ApiError::BadRequest("user_id and role are required".into()));
    };
    let user_id = UserId::new(user_id);
    let role = role.to_string();

    let (tx, services) = state.begin();
    let admin = RoleAdmin::new(tx.as_ref(), services.audit());
    let source = ctx.source.clone();

    let handler = PolicyGuard::permission(ADMIN_MANAGE_ROLES).wrap(|authorized: Authorized| {
        let (user_id, role, source) = (user_id.clone(), role.clone(), source.clone());
        async move {
            let actor = authorized.user.id;
            let changed = match membership {
                Membership::Assign => admin.assign(&actor, &user_id, &role, source).await?,
                Membership::Revoke => admin.revoke(&actor, &user_id, &role, source).await?,
            };
            Ok(RoleChangeResponse {
                user_id,
                role,
                assigned: matches!(membership, Membership::Assign),
                changed,
            })
        }
    });
    let outcome = handler.call(&services, &ctx).await?;
    tx.commit().await?;

    Ok(respond(outcome, state.session(), |body| {
        Json(body).into_response()
    }))
}

/// `GET /admin/audit?actor_id=&action=&result=&limit=`
///
/// Newest entries first. `limit` is capped at `server.audit_page_limit`.
/// The filter is only parsed once the caller is allowed, so a malformed
/// query from an anonymous caller still redirects to login.
pub async fn list_audit(
    State(state): State<AppState>,
    GuardContext(ctx): GuardContext,
    query: Result<Query<AuditQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let (tx, services) = state.begin();
    let outcome = PolicyGuard::permission(ADMIN_VIEW_LOGS)
        .authorize(&services, &ctx)
        .await?;

    let outcome = match outcome {
        GuardOutcome::Allowed(_) => {
            let Query(mut query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
            let cap = state.audit_page_limit();
            query.limit = Some(query.limit.map_or(cap, |limit| limit.min(cap)));
            GuardOutcome::Allowed(services.audit().list(&query).await?)
        }
        other => other.map(|_| Vec::new()),
    };
    tx.commit().await?;

    Ok(respond(outcome, state.session(), |entries| {
        Json(entries).into_response()
    }))
}
