use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    Extension,
};

use uuid::Uuid;

use crate::{
    dto::list_dto::{AuditQuery, ListQuery, Page},
    error::Result,
    models::actor::Actor,
    services::authorization::{self, Operation},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Per-status counts within the caller's scope")
    )
)]
#[axum::debug_handler]
pub async fn get_dashboard_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.query_service.stats(&actor)))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "The caller's notifications, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let events = state.notification_service.inbox(&actor);
    Ok(Json(Page::paginate(events, &query)))
}

#[utoipa::path(
    get,
    path = "/api/audit",
    params(
        ("entity_type" = Option<String>, Query, description = "submission, application, company, job, evaluation or cycle"),
        ("entity_id" = Option<Uuid>, Query, description = "One entity"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Audit log, newest first"),
        (status = 403, description = "Only SCAD may read the audit log")
    )
)]
#[axum::debug_handler]
pub async fn list_audit(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse> {
    authorization::authorize_role(&actor, Operation::ReadAudit)?;
    let entries = state
        .audit_service
        .list(query.entity_type, query.entity_id);
    let paging = ListQuery {
        page: query.page,
        per_page: query.per_page,
        ..Default::default()
    };
    Ok(Json(Page::paginate(entries, &paging)))
}
