use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{CreateApplicationPayload, TransitionApplicationPayload},
        list_dto::{ListQuery, Page},
    },
    error::Result,
    models::{actor::Actor, application::Application},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Application created", body = Application),
        (status = 200, description = "The caller already applied to this job; the existing application is returned unchanged", body = Application),
        (status = 404, description = "Job not found"),
        (status = 422, description = "Company is blacklisted")
    )
)]
#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let applied = state.application_service.create(&actor, payload).await?;
    let status = if applied.is_new() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(applied.into_inner())))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Match student, company or job title"),
        ("from" = Option<String>, Query, description = "Applied on or after (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Applied on or before (YYYY-MM-DD)"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Applications visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let rows = state.query_service.applications(&actor, &query);
    Ok(Json(Page::paginate(rows, &query)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application found", body = Application),
        (status = 403, description = "Outside the caller's scope"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get(&actor, id)?;
    Ok(Json(application))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/transition",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = TransitionApplicationPayload,
    responses(
        (status = 200, description = "Transition applied", body = Application),
        (status = 403, description = "Only the hiring company may move an application"),
        (status = 409, description = "Illegal transition or concurrent modification")
    )
)]
#[axum::debug_handler]
pub async fn transition_application(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .application_service
        .transition(&actor, id, payload)
        .await?;
    Ok(Json(application))
}
