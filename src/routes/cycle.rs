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
        cycle_dto::CreateCyclePayload,
        list_dto::{ListQuery, Page},
    },
    error::Result,
    models::{actor::Actor, cycle::SubmissionCycle},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/cycles",
    request_body = CreateCyclePayload,
    responses(
        (status = 201, description = "Cycle created", body = SubmissionCycle),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Only SCAD may manage cycles")
    )
)]
#[axum::debug_handler]
pub async fn create_cycle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateCyclePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let cycle = state.cycle_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

#[utoipa::path(
    get,
    path = "/api/cycles",
    params(
        ("status" = Option<String>, Query, description = "active or closed"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Submission cycles")
    )
)]
#[axum::debug_handler]
pub async fn list_cycles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let rows = state.query_service.cycles(&actor, &query);
    Ok(Json(Page::paginate(rows, &query)))
}

#[utoipa::path(
    post,
    path = "/api/cycles/{id}/activate",
    params(
        ("id" = Uuid, Path, description = "Cycle ID")
    ),
    responses(
        (status = 200, description = "Cycle active; any other active cycle closed", body = SubmissionCycle),
        (status = 403, description = "Only SCAD may manage cycles"),
        (status = 409, description = "Cycle has already ended")
    )
)]
#[axum::debug_handler]
pub async fn activate_cycle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let cycle = state.cycle_service.activate(&actor, id).await?;
    Ok(Json(cycle))
}

#[utoipa::path(
    post,
    path = "/api/cycles/{id}/close",
    params(
        ("id" = Uuid, Path, description = "Cycle ID")
    ),
    responses(
        (status = 200, description = "Cycle closed", body = SubmissionCycle),
        (status = 403, description = "Only SCAD may manage cycles")
    )
)]
#[axum::debug_handler]
pub async fn close_cycle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let cycle = state.cycle_service.close(&actor, id).await?;
    Ok(Json(cycle))
}
