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
        evaluation_dto::EvaluationPayload,
        list_dto::{ListQuery, Page},
    },
    error::Result,
    models::{actor::Actor, evaluation::Evaluation},
    services::evaluation_service::EvaluationMode,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications/{id}/evaluation",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = EvaluationPayload,
    responses(
        (status = 201, description = "Evaluation submitted", body = Evaluation),
        (status = 403, description = "Only the hiring company may evaluate"),
        (status = 409, description = "Already evaluated or internship not completed"),
        (status = 422, description = "Rating is not a whole number from 1 to 5")
    )
)]
#[axum::debug_handler]
pub async fn create_evaluation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let evaluation = state
        .evaluation_service
        .create_or_update(&actor, id, payload, EvaluationMode::Create)
        .await?;
    Ok((StatusCode::CREATED, Json(evaluation)))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/evaluation",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = EvaluationPayload,
    responses(
        (status = 200, description = "Evaluation updated", body = Evaluation),
        (status = 403, description = "Only the authoring company may edit"),
        (status = 404, description = "No evaluation for this application"),
        (status = 422, description = "Rating is not a whole number from 1 to 5")
    )
)]
#[axum::debug_handler]
pub async fn update_evaluation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let evaluation = state
        .evaluation_service
        .create_or_update(&actor, id, payload, EvaluationMode::Update)
        .await?;
    Ok(Json(evaluation))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}/evaluation",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 204, description = "Evaluation deleted"),
        (status = 403, description = "Only the authoring company may delete"),
        (status = 404, description = "No evaluation for this application")
    )
)]
#[axum::debug_handler]
pub async fn delete_evaluation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.evaluation_service.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/evaluation",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Evaluation found", body = Evaluation),
        (status = 404, description = "No evaluation for this application")
    )
)]
#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let evaluation = state.evaluation_service.get(&actor, id)?;
    Ok(Json(evaluation))
}

#[utoipa::path(
    get,
    path = "/api/evaluations",
    params(
        ("search" = Option<String>, Query, description = "Match student name or job title"),
        ("from" = Option<String>, Query, description = "Submitted on or after (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Submitted on or before (YYYY-MM-DD)"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Evaluations visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn list_evaluations(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let rows = state.query_service.evaluations(&actor, &query);
    Ok(Json(Page::paginate(rows, &query)))
}
