use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    Extension,
};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        list_dto::{ListQuery, Page},
        submission_dto::{AssignFacultyPayload, CreateSubmissionPayload, TransitionSubmissionPayload},
    },
    error::Result,
    models::{actor::Actor, submission::Submission},
    services::{
        authorization::{self, Operation},
        export_service::ExportService,
    },
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = CreateSubmissionPayload,
    responses(
        (status = 201, description = "Submission created", body = Submission),
        (status = 400, description = "Invalid payload"),
        (status = 422, description = "Cycle not accepting submissions or evaluation form missing")
    )
)]
#[axum::debug_handler]
pub async fn create_submission(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<CreateSubmissionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let submission = state.submission_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

#[utoipa::path(
    get,
    path = "/api/submissions",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Match student, company or supervisor name"),
        ("from" = Option<String>, Query, description = "Submitted on or after (YYYY-MM-DD)"),
        ("to" = Option<String>, Query, description = "Submitted on or before (YYYY-MM-DD)"),
        ("assigned" = Option<bool>, Query, description = "Only assigned / unassigned"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Submissions visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let rows = state.query_service.submissions(&actor, &query);
    Ok(Json(Page::paginate(rows, &query)))
}

#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    params(
        ("id" = Uuid, Path, description = "Submission ID")
    ),
    responses(
        (status = 200, description = "Submission found", body = Submission),
        (status = 403, description = "Outside the caller's scope"),
        (status = 404, description = "Submission not found")
    )
)]
#[axum::debug_handler]
pub async fn get_submission(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let submission = state.submission_service.get(&actor, id)?;
    Ok(Json(submission))
}

#[utoipa::path(
    post,
    path = "/api/submissions/{id}/transition",
    params(
        ("id" = Uuid, Path, description = "Submission ID")
    ),
    request_body = TransitionSubmissionPayload,
    responses(
        (status = 200, description = "Transition applied", body = Submission),
        (status = 403, description = "Role or scope does not allow this action"),
        (status = 404, description = "Submission not found"),
        (status = 409, description = "Illegal transition or concurrent modification"),
        (status = 422, description = "Missing reason or document")
    )
)]
#[axum::debug_handler]
pub async fn transition_submission(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionSubmissionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let submission = state
        .submission_service
        .transition(&actor, id, payload)
        .await?;
    Ok(Json(submission))
}

#[utoipa::path(
    post,
    path = "/api/submissions/{id}/assign",
    params(
        ("id" = Uuid, Path, description = "Submission ID")
    ),
    request_body = AssignFacultyPayload,
    responses(
        (status = 200, description = "Faculty assigned", body = Submission),
        (status = 403, description = "Only SCAD may assign"),
        (status = 404, description = "Submission not found")
    )
)]
#[axum::debug_handler]
pub async fn assign_faculty(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignFacultyPayload>,
) -> Result<impl IntoResponse> {
    let submission = state
        .submission_service
        .assign_faculty(&actor, id, payload)
        .await?;
    Ok(Json(submission))
}

#[utoipa::path(
    get,
    path = "/api/submissions/export",
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Search query"),
        ("from" = Option<String>, Query, description = "Submitted on or after"),
        ("to" = Option<String>, Query, description = "Submitted on or before"),
        ("assigned" = Option<bool>, Query, description = "Only assigned / unassigned")
    ),
    responses(
        (status = 200, description = "XLSX report of the filtered submissions"),
        (status = 403, description = "Only SCAD may export")
    )
)]
#[axum::debug_handler]
pub async fn export_submissions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    authorization::authorize_role(&actor, Operation::Export)?;

    let submissions = state.query_service.submissions(&actor, &query);
    let cycles: HashMap<_, _> = state
        .store
        .cycles
        .all()
        .into_iter()
        .map(|c| (c.record.id, c.record))
        .collect();
    let now = state.clock.now();
    let buffer = ExportService::generate_submissions_xlsx(&submissions, &cycles, now)?;

    let disposition = format!(
        "attachment; filename=\"submissions_{}.xlsx\"",
        now.format("%Y%m%d")
    );
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
