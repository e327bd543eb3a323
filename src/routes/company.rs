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
        company_dto::{BlacklistPayload, RegisterCompanyPayload, ReviewCompanyPayload},
        list_dto::{ListQuery, Page},
    },
    error::Result,
    models::{actor::Actor, company::Company},
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = RegisterCompanyPayload,
    responses(
        (status = 201, description = "Company registered, pending review", body = Company),
        (status = 400, description = "Invalid payload or already registered"),
        (status = 403, description = "Only company accounts may register")
    )
)]
#[axum::debug_handler]
pub async fn register_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<RegisterCompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let company = state.company_service.register(&actor, payload)?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[utoipa::path(
    get,
    path = "/api/companies",
    params(
        ("status" = Option<String>, Query, description = "Filter by review status"),
        ("search" = Option<String>, Query, description = "Match name or industry"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "Companies visible to the caller")
    )
)]
#[axum::debug_handler]
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let rows = state.query_service.companies(&actor, &query);
    Ok(Json(Page::paginate(rows, &query)))
}

#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    responses(
        (status = 200, description = "Company found", body = Company),
        (status = 403, description = "Company is not listed"),
        (status = 404, description = "Company not found")
    )
)]
#[axum::debug_handler]
pub async fn get_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let company = state.company_service.get(&actor, id)?;
    Ok(Json(company))
}

#[utoipa::path(
    post,
    path = "/api/companies/{id}/review",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    request_body = ReviewCompanyPayload,
    responses(
        (status = 200, description = "Registration reviewed", body = Company),
        (status = 403, description = "Only SCAD may review"),
        (status = 409, description = "Company was already reviewed")
    )
)]
#[axum::debug_handler]
pub async fn review_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewCompanyPayload>,
) -> Result<impl IntoResponse> {
    let company = state.company_service.review(&actor, id, payload).await?;
    Ok(Json(company))
}

#[utoipa::path(
    put,
    path = "/api/companies/{id}/blacklist",
    params(
        ("id" = Uuid, Path, description = "Company ID")
    ),
    request_body = BlacklistPayload,
    responses(
        (status = 200, description = "Blacklist flag updated", body = Company),
        (status = 403, description = "Only SCAD may blacklist"),
        (status = 422, description = "Blacklisting requires a reason")
    )
)]
#[axum::debug_handler]
pub async fn set_blacklist(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BlacklistPayload>,
) -> Result<impl IntoResponse> {
    let company = state
        .company_service
        .set_blacklist(&actor, id, payload)
        .await?;
    Ok(Json(company))
}
