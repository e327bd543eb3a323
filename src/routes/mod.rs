pub mod application;
pub mod company;
pub mod cycle;
pub mod dashboard;
pub mod evaluation;
pub mod health;
pub mod job;
pub mod openapi;
pub mod submission;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use utoipa::OpenApi;

use crate::middleware::{auth::require_actor, rate_limit};
use crate::AppState;

/// All routes with authentication and per-actor rate limiting applied to the
/// `/api` surface. Outer layers (CORS, tracing, body limit) are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/cycles",
            get(cycle::list_cycles).post(cycle::create_cycle),
        )
        .route("/api/cycles/:id/activate", post(cycle::activate_cycle))
        .route("/api/cycles/:id/close", post(cycle::close_cycle))
        .route(
            "/api/submissions",
            get(submission::list_submissions).post(submission::create_submission),
        )
        .route(
            "/api/submissions/export",
            get(submission::export_submissions),
        )
        .route("/api/submissions/:id", get(submission::get_submission))
        .route(
            "/api/submissions/:id/transition",
            post(submission::transition_submission),
        )
        .route(
            "/api/submissions/:id/assign",
            post(submission::assign_faculty),
        )
        .route(
            "/api/companies",
            get(company::list_companies).post(company::register_company),
        )
        .route("/api/companies/:id", get(company::get_company))
        .route("/api/companies/:id/review", post(company::review_company))
        .route("/api/companies/:id/blacklist", put(company::set_blacklist))
        .route("/api/jobs", get(job::list_jobs).post(job::create_job))
        .route("/api/jobs/:id", get(job::get_job))
        .route(
            "/api/applications",
            get(application::list_applications).post(application::create_application),
        )
        .route("/api/applications/:id", get(application::get_application))
        .route(
            "/api/applications/:id/transition",
            post(application::transition_application),
        )
        .route(
            "/api/applications/:id/evaluation",
            get(evaluation::get_evaluation)
                .post(evaluation::create_evaluation)
                .put(evaluation::update_evaluation)
                .delete(evaluation::delete_evaluation),
        )
        .route("/api/evaluations", get(evaluation::list_evaluations))
        .route("/api/notifications", get(dashboard::list_notifications))
        .route("/api/dashboard/stats", get(dashboard::get_dashboard_stats))
        .route("/api/audit", get(dashboard::list_audit))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(state.config.api_rps),
            rate_limit::rps_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_actor,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .merge(api)
        .with_state(state)
}
