use utoipa::OpenApi;

use super::{application, company, cycle, dashboard, evaluation, job, submission};

#[derive(OpenApi)]
#[openapi(
    info(description = "Internship submission and application workflow API"),
    paths(
        cycle::create_cycle,
        cycle::list_cycles,
        cycle::activate_cycle,
        cycle::close_cycle,
        submission::create_submission,
        submission::list_submissions,
        submission::get_submission,
        submission::transition_submission,
        submission::assign_faculty,
        submission::export_submissions,
        company::register_company,
        company::list_companies,
        company::get_company,
        company::review_company,
        company::set_blacklist,
        job::create_job,
        job::list_jobs,
        job::get_job,
        application::create_application,
        application::list_applications,
        application::get_application,
        application::transition_application,
        evaluation::create_evaluation,
        evaluation::update_evaluation,
        evaluation::delete_evaluation,
        evaluation::get_evaluation,
        evaluation::list_evaluations,
        dashboard::get_dashboard_stats,
        dashboard::list_notifications,
        dashboard::list_audit,
    )
)]
pub struct ApiDoc;
