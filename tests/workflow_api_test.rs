use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use internship_workflow::{
    config::Config,
    models::actor::{Actor, Role},
    routes,
    utils::token::issue_token,
    AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

fn bearer(actor: Actor) -> String {
    let token = issue_token(SECRET, &actor, Duration::hours(1)).expect("token");
    format!("Bearer {}", token)
}

async fn send(
    app: &Router,
    actor: Option<Actor>,
    method: &str,
    uri: &str,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("Authorization", bearer(actor));
    }
    let req = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, json)
}

fn app() -> Router {
    routes::router(AppState::new(Config::local(SECRET)))
}

async fn open_cycle(app: &Router, scad: Actor) -> String {
    let today = Utc::now().date_naive();
    let (status, cycle) = send(
        app,
        Some(scad),
        "POST",
        "/api/cycles",
        Some(json!({
            "name": "Summer",
            "start_date": today - Duration::days(10),
            "end_date": today + Duration::days(30),
            "activate": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create cycle: {}", cycle);
    assert_eq!(cycle["status"], "active");
    cycle["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_token_are_rejected() {
    let app = app();
    let (status, _) = send(&app, None, "GET", "/api/submissions", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, None, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn submission_review_round_trip() {
    let app = app();
    let scad = Actor::scad(Uuid::new_v4());
    let student = Actor::student(Uuid::new_v4());
    let faculty = Actor::faculty(Uuid::new_v4());

    let cycle_id = open_cycle(&app, scad).await;

    let (status, created) = send(
        &app,
        Some(student),
        "POST",
        "/api/submissions",
        Some(json!({
            "cycle_id": cycle_id,
            "student_name": "Mona Adel",
            "company": {
                "company_name": "Nile Robotics",
                "supervisor_name": "Omar Hany",
                "supervisor_email": "omar@nile.example"
            },
            "documents": [
                { "kind": "evaluation_form", "url": "docs://forms/1" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create: {}", created);
    assert_eq!(created["status"], "pending");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, assigned) = send(
        &app,
        Some(scad),
        "POST",
        &format!("/api/submissions/{}/assign", id),
        Some(json!({ "faculty_id": faculty.id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "assign: {}", assigned);
    assert_eq!(assigned["faculty_assigned"], json!(faculty.id));

    let (status, flagged) = send(
        &app,
        Some(faculty),
        "POST",
        &format!("/api/submissions/{}/transition", id),
        Some(json!({ "action": "flag", "note": "needs more detail" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "flag: {}", flagged);
    assert_eq!(flagged["status"], "flagged");

    // A student cannot approve their own report.
    let (status, denied) = send(
        &app,
        Some(student),
        "POST",
        &format!("/api/submissions/{}/transition", id),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", denied);
    assert_eq!(denied["rule"], "role_not_permitted");

    let (status, resubmitted) = send(
        &app,
        Some(student),
        "POST",
        &format!("/api/submissions/{}/transition", id),
        Some(json!({
            "action": "resubmit",
            "documents": [{ "kind": "other", "url": "docs://reports/2" }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "resubmit: {}", resubmitted);
    assert_eq!(resubmitted["status"], "pending");

    let (status, approved) = send(
        &app,
        Some(faculty),
        "POST",
        &format!("/api/submissions/{}/transition", id),
        Some(json!({ "action": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "approve: {}", approved);
    assert_eq!(approved["status"], "approved");

    let timeline = approved["timeline"].as_array().unwrap();
    let actions: Vec<&JsonValue> = timeline.iter().map(|e| &e["action"]).collect();
    assert_eq!(
        actions,
        vec![&JsonValue::Null, &json!("flag"), &json!("resubmit"), &json!("approve")]
    );

    let (status, inbox) = send(&app, Some(student), "GET", "/api/notifications", None).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = inbox["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"submission_flagged"), "{:?}", kinds);
    assert!(kinds.contains(&"submission_approved"), "{:?}", kinds);
}

#[tokio::test]
async fn listings_are_scoped_to_the_caller() {
    let app = app();
    let scad = Actor::scad(Uuid::new_v4());
    let cycle_id = open_cycle(&app, scad).await;

    let mine = Actor::student(Uuid::new_v4());
    let other = Actor::student(Uuid::new_v4());
    for (student, name) in [(mine, "Mine"), (other, "Other")] {
        let (status, body) = send(
            &app,
            Some(student),
            "POST",
            "/api/submissions",
            Some(json!({
                "cycle_id": cycle_id,
                "student_name": name,
                "company": {
                    "company_name": "Delta Soft",
                    "supervisor_name": "Rana",
                    "supervisor_email": "rana@delta.example"
                },
                "documents": [{ "kind": "evaluation_form", "url": "docs://f" }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
    }

    let (status, page) = send(&app, Some(mine), "GET", "/api/submissions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["student_name"], "Mine");

    let (status, page) = send(&app, Some(scad), "GET", "/api/submissions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);

    let (_, page) = send(
        &app,
        Some(scad),
        "GET",
        "/api/submissions?search=other&per_page=1",
        None,
    )
    .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["per_page"], 1);
}

#[tokio::test]
async fn blacklist_without_reason_is_rejected_over_http() {
    let app = app();
    let scad = Actor::scad(Uuid::new_v4());
    let company = Actor::new(Role::Company, Uuid::new_v4());

    let (status, registered) = send(
        &app,
        Some(company),
        "POST",
        "/api/companies",
        Some(json!({
            "name": "Cairo Cloud",
            "industry": "Software",
            "size": "medium",
            "email": "hr@cairo.example"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", registered);

    let (status, err) = send(
        &app,
        Some(scad),
        "PUT",
        &format!("/api/companies/{}/blacklist", company.id),
        Some(json!({ "blacklisted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "missing_reason");

    let (_, current) = send(
        &app,
        Some(scad),
        "GET",
        &format!("/api/companies/{}", company.id),
        None,
    )
    .await;
    assert_eq!(current["blacklisted"], false);
    assert_eq!(current["version"], 1);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, doc) = send(&app, None, "GET", "/api/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/submissions/{id}/transition"].is_object());
}

#[tokio::test]
async fn applying_twice_returns_the_existing_application() {
    let app = app();
    let scad = Actor::scad(Uuid::new_v4());
    let company = Actor::company(Uuid::new_v4());
    let student = Actor::student(Uuid::new_v4());

    let (status, _) = send(
        &app,
        Some(company),
        "POST",
        "/api/companies",
        Some(json!({
            "name": "Giza Data",
            "industry": "Analytics",
            "size": "small",
            "email": "jobs@giza.example"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        &app,
        Some(scad),
        "POST",
        &format!("/api/companies/{}/review", company.id),
        Some(json!({ "decision": "approve" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, job) = send(
        &app,
        Some(company),
        "POST",
        "/api/jobs",
        Some(json!({
            "title": "Data Intern",
            "description": "Dashboards and pipelines",
            "duration_weeks": 6
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", job);

    let application = json!({
        "job_id": job["id"],
        "student_name": "Hana Fathy",
        "resume_url": "docs://cv/hana"
    });
    let (status, first) = send(
        &app,
        Some(student),
        "POST",
        "/api/applications",
        Some(application.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);

    let (status, second) = send(
        &app,
        Some(student),
        "POST",
        "/api/applications",
        Some(application),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", second);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["version"], first["version"]);
}
