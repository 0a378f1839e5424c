use std::sync::Once;

use crate::api::app;
use crate::api::invoices::PopulatedInvoice;
use crate::models::{ProjectRole, TimeEntry};
use crate::state::State;

use axum::body::Body;
use axum::http::request::Request;
use axum::http::StatusCode;
use axum_test::TestServer;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;
use tower::ServiceExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod invoices;
mod recalc;

static INIT: Once = Once::new();

/// Builds a TestServer over the app plus the State backing it, so tests can
/// seed the collaborator tables (employees, projects) that have no API of
/// their own. The pool runs a single connection inside a test transaction.
async fn test_init() -> (TestServer, State) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with::<EnvFilter>("timebill=debug,tower_http=debug".into())
            .with(tracing_subscriber::fmt::layer())
            .init()
    });

    let state = crate::state::new().await;
    let server = TestServer::new(app().with_state(state.clone())).unwrap();
    (server, state)
}

async fn insert_employee(state: &State, full_name: &str) -> Uuid {
    use crate::schema::employees::dsl::*;

    let mut conn = state.pool.get_owned().await.unwrap();
    diesel::insert_into(employees)
        .values((
            name.eq(full_name),
            email.eq(format!(
                "{}@example.com",
                full_name.to_lowercase().replace(' ', ".")
            )),
        ))
        .returning(id)
        .get_result(&mut conn)
        .await
        .unwrap()
}

async fn insert_project(state: &State, project_name: &str, internal: bool) -> Uuid {
    use crate::schema::projects::dsl::*;

    let mut conn = state.pool.get_owned().await.unwrap();
    diesel::insert_into(projects)
        .values((
            name.eq(project_name),
            client_id.eq(Uuid::new_v4()),
            is_internal.eq(internal),
        ))
        .returning(id)
        .get_result(&mut conn)
        .await
        .unwrap()
}

async fn create_role(server: &TestServer, project: Uuid, role_name: &str, rate: i64) -> Uuid {
    let response = server
        .post(&format!("/projects/{project}/roles"))
        .json(&json!({ "name": role_name, "hourly_rate_usd": rate }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<ProjectRole>().id
}

async fn assign(server: &TestServer, project: Uuid, employee: Uuid, role: Option<Uuid>) {
    let response = server
        .put(&format!("/projects/{project}/assignments"))
        .json(&json!({ "employee_id": employee, "role_id": role }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

async fn log_hours(server: &TestServer, employee: Uuid, project: Uuid, day: u32, hours: i64) -> Uuid {
    let response = server
        .post("/time-entries")
        .json(&json!({
            "employee_id": employee,
            "project_id": project,
            "date": format!("2025-06-{day:02}"),
            "hours": hours,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<TimeEntry>().id
}

async fn create_invoice(server: &TestServer, project: Uuid) -> PopulatedInvoice {
    let response = server
        .post("/invoices")
        .json(&json!({ "project_id": project }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<PopulatedInvoice>()
}

async fn get_invoice(server: &TestServer, invoice: Uuid) -> PopulatedInvoice {
    let response = server.get(&format!("/invoices/{invoice}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<PopulatedInvoice>()
}

async fn mark(server: &TestServer, invoice: Uuid, status: &str) {
    let response = server
        .post(&format!("/invoices/{invoice}/status"))
        .json(&json!({ "status": status }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn health() {
    let state = crate::state::new().await;
    let app = app().with_state(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
