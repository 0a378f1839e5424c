use super::*;
use crate::models::Invoice;
use bigdecimal::BigDecimal;

#[tokio::test]
async fn aggregates_hours_into_one_line_per_employee() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;

    log_hours(&server, employee, project, 2, 5).await;
    log_hours(&server, employee, project, 3, 3).await;

    let invoice = create_invoice(&server, project).await;

    assert_eq!(invoice.lines.len(), 1);
    let line = &invoice.lines[0];
    assert_eq!(line.employee_name, "Erin Example");
    assert_eq!(line.role_name.as_deref(), Some("Senior Developer"));
    assert_eq!(line.hours, BigDecimal::from(8));
    assert_eq!(line.rate_snapshot, BigDecimal::from(50));
    assert_eq!(line.amount, BigDecimal::from(400));

    assert_eq!(invoice.subtotal, BigDecimal::from(400));
    assert_eq!(invoice.total, BigDecimal::from(400));

    // both source entries were claimed by this invoice
    assert_eq!(invoice.billed_entries.len(), 2);
}

#[tokio::test]
async fn second_invoice_finds_nothing_left_to_bill() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 5).await;

    let first = create_invoice(&server, project).await;
    assert_eq!(first.lines.len(), 1);

    // All billable entries are claimed; a second invoice is still created.
    let second = create_invoice(&server, project).await;
    assert!(second.lines.is_empty());
    assert!(second.billed_entries.is_empty());
    assert_eq!(second.subtotal, BigDecimal::from(0));
    assert_eq!(second.total, BigDecimal::from(0));
}

#[tokio::test]
async fn unassigned_employees_bill_at_rate_zero() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Norah Norole").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    // assigned to the project, but with no billing role yet
    assign(&server, project, employee, None).await;
    log_hours(&server, employee, project, 2, 6).await;

    let invoice = create_invoice(&server, project).await;

    assert_eq!(invoice.lines.len(), 1);
    let line = &invoice.lines[0];
    assert_eq!(line.rate_snapshot, BigDecimal::from(0));
    assert_eq!(line.amount, BigDecimal::from(0));
    assert!(line.role_name.is_none());
    assert_eq!(line.hours, BigDecimal::from(6));
}

#[tokio::test]
async fn on_hold_and_nonbillable_entries_are_excluded() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;

    log_hours(&server, employee, project, 2, 5).await;

    let held = log_hours(&server, employee, project, 3, 4).await;
    let response = server
        .patch(&format!("/time-entries/{held}"))
        .json(&json!({ "status": "on_hold" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server
        .post("/time-entries")
        .json(&json!({
            "employee_id": employee,
            "project_id": project,
            "date": "2025-06-04",
            "hours": 2,
            "billable": false,
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let invoice = create_invoice(&server, project).await;
    assert_eq!(invoice.lines.len(), 1);
    assert_eq!(invoice.lines[0].hours, BigDecimal::from(5));
}

#[tokio::test]
async fn status_must_walk_the_transition_table() {
    let (server, state) = test_init().await;

    let project = insert_project(&state, "Widget Rewrite", false).await;
    let invoice = create_invoice(&server, project).await;

    // draft cannot jump straight to paid
    let response = server
        .post(&format!("/invoices/{}/status", invoice.id))
        .json(&json!({ "status": "paid" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    mark(&server, invoice.id, "sent").await;
    mark(&server, invoice.id, "paid").await;

    // paid is terminal
    let response = server
        .post(&format!("/invoices/{}/status", invoice.id))
        .json(&json!({ "status": "voided" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelled_drafts_stay_cancelled() {
    let (server, state) = test_init().await;

    let project = insert_project(&state, "Widget Rewrite", false).await;
    let invoice = create_invoice(&server, project).await;
    mark(&server, invoice.id, "cancelled").await;

    let response = server
        .post(&format!("/invoices/{}/status", invoice.id))
        .json(&json!({ "status": "sent" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn paid_invoices_are_frozen() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 5).await;

    let invoice = create_invoice(&server, project).await;
    mark(&server, invoice.id, "sent").await;
    mark(&server, invoice.id, "paid").await;

    let line = invoice.lines[0].id;
    let response = server
        .patch(&format!("/invoices/{}/lines/{line}", invoice.id))
        .json(&json!({ "hours": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = server
        .patch(&format!("/invoices/{}", invoice.id))
        .json(&json!({ "discount": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = server
        .post(&format!("/invoices/{}/manual-lines", invoice.id))
        .json(&json!({ "person_name": "Late Addition", "hours": 1, "rate_usd": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    let response = server
        .post(&format!("/invoices/{}/recalculate", invoice.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn editing_line_hours_keeps_totals_consistent() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 8).await;

    let invoice = create_invoice(&server, project).await;
    let line = invoice.lines[0].id;

    let response = server
        .patch(&format!("/invoices/{}/lines/{line}", invoice.id))
        .json(&json!({ "hours": 10 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<PopulatedInvoice>();

    assert_eq!(updated.lines[0].hours, BigDecimal::from(10));
    assert_eq!(updated.lines[0].amount, BigDecimal::from(500));
    assert_eq!(updated.subtotal, BigDecimal::from(500));
    assert_eq!(updated.total, BigDecimal::from(500));
}

#[tokio::test]
async fn removing_a_line_resums_but_keeps_entries_claimed() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 8).await;

    let invoice = create_invoice(&server, project).await;
    let line = invoice.lines[0].id;

    let response = server
        .delete(&format!("/invoices/{}/lines/{line}", invoice.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<PopulatedInvoice>();
    assert!(updated.lines.is_empty());
    assert_eq!(updated.total, BigDecimal::from(0));

    // the hours behind the removed line do not become billable again
    let next = create_invoice(&server, project).await;
    assert!(next.lines.is_empty());
}

#[tokio::test]
async fn deleting_a_draft_releases_its_time_entries() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 8).await;

    let invoice = create_invoice(&server, project).await;
    assert_eq!(invoice.lines.len(), 1);

    let response = server.delete(&format!("/invoices/{}", invoice.id)).await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let replacement = create_invoice(&server, project).await;
    assert_eq!(replacement.lines.len(), 1);
    assert_eq!(replacement.lines[0].hours, BigDecimal::from(8));
}

#[tokio::test]
async fn sent_invoices_cannot_be_deleted() {
    let (server, state) = test_init().await;

    let project = insert_project(&state, "Widget Rewrite", false).await;
    let invoice = create_invoice(&server, project).await;
    mark(&server, invoice.id, "sent").await;

    let response = server.delete(&format!("/invoices/{}", invoice.id)).await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_filters_by_status() {
    let (server, state) = test_init().await;

    let project = insert_project(&state, "Widget Rewrite", false).await;
    let draft = create_invoice(&server, project).await;
    let sent = create_invoice(&server, project).await;
    mark(&server, sent.id, "sent").await;

    let response = server.get("/invoices?status=draft").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let invoices = response.json::<Vec<Invoice>>();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id, draft.id);
}
