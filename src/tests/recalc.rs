use super::*;
use crate::database::RecalcSummary;
use bigdecimal::BigDecimal;

/// `NOW()` is frozen inside the test transaction, so two invoices created by
/// one test share a creation timestamp; backdating one makes "latest"
/// unambiguous.
async fn age_invoice(state: &State, invoice: Uuid) {
    use crate::schema::invoices::dsl::*;

    let mut conn = state.pool.get_owned().await.unwrap();
    diesel::update(invoices.find(invoice))
        .set(created_at.eq(chrono::Utc::now() - chrono::Duration::days(1)))
        .execute(&mut conn)
        .await
        .unwrap();
}

async fn set_rate(server: &TestServer, role: Uuid, rate: i64) {
    let response = server
        .patch(&format!("/roles/{role}"))
        .json(&json!({ "hourly_rate_usd": rate }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn recalculation_rewrites_snapshots_from_live_rates() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 5).await;
    log_hours(&server, employee, project, 3, 3).await;

    let invoice = create_invoice(&server, project).await;
    assert_eq!(invoice.total, BigDecimal::from(400));

    set_rate(&server, role, 60).await;

    let response = server
        .post(&format!("/invoices/{}/recalculate", invoice.id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<PopulatedInvoice>();

    let line = &updated.lines[0];
    assert_eq!(line.hours, BigDecimal::from(8), "hours are never touched");
    assert_eq!(line.rate_snapshot, BigDecimal::from(60));
    assert_eq!(line.amount, BigDecimal::from(480));
    assert_eq!(updated.total, BigDecimal::from(480));
}

#[tokio::test]
async fn recalculation_is_idempotent() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 8).await;

    let invoice = create_invoice(&server, project).await;
    set_rate(&server, role, 75).await;

    let first = server
        .post(&format!("/invoices/{}/recalculate", invoice.id))
        .await
        .json::<PopulatedInvoice>();
    let second = server
        .post(&format!("/invoices/{}/recalculate", invoice.id))
        .await
        .json::<PopulatedInvoice>();

    assert_eq!(first.lines[0].rate_snapshot, second.lines[0].rate_snapshot);
    assert_eq!(first.lines[0].amount, second.lines[0].amount);
    assert_eq!(first.subtotal, second.subtotal);
    assert_eq!(first.total, second.total);
}

#[tokio::test]
async fn recalculation_picks_up_role_changes() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let junior = create_role(&server, project, "Junior Developer", 30).await;
    let senior = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(junior)).await;
    log_hours(&server, employee, project, 2, 4).await;

    let invoice = create_invoice(&server, project).await;
    assert_eq!(invoice.lines[0].role_name.as_deref(), Some("Junior Developer"));
    assert_eq!(invoice.total, BigDecimal::from(120));

    // promoted after the invoice was cut
    assign(&server, project, employee, Some(senior)).await;

    let updated = server
        .post(&format!("/invoices/{}/recalculate", invoice.id))
        .await
        .json::<PopulatedInvoice>();
    assert_eq!(updated.lines[0].role_name.as_deref(), Some("Senior Developer"));
    assert_eq!(updated.lines[0].rate_snapshot, BigDecimal::from(50));
    assert_eq!(updated.total, BigDecimal::from(200));
}

#[tokio::test]
async fn batch_scope_latest_touches_only_the_newest_unpaid() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;

    log_hours(&server, employee, project, 2, 5).await;
    let older = create_invoice(&server, project).await;
    age_invoice(&state, older.id).await;

    log_hours(&server, employee, project, 3, 3).await;
    let newer = create_invoice(&server, project).await;

    set_rate(&server, role, 60).await;

    let response = server
        .post(&format!("/projects/{project}/recalculate"))
        .json(&json!({ "scope": "latest" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let summary = response.json::<RecalcSummary>();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);

    let older = get_invoice(&server, older.id).await;
    let newer = get_invoice(&server, newer.id).await;
    assert_eq!(older.lines[0].rate_snapshot, BigDecimal::from(50));
    assert_eq!(newer.lines[0].rate_snapshot, BigDecimal::from(60));
}

#[tokio::test]
async fn batch_scope_all_covers_every_unpaid_invoice() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;

    log_hours(&server, employee, project, 2, 5).await;
    let first = create_invoice(&server, project).await;
    mark(&server, first.id, "sent").await;

    log_hours(&server, employee, project, 3, 3).await;
    let second = create_invoice(&server, project).await;

    set_rate(&server, role, 60).await;

    let summary = server
        .post(&format!("/projects/{project}/recalculate"))
        .json(&json!({ "scope": "all" }))
        .await
        .json::<RecalcSummary>();
    assert_eq!(summary.processed, 2);

    let first = get_invoice(&server, first.id).await;
    let second = get_invoice(&server, second.id).await;
    assert_eq!(first.lines[0].rate_snapshot, BigDecimal::from(60));
    assert_eq!(second.lines[0].rate_snapshot, BigDecimal::from(60));
}

#[tokio::test]
async fn batch_skips_paid_invoices() {
    let (server, state) = test_init().await;

    let employee = insert_employee(&state, "Erin Example").await;
    let project = insert_project(&state, "Widget Rewrite", false).await;
    let role = create_role(&server, project, "Senior Developer", 50).await;
    assign(&server, project, employee, Some(role)).await;
    log_hours(&server, employee, project, 2, 5).await;

    let invoice = create_invoice(&server, project).await;
    mark(&server, invoice.id, "sent").await;
    mark(&server, invoice.id, "paid").await;

    set_rate(&server, role, 60).await;

    let summary = server
        .post(&format!("/projects/{project}/recalculate"))
        .json(&json!({ "scope": "all" }))
        .await
        .json::<RecalcSummary>();
    assert_eq!(summary.processed, 0);

    // the paid invoice keeps its historical snapshot
    let invoice = get_invoice(&server, invoice.id).await;
    assert_eq!(invoice.lines[0].rate_snapshot, BigDecimal::from(50));
}
