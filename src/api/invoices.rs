use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use axum_valid::Garde;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::{DatabaseConnection, RecalcScope, RecalcSummary};
use crate::error::Error;
use crate::models::{
    FeeAttachment, Invoice, InvoiceChanges, InvoiceFee, InvoiceLine, InvoiceManualLine,
    InvoiceStatus, InvoiceTimeEntry,
};

/// Body for creating a new invoice. The billed lines are not part of the
/// request; they are derived from the project's unbilled billable hours.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateInvoice {
    #[garde(skip)]
    pub project_id: Uuid,
    #[garde(inner(length(bytes, max = 4096)))]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateInvoice {
    #[garde(inner(length(bytes, max = 4096)))]
    pub notes: Option<String>,
    #[garde(inner(custom(super::non_negative)))]
    pub discount: Option<BigDecimal>,
    #[garde(inner(length(bytes, max = 64)))]
    pub invoice_number: Option<String>,
    #[garde(skip)]
    pub issue_date: Option<NaiveDate>,
    #[garde(skip)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct TransitionInvoice {
    #[garde(skip)]
    pub status: InvoiceStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateLine {
    #[garde(custom(super::positive))]
    pub hours: BigDecimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct RecalculateProject {
    #[garde(skip)]
    pub scope: RecalcScope,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulatedFee {
    #[serde(flatten)]
    pub fee: InvoiceFee,
    pub attachments: Vec<FeeAttachment>,
}

/// An invoice together with all three charge collections.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulatedInvoice {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: InvoiceStatus,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub total: BigDecimal,
    pub notes: Option<String>,
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<InvoiceLine>,
    pub manual_lines: Vec<InvoiceManualLine>,
    pub fees: Vec<PopulatedFee>,
    /// The junction rows claiming this invoice's source time entries.
    pub billed_entries: Vec<InvoiceTimeEntry>,
}

pub async fn create(
    mut conn: DatabaseConnection,
    Garde(Json(request)): Garde<Json<CreateInvoice>>,
) -> Result<(StatusCode, Json<PopulatedInvoice>), Error> {
    let invoice = conn.create_invoice(request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn list(
    mut conn: DatabaseConnection,
    Query(filter): Query<InvoiceFilter>,
) -> Result<Json<Vec<Invoice>>, Error> {
    Ok(Json(conn.list_invoices(filter.status).await?))
}

pub async fn get(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.get_invoice(id).await?))
}

pub async fn update(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<UpdateInvoice>>,
) -> Result<Json<Invoice>, Error> {
    let changes = InvoiceChanges {
        notes: request.notes,
        discount: request.discount,
        invoice_number: request.invoice_number,
        issue_date: request.issue_date,
        due_date: request.due_date,
    };

    Ok(Json(conn.update_invoice(id, changes).await?))
}

pub async fn delete(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    conn.delete_invoice(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transition(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<TransitionInvoice>>,
) -> Result<Json<Invoice>, Error> {
    Ok(Json(conn.transition_invoice(id, request.status).await?))
}

pub async fn recalculate(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.recalculate_invoice(id).await?))
}

pub async fn recalculate_project(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<RecalculateProject>>,
) -> Result<Json<RecalcSummary>, Error> {
    Ok(Json(conn.recalculate_project(id, request.scope).await?))
}

pub async fn update_line(
    mut conn: DatabaseConnection,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
    Garde(Json(request)): Garde<Json<UpdateLine>>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.update_line_hours(id, line_id, request.hours).await?))
}

pub async fn delete_line(
    mut conn: DatabaseConnection,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.delete_line(id, line_id).await?))
}
