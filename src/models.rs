use crate::schema::{
    employee_projects, employees, invoice_fee_attachments, invoice_fees, invoice_lines,
    invoice_manual_lines, invoice_time_entries, invoices, project_roles, projects, time_entries,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::InvoiceStatus"]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Cancelled,
    Voided,
}

impl InvoiceStatus {
    /// The full transition table: draft -> sent|cancelled, sent -> paid|voided.
    /// Everything else, including skipping a state, is rejected.
    pub fn can_transition(self, next: InvoiceStatus) -> bool {
        use InvoiceStatus::*;
        matches!(
            (self, next),
            (Draft, Sent) | (Draft, Cancelled) | (Sent, Paid) | (Sent, Voided)
        )
    }

    /// Lines, manual lines, fees, notes, discount and metadata may only be
    /// touched while the invoice is draft or sent.
    pub fn is_editable(self) -> bool {
        matches!(self, InvoiceStatus::Draft | InvoiceStatus::Sent)
    }
}

#[derive(
    diesel_derive_enum::DbEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::TimeEntryStatus"]
#[serde(rename_all = "snake_case")]
pub enum TimeEntryStatus {
    Normal,
    OnHold,
}

/// Identity surface owned by an external profile service; only `id` and
/// `name` are read here.
#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = employees)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}

#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub client_id: Uuid,
    pub is_active: bool,
    /// Internal projects never produce billable hours
    pub is_internal: bool,
}

#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = project_roles)]
pub struct ProjectRole {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// The live hourly rate; invoice lines snapshot it and never read it back
    pub hourly_rate_usd: BigDecimal,
}

#[derive(Insertable)]
#[diesel(table_name = project_roles)]
pub struct NewProjectRole {
    pub project_id: Uuid,
    pub name: String,
    pub hourly_rate_usd: BigDecimal,
}

/// At most one assignment per (employee, project); `role_id = NULL` means
/// the employee has no billing role yet and resolves to rate 0.
#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = employee_projects)]
pub struct ProjectAssignment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = employee_projects)]
pub struct NewProjectAssignment {
    pub employee_id: Uuid,
    pub project_id: Uuid,
    pub role_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
}

#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = time_entries)]
pub struct TimeEntry {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub hours: BigDecimal,
    pub billable: bool,
    pub status: TimeEntryStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = time_entries)]
pub struct NewTimeEntry {
    pub employee_id: Uuid,
    pub project_id: Uuid,
    pub date: NaiveDate,
    pub hours: BigDecimal,
    pub billable: bool,
    pub status: TimeEntryStatus,
    pub notes: Option<String>,
}

#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = invoices)]
pub struct Invoice {
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
}

#[derive(Insertable)]
#[diesel(table_name = invoices)]
pub struct NewInvoice {
    pub project_id: Uuid,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = invoices)]
pub struct InvoiceChanges {
    pub notes: Option<String>,
    pub discount: Option<BigDecimal>,
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// A billed-time line. `employee_name` and `role_name` are captured at
/// creation so historical invoices stay readable after the live records
/// change; they are not a cache.
#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = invoice_lines)]
pub struct InvoiceLine {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub role_name: Option<String>,
    pub hours: BigDecimal,
    pub rate_snapshot: BigDecimal,
    pub amount: BigDecimal,
}

#[derive(Insertable)]
#[diesel(table_name = invoice_lines)]
pub struct NewInvoiceLine {
    pub invoice_id: Uuid,
    pub employee_id: Uuid,
    pub employee_name: String,
    pub role_name: Option<String>,
    pub hours: BigDecimal,
    pub rate_snapshot: BigDecimal,
    pub amount: BigDecimal,
}

/// Junction with a unique constraint on `time_entry_id`: a time entry can be
/// billed at most once, ever, across all invoices.
#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = invoice_time_entries)]
pub struct InvoiceTimeEntry {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub time_entry_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = invoice_time_entries)]
pub struct NewInvoiceTimeEntry {
    pub invoice_id: Uuid,
    pub time_entry_id: Uuid,
}

#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = invoice_manual_lines)]
pub struct InvoiceManualLine {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub person_name: String,
    pub hours: BigDecimal,
    pub rate_usd: BigDecimal,
    pub description: Option<String>,
    pub line_total: BigDecimal,
}

#[derive(Insertable)]
#[diesel(table_name = invoice_manual_lines)]
pub struct NewInvoiceManualLine {
    pub invoice_id: Uuid,
    pub person_name: String,
    pub hours: BigDecimal,
    pub rate_usd: BigDecimal,
    pub description: Option<String>,
    pub line_total: BigDecimal,
}

#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = invoice_fees)]
pub struct InvoiceFee {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub label: String,
    pub quantity: BigDecimal,
    pub unit_price_usd: BigDecimal,
    pub description: Option<String>,
    pub fee_total: BigDecimal,
}

#[derive(Insertable)]
#[diesel(table_name = invoice_fees)]
pub struct NewInvoiceFee {
    pub invoice_id: Uuid,
    pub label: String,
    pub quantity: BigDecimal,
    pub unit_price_usd: BigDecimal,
    pub description: Option<String>,
    pub fee_total: BigDecimal,
}

/// Documentary only; the file itself lives in an external blob store and is
/// never inspected here.
#[derive(Identifiable, Queryable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = invoice_fee_attachments)]
pub struct FeeAttachment {
    pub id: Uuid,
    pub fee_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
}

#[derive(Insertable)]
#[diesel(table_name = invoice_fee_attachments)]
pub struct NewFeeAttachment {
    pub fee_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_size: i64,
}
