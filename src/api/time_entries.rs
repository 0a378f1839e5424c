use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use axum_valid::Garde;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use garde::Validate;
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::DatabaseConnection;
use crate::error::Error;
use crate::models::{TimeEntry, TimeEntryStatus};

fn default_billable() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateTimeEntry {
    #[garde(skip)]
    pub employee_id: Uuid,
    #[garde(skip)]
    pub project_id: Uuid,
    #[garde(skip)]
    pub date: NaiveDate,
    #[garde(custom(super::positive))]
    pub hours: BigDecimal,
    #[garde(skip)]
    #[serde(default = "default_billable")]
    pub billable: bool,
    #[garde(inner(length(bytes, max = 4096)))]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateTimeEntry {
    #[garde(skip)]
    pub date: Option<NaiveDate>,
    #[garde(inner(custom(super::positive)))]
    pub hours: Option<BigDecimal>,
    #[garde(skip)]
    pub billable: Option<bool>,
    /// Moving an entry to on_hold parks it outside billing aggregation until
    /// it is set back to normal.
    #[garde(skip)]
    pub status: Option<TimeEntryStatus>,
    #[garde(inner(length(bytes, max = 4096)))]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TimeEntryFilter {
    pub project_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
}

pub async fn list(
    mut conn: DatabaseConnection,
    Query(filter): Query<TimeEntryFilter>,
) -> Result<Json<Vec<TimeEntry>>, Error> {
    Ok(Json(conn.list_time_entries(filter).await?))
}

pub async fn create(
    mut conn: DatabaseConnection,
    Garde(Json(request)): Garde<Json<CreateTimeEntry>>,
) -> Result<(StatusCode, Json<TimeEntry>), Error> {
    let entry = conn.create_time_entry(request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<UpdateTimeEntry>>,
) -> Result<Json<TimeEntry>, Error> {
    Ok(Json(conn.update_time_entry(id, request).await?))
}

pub async fn delete(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    conn.delete_time_entry(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
