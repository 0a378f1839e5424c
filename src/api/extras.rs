use axum::{extract::Path, http::StatusCode, Json};
use axum_valid::Garde;
use bigdecimal::BigDecimal;
use garde::Validate;
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use super::invoices::PopulatedInvoice;
use crate::database::DatabaseConnection;
use crate::error::Error;
use crate::models::FeeAttachment;

/// A manual people line: free-text person, not tied to any time entry or
/// employee record. The line total is always computed server side.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateManualLine {
    #[garde(length(bytes, min = 1, max = 128))]
    pub person_name: String,
    #[garde(custom(super::positive))]
    pub hours: BigDecimal,
    #[garde(custom(super::non_negative))]
    pub rate_usd: BigDecimal,
    #[garde(inner(length(bytes, max = 4096)))]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateManualLine {
    #[garde(inner(length(bytes, min = 1, max = 128)))]
    pub person_name: Option<String>,
    #[garde(inner(custom(super::positive)))]
    pub hours: Option<BigDecimal>,
    #[garde(inner(custom(super::non_negative)))]
    pub rate_usd: Option<BigDecimal>,
    #[garde(inner(length(bytes, max = 4096)))]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateFee {
    #[garde(length(bytes, min = 1, max = 128))]
    pub label: String,
    #[garde(custom(super::positive))]
    pub quantity: BigDecimal,
    #[garde(custom(super::non_negative))]
    pub unit_price_usd: BigDecimal,
    #[garde(inner(length(bytes, max = 4096)))]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateFee {
    #[garde(inner(length(bytes, min = 1, max = 128)))]
    pub label: Option<String>,
    #[garde(inner(custom(super::positive)))]
    pub quantity: Option<BigDecimal>,
    #[garde(inner(custom(super::non_negative)))]
    pub unit_price_usd: Option<BigDecimal>,
    #[garde(inner(length(bytes, max = 4096)))]
    pub description: Option<String>,
}

/// Metadata only; the file itself is uploaded to the external blob store by
/// the caller, which then registers it here.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateFeeAttachment {
    #[garde(length(bytes, min = 1, max = 256))]
    pub file_name: String,
    #[garde(length(bytes, min = 1, max = 1024))]
    pub file_url: String,
    #[garde(range(min = 0))]
    pub file_size: i64,
}

pub async fn create_manual_line(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<CreateManualLine>>,
) -> Result<(StatusCode, Json<PopulatedInvoice>), Error> {
    let invoice = conn.create_manual_line(id, request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn update_manual_line(
    mut conn: DatabaseConnection,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
    Garde(Json(request)): Garde<Json<UpdateManualLine>>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.update_manual_line(id, line_id, request).await?))
}

pub async fn delete_manual_line(
    mut conn: DatabaseConnection,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.delete_manual_line(id, line_id).await?))
}

pub async fn create_fee(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<CreateFee>>,
) -> Result<(StatusCode, Json<PopulatedInvoice>), Error> {
    let invoice = conn.create_fee(id, request).await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn update_fee(
    mut conn: DatabaseConnection,
    Path((id, fee_id)): Path<(Uuid, Uuid)>,
    Garde(Json(request)): Garde<Json<UpdateFee>>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.update_fee(id, fee_id, request).await?))
}

pub async fn delete_fee(
    mut conn: DatabaseConnection,
    Path((id, fee_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PopulatedInvoice>, Error> {
    Ok(Json(conn.delete_fee(id, fee_id).await?))
}

pub async fn add_attachment(
    mut conn: DatabaseConnection,
    Path(fee_id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<CreateFeeAttachment>>,
) -> Result<(StatusCode, Json<FeeAttachment>), Error> {
    let attachment = conn.add_fee_attachment(fee_id, request).await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn delete_attachment(
    mut conn: DatabaseConnection,
    Path((fee_id, id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, Error> {
    conn.delete_fee_attachment(fee_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
