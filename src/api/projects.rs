use axum::{extract::Path, http::StatusCode, Json};
use axum_valid::Garde;
use bigdecimal::BigDecimal;
use garde::Validate;
use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::DatabaseConnection;
use crate::error::Error;
use crate::models::{ProjectAssignment, ProjectRole};

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateRole {
    #[garde(length(bytes, min = 1, max = 128))]
    pub name: String,
    #[garde(custom(super::non_negative))]
    pub hourly_rate_usd: BigDecimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateRole {
    #[garde(inner(length(bytes, min = 1, max = 128)))]
    pub name: Option<String>,
    #[garde(inner(custom(super::non_negative)))]
    pub hourly_rate_usd: Option<BigDecimal>,
}

/// Upsert body for the single (employee, project) assignment. `role_id =
/// None` assigns the employee without a billing role.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct AssignEmployee {
    #[garde(skip)]
    pub employee_id: Uuid,
    #[garde(skip)]
    pub role_id: Option<Uuid>,
    #[garde(skip)]
    pub assigned_by: Option<Uuid>,
}

pub async fn list_roles(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProjectRole>>, Error> {
    Ok(Json(conn.list_roles(id).await?))
}

pub async fn create_role(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<CreateRole>>,
) -> Result<(StatusCode, Json<ProjectRole>), Error> {
    let role = conn.create_role(id, request).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<UpdateRole>>,
) -> Result<Json<ProjectRole>, Error> {
    Ok(Json(conn.update_role(id, request).await?))
}

pub async fn delete_role(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    conn.delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign(
    mut conn: DatabaseConnection,
    Path(id): Path<Uuid>,
    Garde(Json(request)): Garde<Json<AssignEmployee>>,
) -> Result<Json<ProjectAssignment>, Error> {
    Ok(Json(conn.assign_employee(id, request).await?))
}

pub async fn unassign(
    mut conn: DatabaseConnection,
    Path((id, employee_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, Error> {
    conn.unassign_employee(id, employee_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
