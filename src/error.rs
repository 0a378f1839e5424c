use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use serde_derive::Serialize;

use crate::models::InvoiceStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] bb8::RunError<diesel_async::pooled_connection::PoolError>),
    #[error("Error in handling json value")]
    JsonRejection(#[from] axum::extract::rejection::JsonRejection),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Invoice is {0:?} and can no longer be edited")]
    NotEditable(InvoiceStatus),
    #[error("Invoice cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: InvoiceStatus,
        to: InvoiceStatus,
    },
    #[error("Time entry is already billed on an invoice")]
    DuplicateBilling,
    #[error("Role is still assigned to at least one employee")]
    RoleInUse,
    #[error("Validation error: {0}")]
    Validation(&'static str),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        error!(%self);

        let status = match self {
            Error::Database(_) | Error::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::JsonRejection(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NotEditable(_)
            | Error::InvalidTransition { .. }
            | Error::DuplicateBilling
            | Error::RoleInUse => StatusCode::CONFLICT,
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
