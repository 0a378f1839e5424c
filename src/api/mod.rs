use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use bigdecimal::{BigDecimal, Zero};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

pub mod extras;
pub mod invoices;
pub mod projects;
pub mod time_entries;

/// Shared garde validators for NUMERIC fields.
pub(crate) fn positive(value: &BigDecimal, _context: &()) -> garde::Result {
    if value > &BigDecimal::zero() {
        Ok(())
    } else {
        Err(garde::Error::new("must be positive"))
    }
}

pub(crate) fn non_negative(value: &BigDecimal, _context: &()) -> garde::Result {
    if value < &BigDecimal::zero() {
        Err(garde::Error::new("must not be negative"))
    } else {
        Ok(())
    }
}

pub fn app() -> Router<crate::state::State> {
    let cors_layer = CorsLayer::new().allow_origin([
        "http://localhost:5173".parse().unwrap(),
        "http://localhost:3000".parse().unwrap(),
    ]);

    Router::new()
        .route("/health", get(health))
        .route("/invoices", post(invoices::create).get(invoices::list))
        .route(
            "/invoices/:id",
            get(invoices::get)
                .patch(invoices::update)
                .delete(invoices::delete),
        )
        .route("/invoices/:id/status", post(invoices::transition))
        .route("/invoices/:id/recalculate", post(invoices::recalculate))
        .route(
            "/invoices/:id/lines/:line_id",
            axum::routing::patch(invoices::update_line).delete(invoices::delete_line),
        )
        .route("/invoices/:id/manual-lines", post(extras::create_manual_line))
        .route(
            "/invoices/:id/manual-lines/:line_id",
            axum::routing::patch(extras::update_manual_line).delete(extras::delete_manual_line),
        )
        .route("/invoices/:id/fees", post(extras::create_fee))
        .route(
            "/invoices/:id/fees/:fee_id",
            axum::routing::patch(extras::update_fee).delete(extras::delete_fee),
        )
        .route("/fees/:fee_id/attachments", post(extras::add_attachment))
        .route(
            "/fees/:fee_id/attachments/:id",
            delete(extras::delete_attachment),
        )
        .route(
            "/projects/:id/recalculate",
            post(invoices::recalculate_project),
        )
        .route(
            "/projects/:id/roles",
            get(projects::list_roles).post(projects::create_role),
        )
        .route(
            "/roles/:id",
            axum::routing::patch(projects::update_role).delete(projects::delete_role),
        )
        .route("/projects/:id/assignments", put(projects::assign))
        .route(
            "/projects/:id/assignments/:employee_id",
            delete(projects::unassign),
        )
        .route(
            "/time-entries",
            get(time_entries::list).post(time_entries::create),
        )
        .route(
            "/time-entries/:id",
            axum::routing::patch(time_entries::update).delete(time_entries::delete),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(DefaultBodyLimit::disable())
        // JSON only; nothing here should come close to a megabyte
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
}

async fn health() {}
