//! Reference data for the report forms.

use axum::{Router, routing::get};
use cyberguard_core::{Catalog, catalog};

use crate::{middleware::AppState, response::ApiResponse};

/// Categories, entity types, reasons and levels.
async fn get_catalog() -> ApiResponse<Catalog> {
    ApiResponse::ok(catalog())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/catalog", get(get_catalog))
}
