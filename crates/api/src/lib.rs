//! # Chartlink API
//!
//! REST surface for the Chartlink record access backend.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Caller-context extraction from gateway-verified identity headers
//! - Role authorization for record access
//! - OpenAPI documentation
//!
//! Identifier resolution and record storage live in `chartlink-core` and
//! `chartlink-records`; this crate only wires them to HTTP.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod error;
pub mod health;
pub mod records;
pub mod resolution;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

use chartlink_core::{CachedResolver, ChartStore};
use chartlink_records::RecordStore;

pub use auth::{CallerContext, InMemoryProfileSource, ProfileSource};
pub use error::ApiError;

/// Application state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: CachedResolver<dyn ChartStore>,
    pub records: Arc<dyn RecordStore>,
    pub profiles: Arc<dyn ProfileSource>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        records::list_records,
        records::create_record,
        records::get_record,
        records::update_record,
        records::delete_record,
        resolution::resolve_identifiers,
    ),
    components(schemas(
        health::HealthRes,
        records::CreateRecordReq,
        records::UpdateRecordReq,
        records::RecordListRes,
        resolution::ResolutionRes,
        chartlink_records::ClinicalRecord,
        chartlink_records::RecordKind,
    ))
)]
pub struct ApiDoc;

/// Assemble the REST router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/records/:kind",
            get(records::list_records).post(records::create_record),
        )
        .route(
            "/records/:kind/:id",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route(
            "/resolution/:requested_id",
            get(resolution::resolve_identifiers),
        )
        .with_state(state)
}
