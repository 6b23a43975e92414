//! Chartlink server binary.
//!
//! Wires the identity resolution core, the record store, and the REST API
//! together and serves them over HTTP. The default wiring uses in-memory
//! stores; production deployments substitute the external chart and record
//! store drivers at this composition root.

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use chartlink_api::{ApiDoc, AppState, InMemoryProfileSource, ProfileSource};
use chartlink_core::{
    CachedResolver, ChartStore, CoreConfig, IdentifierResolver, InMemoryChartStore,
    ResolutionCache,
};
use chartlink_records::{InMemoryRecordStore, RecordStore};

/// Main entry point for the Chartlink server.
///
/// # Environment Variables
/// - `CHARTLINK_ADDR`: listen address (default: "0.0.0.0:3000")
/// - `CHARTLINK_RESOLUTION_TTL_SECS`: resolution cache TTL in seconds
/// - `CHARTLINK_LOOKUP_TIMEOUT_SECS`: per-lookup timeout in seconds
/// - `CHARTLINK_DEBUG_RESOLUTION`: verbose resolution logging (`true`/`1`/`yes`)
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chartlink=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = Arc::new(CoreConfig::from_env());

    let charts: Arc<dyn ChartStore> = Arc::new(InMemoryChartStore::new());
    let resolver = IdentifierResolver::new(charts, Arc::clone(&cfg));
    let cache = Arc::new(ResolutionCache::new(
        cfg.cache_ttl(),
        cfg.cache_entry_threshold(),
    ));

    let state = AppState {
        resolver: CachedResolver::new(resolver, cache),
        records: Arc::new(InMemoryRecordStore::new()) as Arc<dyn RecordStore>,
        profiles: Arc::new(InMemoryProfileSource::new()) as Arc<dyn ProfileSource>,
    };

    let app = chartlink_api::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive());

    let addr = std::env::var("CHARTLINK_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    tracing::info!("++ Starting Chartlink REST on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
