use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Health check endpoint, used by monitoring and load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "chartlink is alive".into(),
    })
}
