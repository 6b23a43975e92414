//! Resolution diagnostics.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use chartlink_core::Role;

use crate::auth::caller_from_headers;
use crate::error::ApiError;
use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct ResolutionRes {
    pub requested_id: String,
    /// Identifiers in the order resolution discovered them.
    pub ids: Vec<String>,
}

/// Admin-only diagnostic: the identifier set the caller would resolve for
/// `requested_id`. Purely observational.
#[utoipa::path(
    get,
    path = "/resolution/{requested_id}",
    params(("requested_id" = String, Path, description = "Identifier to resolve")),
    responses(
        (status = 200, description = "Resolved identifier set", body = ResolutionRes),
        (status = 403, description = "Resolution diagnostics are admin-only")
    )
)]
pub async fn resolve_identifiers(
    State(state): State<AppState>,
    Path(requested_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ResolutionRes>, ApiError> {
    let caller = caller_from_headers(&headers, state.profiles.as_ref()).await?;
    if caller.profile.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "resolution diagnostics are admin-only".into(),
        ));
    }

    let ids = state
        .resolver
        .resolve(&requested_id, &caller.auth_id, &caller.profile)
        .await;

    Ok(Json(ResolutionRes {
        requested_id,
        ids: ids.iter().map(str::to_owned).collect(),
    }))
}
