//! Record access routes.
//!
//! Every read goes through identifier resolution: the caller's requested id
//! is expanded into the full set of identifiers their records may be filed
//! under, and the record store is queried with the two-field
//! (`patientId` OR `patientUid`) filter over that set.
//!
//! Authorization: staff (admin/doctor/nurse) may read any patient and
//! perform writes. Patients may only read identifiers that resolve into
//! their own linkage closure, and may only create records for themselves.
//! Callers with an unrecognised role are refused.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use chartlink_core::ResolvedIds;
use chartlink_records::{ClinicalRecord, PatientRecordFilter, RecordKind};

use crate::auth::{caller_from_headers, CallerContext};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListRecordsParams {
    /// Identifier to list records for. Defaults to the caller's own auth id.
    pub patient_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecordReq {
    #[serde(rename = "patientId", default)]
    pub patient_id: Option<String>,
    #[serde(rename = "patientUid", default)]
    pub patient_uid: Option<String>,
    /// Kind-specific payload, stored as-is.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecordReq {
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
pub struct RecordListRes {
    pub records: Vec<ClinicalRecord>,
}

fn parse_kind(segment: &str) -> Result<RecordKind, ApiError> {
    RecordKind::parse(segment)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown record kind: {segment}")))
}

fn ensure_known_role(caller: &CallerContext) -> Result<(), ApiError> {
    if caller.is_staff() || caller.is_patient() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("caller role is not recognised".into()))
    }
}

/// The caller's own linkage closure: everything their records may be filed
/// under, independent of what they asked for.
async fn own_ids(state: &AppState, caller: &CallerContext) -> ResolvedIds {
    state
        .resolver
        .resolve(&caller.auth_id, &caller.auth_id, &caller.profile)
        .await
}

#[utoipa::path(
    get,
    path = "/records/{kind}",
    params(
        ("kind" = String, Path, description = "Record kind (appointment, prescription, lab_request, lab_result, note, availability)"),
        ("patient_id" = Option<String>, Query, description = "Identifier to list records for; defaults to the caller's auth id")
    ),
    responses(
        (status = 200, description = "Records matching the resolved identifier set", body = RecordListRes),
        (status = 401, description = "Missing caller identity"),
        (status = 403, description = "Caller may not access this patient")
    )
)]
pub async fn list_records(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<ListRecordsParams>,
    headers: HeaderMap,
) -> Result<Json<RecordListRes>, ApiError> {
    let caller = caller_from_headers(&headers, state.profiles.as_ref()).await?;
    ensure_known_role(&caller)?;
    let kind = parse_kind(&kind)?;

    let requested = params
        .patient_id
        .clone()
        .unwrap_or_else(|| caller.auth_id.clone());

    if caller.is_patient() && requested != caller.auth_id {
        let own = own_ids(&state, &caller).await;
        if !own.contains(&requested) {
            return Err(ApiError::Forbidden(
                "patients may only access their own records".into(),
            ));
        }
    }

    let ids = state
        .resolver
        .resolve(&requested, &caller.auth_id, &caller.profile)
        .await;
    let filter = PatientRecordFilter::new(&ids);
    let records = state.records.find_for_patient(kind, &filter).await?;

    Ok(Json(RecordListRes { records }))
}

#[utoipa::path(
    post,
    path = "/records/{kind}",
    params(("kind" = String, Path, description = "Record kind")),
    request_body = CreateRecordReq,
    responses(
        (status = 201, description = "Record created", body = ClinicalRecord),
        (status = 400, description = "Missing patient linkage"),
        (status = 403, description = "Caller may not create records for this patient")
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    headers: HeaderMap,
    Json(req): Json<CreateRecordReq>,
) -> Result<(StatusCode, Json<ClinicalRecord>), ApiError> {
    let caller = caller_from_headers(&headers, state.profiles.as_ref()).await?;
    ensure_known_role(&caller)?;
    let kind = parse_kind(&kind)?;

    let target = req
        .patient_id
        .as_deref()
        .or(req.patient_uid.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("patientId or patientUid is required".into()))?;

    if caller.is_patient() {
        let own = own_ids(&state, &caller).await;
        if !own.contains(target) {
            return Err(ApiError::Forbidden(
                "patients may only create records for themselves".into(),
            ));
        }
    }

    let record = ClinicalRecord::new(kind, req.patient_id, req.patient_uid, req.body);
    let record = state.records.insert(record).await?;
    tracing::info!(record_id = %record.id, kind = %record.kind, "record created");

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/records/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Record kind"),
        ("id" = Uuid, Path, description = "Record id")
    ),
    responses(
        (status = 200, description = "The record", body = ClinicalRecord),
        (status = 404, description = "No such record visible to the caller")
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> Result<Json<ClinicalRecord>, ApiError> {
    let caller = caller_from_headers(&headers, state.profiles.as_ref()).await?;
    ensure_known_role(&caller)?;
    let kind = parse_kind(&kind)?;

    let record = state.records.get(id).await?.ok_or(ApiError::NotFound)?;
    if record.kind != kind {
        return Err(ApiError::NotFound);
    }

    // Records outside a patient's own closure are indistinguishable from
    // records that do not exist.
    if caller.is_patient() {
        let own = own_ids(&state, &caller).await;
        let filter = PatientRecordFilter::new(&own);
        if !filter.matches(&record) {
            return Err(ApiError::NotFound);
        }
    }

    Ok(Json(record))
}

#[utoipa::path(
    put,
    path = "/records/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Record kind"),
        ("id" = Uuid, Path, description = "Record id")
    ),
    request_body = UpdateRecordReq,
    responses(
        (status = 200, description = "Updated record", body = ClinicalRecord),
        (status = 403, description = "Writes are staff-only"),
        (status = 404, description = "No such record")
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
    Json(req): Json<UpdateRecordReq>,
) -> Result<Json<ClinicalRecord>, ApiError> {
    let caller = caller_from_headers(&headers, state.profiles.as_ref()).await?;
    if !caller.is_staff() {
        return Err(ApiError::Forbidden("record updates are staff-only".into()));
    }
    parse_kind(&kind)?;

    let record = state
        .records
        .update(id, req.body)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/records/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Record kind"),
        ("id" = Uuid, Path, description = "Record id")
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 403, description = "Deletes are staff-only"),
        (status = 404, description = "No such record")
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let caller = caller_from_headers(&headers, state.profiles.as_ref()).await?;
    if !caller.is_staff() {
        return Err(ApiError::Forbidden("record deletes are staff-only".into()));
    }
    parse_kind(&kind)?;

    if state.records.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
