//! The clinical record store interface.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RecordResult;
use crate::filter::PatientRecordFilter;
use crate::record::{ClinicalRecord, RecordKind};

/// CRUD capability over the clinical record store.
///
/// `get` distinguishes "record does not exist" (`Ok(None)`) from a store
/// failure (`Err`).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new record and return it as stored.
    async fn insert(&self, record: ClinicalRecord) -> RecordResult<ClinicalRecord>;

    async fn get(&self, id: Uuid) -> RecordResult<Option<ClinicalRecord>>;

    /// Replace the body of an existing record and bump `updated_at`.
    /// Returns the updated record, or `None` if no record has that id.
    async fn update(
        &self,
        id: Uuid,
        body: serde_json::Value,
    ) -> RecordResult<Option<ClinicalRecord>>;

    /// Returns whether a record was deleted.
    async fn delete(&self, id: Uuid) -> RecordResult<bool>;

    /// Records of `kind` belonging to any identifier in `filter`, ordered
    /// by creation time.
    async fn find_for_patient(
        &self,
        kind: RecordKind,
        filter: &PatientRecordFilter,
    ) -> RecordResult<Vec<ClinicalRecord>>;
}
