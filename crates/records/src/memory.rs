//! In-memory record store.
//!
//! Backs tests and the default server wiring when no external document
//! store is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::RecordResult;
use crate::filter::PatientRecordFilter;
use crate::record::{ClinicalRecord, RecordKind};
use crate::store::RecordStore;

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<Uuid, ClinicalRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert(&self, record: ClinicalRecord) -> RecordResult<ClinicalRecord> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> RecordResult<Option<ClinicalRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        body: serde_json::Value,
    ) -> RecordResult<Option<ClinicalRecord>> {
        let mut records = self.records.write().await;
        match records.get_mut(&id) {
            Some(record) => {
                record.body = body;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> RecordResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn find_for_patient(
        &self,
        kind: RecordKind,
        filter: &PatientRecordFilter,
    ) -> RecordResult<Vec<ClinicalRecord>> {
        let records = self.records.read().await;
        let mut matches: Vec<ClinicalRecord> = records
            .values()
            .filter(|r| r.kind == kind && filter.matches(r))
            .cloned()
            .collect();
        matches.sort_by_key(|r| r.created_at);
        Ok(matches)
    }
}
