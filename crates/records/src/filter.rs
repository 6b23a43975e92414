//! The two-field patient record filter.
//!
//! Historical identifier drift left records keyed under either `patientId`
//! or `patientUid`. Any record whose `patientId` OR `patientUid` equals any
//! resolved identifier is considered the caller's; this must be preserved
//! exactly, or records written under the older field silently disappear.

use chartlink_core::ResolvedIds;
use serde_json::json;

use crate::record::ClinicalRecord;

/// Filter over the two historical patient-id field names.
#[derive(Clone, Debug)]
pub struct PatientRecordFilter {
    ids: Vec<String>,
}

impl PatientRecordFilter {
    pub fn new(ids: &ResolvedIds) -> Self {
        Self {
            ids: ids.iter().map(str::to_owned).collect(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Whether the record's `patientId` or `patientUid` equals any of the
    /// resolved identifiers.
    pub fn matches(&self, record: &ClinicalRecord) -> bool {
        let hit = |field: &Option<String>| {
            field
                .as_deref()
                .is_some_and(|value| self.ids.iter().any(|id| id == value))
        };
        hit(&record.patient_id) || hit(&record.patient_uid)
    }

    /// Render the filter as a document-store query.
    pub fn to_query(&self) -> serde_json::Value {
        json!({
            "$or": [
                { "patientId": { "$in": self.ids } },
                { "patientUid": { "$in": self.ids } },
            ]
        })
    }
}
