//! Clinical record documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of clinical record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Appointment,
    Prescription,
    LabRequest,
    LabResult,
    Note,
    Availability,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Appointment => "appointment",
            RecordKind::Prescription => "prescription",
            RecordKind::LabRequest => "lab_request",
            RecordKind::LabResult => "lab_result",
            RecordKind::Note => "note",
            RecordKind::Availability => "availability",
        }
    }

    /// Parse a kind from a route path segment.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "appointment" => Some(RecordKind::Appointment),
            "prescription" => Some(RecordKind::Prescription),
            "lab_request" => Some(RecordKind::LabRequest),
            "lab_result" => Some(RecordKind::LabResult),
            "note" => Some(RecordKind::Note),
            "availability" => Some(RecordKind::Availability),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A clinical record document.
///
/// `patient_id` and `patient_uid` are two historical spellings of the same
/// linkage; a record belongs to a patient when either field matches one of
/// the patient's resolved identifiers. New records should populate
/// `patient_id`, but readers must honour both.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    #[serde(rename = "patientId", default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(rename = "patientUid", default, skip_serializing_if = "Option::is_none")]
    pub patient_uid: Option<String>,
    /// Kind-specific payload, stored as-is.
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClinicalRecord {
    /// Create a record with a fresh id and current timestamps.
    pub fn new(
        kind: RecordKind,
        patient_id: Option<String>,
        patient_uid: Option<String>,
        body: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            patient_id,
            patient_uid,
            body,
            created_at: now,
            updated_at: now,
        }
    }
}
