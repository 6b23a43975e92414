//! Caller profile types.
//!
//! The profile is supplied by the external identity/profile layer, already
//! verified, and consumed once per request by the resolver. Role strings
//! are parsed into a closed enumeration at the boundary so unknown or
//! missing roles are decided here rather than deep inside resolution logic.

use serde::{Deserialize, Serialize};

/// Caller role as supplied by the external profile source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
    Patient,
    /// Anything the profile layer sent that is not a recognised role.
    Unknown,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Patient => "patient",
            Role::Unknown => "unknown",
        }
    }

    /// Parse a role string, case-insensitively. Unrecognised values map to
    /// [`Role::Unknown`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "doctor" => Role::Doctor,
            "nurse" => Role::Nurse,
            "patient" => Role::Patient,
            _ => Role::Unknown,
        }
    }

    pub fn is_patient(self) -> bool {
        matches!(self, Role::Patient)
    }

    /// Clinical or administrative staff.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Doctor | Role::Nurse)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A caller's profile, as resolved by the external profile source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    pub role: Role,
    /// Legacy link from a profile to a patient identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Profile {
    /// A profile with only a role, no legacy linkage and no phone.
    pub fn with_role(role: Role) -> Self {
        Self {
            role,
            linked_patient_id: None,
            phone: None,
        }
    }
}
