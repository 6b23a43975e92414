//! Caller identity extraction.
//!
//! Token verification happens upstream (the gateway validates the bearer
//! token against the identity provider); the verified identity reaches this
//! service as trusted headers. When the gateway forwards only the user id,
//! a [`ProfileSource`] supplies the caller's profile.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio::sync::RwLock;

use chartlink_core::{Profile, Role};

use crate::error::ApiError;

pub const AUTH_USER_HEADER: &str = "x-auth-user-id";
pub const ROLE_HEADER: &str = "x-user-role";
pub const LINKED_PATIENT_HEADER: &str = "x-linked-patient-id";
pub const PHONE_HEADER: &str = "x-user-phone";

/// The authenticated caller: auth-provider id plus resolved profile.
#[derive(Clone, Debug)]
pub struct CallerContext {
    pub auth_id: String,
    pub profile: Profile,
}

impl CallerContext {
    pub fn is_staff(&self) -> bool {
        self.profile.role.is_staff()
    }

    pub fn is_patient(&self) -> bool {
        self.profile.role.is_patient()
    }
}

/// Supplies a caller's profile for a given auth id.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile_for(&self, auth_id: &str) -> Option<Profile>;
}

/// Static profile table, used by tests and the default wiring.
#[derive(Debug, Default)]
pub struct InMemoryProfileSource {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, auth_id: impl Into<String>, profile: Profile) {
        self.profiles.write().await.insert(auth_id.into(), profile);
    }
}

#[async_trait]
impl ProfileSource for InMemoryProfileSource {
    async fn profile_for(&self, auth_id: &str) -> Option<Profile> {
        self.profiles.read().await.get(auth_id).cloned()
    }
}

/// Build the caller context from gateway headers.
///
/// The user-id header is required. The role and linkage headers are
/// preferred when present; otherwise the profile source is consulted, and a
/// caller with no profile at all gets [`Role::Unknown`].
pub async fn caller_from_headers(
    headers: &HeaderMap,
    profiles: &dyn ProfileSource,
) -> Result<CallerContext, ApiError> {
    let auth_id = header_str(headers, AUTH_USER_HEADER).ok_or(ApiError::Unauthenticated)?;

    let profile = match header_str(headers, ROLE_HEADER) {
        Some(role) => Profile {
            role: Role::parse(role),
            linked_patient_id: header_str(headers, LINKED_PATIENT_HEADER).map(str::to_owned),
            phone: header_str(headers, PHONE_HEADER).map(str::to_owned),
        },
        None => profiles
            .profile_for(auth_id)
            .await
            .unwrap_or_else(|| Profile::with_role(Role::Unknown)),
    };

    Ok(CallerContext {
        auth_id: auth_id.to_owned(),
        profile,
    })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
