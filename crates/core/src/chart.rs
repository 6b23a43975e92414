//! The external chart store interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChartResult;

/// A clinical chart document as held by the external chart store.
///
/// `chart_id` is the store-assigned document key. `owner_user_id` is the
/// legacy in-document `id` field: some deployments write the auth-provider
/// id there instead of `authUserId`. The two are distinct linkage
/// mechanisms and must never be merged. Multiple charts may share a phone
/// number (duplicate/legacy charts), so phone is only ever a secondary key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// The store-assigned document key.
    #[serde(rename = "chartId")]
    pub chart_id: String,
    /// Auth-provider id of the linked patient, when the chart carries one.
    #[serde(rename = "authUserId", default, skip_serializing_if = "Option::is_none")]
    pub auth_user_id: Option<String>,
    /// Legacy owner field, serialised as `id` inside the document body.
    #[serde(rename = "id", default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Chart {
    /// A chart with only a document key.
    pub fn new(chart_id: impl Into<String>) -> Self {
        Self {
            chart_id: chart_id.into(),
            auth_user_id: None,
            owner_user_id: None,
            phone: None,
        }
    }

    pub fn with_auth_user_id(mut self, auth_user_id: impl Into<String>) -> Self {
        self.auth_user_id = Some(auth_user_id.into());
        self
    }

    pub fn with_owner_user_id(mut self, owner_user_id: impl Into<String>) -> Self {
        self.owner_user_id = Some(owner_user_id.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

/// Lookup capability over the external chart store.
///
/// `fetch` distinguishes "document does not exist" (`Ok(None)`) from a store
/// failure (`Err`); the resolver relies on that distinction. The search
/// methods return at most `limit` matching charts.
#[async_trait]
pub trait ChartStore: Send + Sync {
    /// Point lookup by the chart's own document key.
    async fn fetch(&self, chart_id: &str) -> ChartResult<Option<Chart>>;

    /// Charts whose `phone` field equals `phone`.
    async fn find_by_phone(&self, phone: &str, limit: usize) -> ChartResult<Vec<Chart>>;

    /// Charts whose legacy in-document `id` field equals `owner_user_id`.
    async fn find_by_owner_user_id(
        &self,
        owner_user_id: &str,
        limit: usize,
    ) -> ChartResult<Vec<Chart>>;

    /// Charts whose `authUserId` field equals `auth_user_id`.
    async fn find_by_auth_user_id(
        &self,
        auth_user_id: &str,
        limit: usize,
    ) -> ChartResult<Vec<Chart>>;
}
