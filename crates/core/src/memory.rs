//! In-memory chart store.
//!
//! Backs tests and the default server wiring when no external chart store
//! is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::chart::{Chart, ChartStore};
use crate::error::ChartResult;

#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    charts: RwLock<HashMap<String, Chart>>,
}

impl InMemoryChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chart, keyed by its `chart_id`. Replaces any existing chart
    /// with the same key.
    pub async fn insert(&self, chart: Chart) {
        self.charts
            .write()
            .await
            .insert(chart.chart_id.clone(), chart);
    }

    pub async fn len(&self) -> usize {
        self.charts.read().await.len()
    }
}

#[async_trait]
impl ChartStore for InMemoryChartStore {
    async fn fetch(&self, chart_id: &str) -> ChartResult<Option<Chart>> {
        Ok(self.charts.read().await.get(chart_id).cloned())
    }

    async fn find_by_phone(&self, phone: &str, limit: usize) -> ChartResult<Vec<Chart>> {
        Ok(self
            .charts
            .read()
            .await
            .values()
            .filter(|c| c.phone.as_deref() == Some(phone))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_owner_user_id(
        &self,
        owner_user_id: &str,
        limit: usize,
    ) -> ChartResult<Vec<Chart>> {
        Ok(self
            .charts
            .read()
            .await
            .values()
            .filter(|c| c.owner_user_id.as_deref() == Some(owner_user_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_auth_user_id(
        &self,
        auth_user_id: &str,
        limit: usize,
    ) -> ChartResult<Vec<Chart>> {
        Ok(self
            .charts
            .read()
            .await
            .values()
            .filter(|c| c.auth_user_id.as_deref() == Some(auth_user_id))
            .take(limit)
            .cloned()
            .collect())
    }
}
