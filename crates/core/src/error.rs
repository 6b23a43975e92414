/// Errors reported by a [`ChartStore`](crate::chart::ChartStore)
/// implementation.
///
/// The resolver never propagates these: each lookup is guarded and a failure
/// contributes zero matches. The variants exist so failures can be logged
/// with a meaningful reason.
#[derive(Debug, thiserror::Error)]
pub enum ChartStoreError {
    #[error("chart store unavailable: {0}")]
    Unavailable(String),
    #[error("chart store request failed: {0}")]
    Backend(String),
    #[error("chart store lookup timed out")]
    Timeout,
}

pub type ChartResult<T> = std::result::Result<T, ChartStoreError>;
