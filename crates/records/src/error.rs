/// Errors reported by a [`RecordStore`](crate::store::RecordStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("record store request failed: {0}")]
    Backend(String),
}

pub type RecordResult<T> = std::result::Result<T, RecordStoreError>;
