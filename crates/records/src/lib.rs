//! # Chartlink Records
//!
//! Clinical record model and storage interface for the Chartlink backend.
//!
//! Records carry their patient linkage under one of two historical field
//! names, `patientId` or `patientUid`. [`PatientRecordFilter`] builds the
//! "any resolved identifier, under either field" query that record-access
//! routes run after identifier resolution; [`RecordStore`] is the CRUD
//! capability over the document store, with an in-memory implementation for
//! tests and default wiring.

pub mod error;
pub mod filter;
pub mod memory;
pub mod record;
pub mod store;

pub use error::{RecordResult, RecordStoreError};
pub use filter::PatientRecordFilter;
pub use memory::InMemoryRecordStore;
pub use record::{ClinicalRecord, RecordKind};
pub use store::RecordStore;
