//! Storage gateway contract and its SQLite implementation.
//!
//! # Responsibility
//! - Define the data-access contract the directory service delegates to.
//! - Isolate SQLite query details from authorization and orchestration.
//!
//! # Invariants
//! - Repository writes enforce `Patient::validate()` before persistence.
//! - Not-found lookups are `Ok(None)`; failed mutations of missing rows are
//!   semantic `*NotFound` errors.

pub mod patient_repo;
pub mod sqlite_patient_repo;
