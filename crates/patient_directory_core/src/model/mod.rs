//! Domain model for the patient directory.
//!
//! # Responsibility
//! - Define the records exchanged between the service facade and storage.
//! - Keep one canonical shape per entity; the service never transforms them.
//!
//! # Invariants
//! - Every entity is identified by a stable id assigned before persistence
//!   (UUIDs) or by seeded lookup rows (integer ids).
//! - Patient removal is represented by voiding; hard delete is administrative.

pub mod identifier;
pub mod lookup;
pub mod patient;
pub mod relationship;
