//! Caller authorization for directory operations.
//!
//! # Responsibility
//! - Declare the closed privilege set and the session contract.
//! - Map each directory operation to the requirement it is gated on.
//!
//! # Invariants
//! - Sessions are read-only from the directory's perspective.
//! - Unauthenticated sessions never hold privileges.

pub mod context;
pub mod privilege;
pub mod requirement;
