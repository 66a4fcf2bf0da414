//! Directory use-case services.
//!
//! # Responsibility
//! - Gate every directory operation on the caller's session.
//! - Keep callers decoupled from storage details.

pub mod patient_service;
pub mod search_route;
