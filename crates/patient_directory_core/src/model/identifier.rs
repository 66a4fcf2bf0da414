//! Patient identifier model.
//!
//! Identifiers are owned by a patient but carry their own stable id so they
//! can be updated without rewriting the patient record.

use crate::model::lookup::LocationId;
use crate::model::patient::PatientId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one patient identifier row.
pub type PatientIdentifierId = Uuid;

/// Integer id of an identifier type lookup row.
pub type PatientIdentifierTypeId = i64;

/// Classification for identifiers (national id, medical record number, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentifierType {
    pub id: PatientIdentifierTypeId,
    pub name: String,
    pub description: Option<String>,
    /// Optional regular expression describing valid values.
    pub format: Option<String>,
}

/// One identifier value held by a patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientIdentifier {
    pub identifier_id: PatientIdentifierId,
    pub patient_id: PatientId,
    pub identifier: String,
    pub identifier_type_id: PatientIdentifierTypeId,
    pub location_id: Option<LocationId>,
    pub preferred: bool,
    pub voided: bool,
}

impl PatientIdentifier {
    /// Creates a non-preferred, active identifier with a generated id.
    pub fn new(
        patient_id: PatientId,
        identifier: impl Into<String>,
        identifier_type_id: PatientIdentifierTypeId,
    ) -> Self {
        Self {
            identifier_id: Uuid::new_v4(),
            patient_id,
            identifier: identifier.into(),
            identifier_type_id,
            location_id: None,
            preferred: false,
            voided: false,
        }
    }
}
