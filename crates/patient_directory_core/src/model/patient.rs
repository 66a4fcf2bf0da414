//! Patient domain model.
//!
//! # Responsibility
//! - Define the patient record passed between service and storage layers.
//! - Provide lifecycle helpers for void (soft-delete) semantics.
//!
//! # Invariants
//! - `patient_id` is stable and never reused for another patient.
//! - `voided` is the source of truth for soft-delete state.
//! - A voided patient always carries a non-blank `void_reason`.
//! - Equality and hashing use `patient_id` only.

use crate::model::identifier::PatientIdentifier;
use crate::model::lookup::TribeId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

static BIRTHDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$")
        .expect("valid birthdate regex")
});

/// Stable identifier of a person record.
pub type PersonId = Uuid;

/// Patients are persons; the patient id is the person id.
pub type PatientId = PersonId;

/// Administrative gender recorded on the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Single-letter storage code.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
            Self::Unknown => "U",
        }
    }

    /// Parses a storage code back into a gender.
    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            "U" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Structured person name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub given_name: String,
    pub middle_name: Option<String>,
    pub family_name: String,
}

impl PersonName {
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            given_name: given_name.into(),
            middle_name: None,
            family_name: family_name.into(),
        }
    }

    /// Space-joined display form, skipping empty parts.
    pub fn full_name(&self) -> String {
        [
            Some(self.given_name.as_str()),
            self.middle_name.as_deref(),
            Some(self.family_name.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

/// Canonical patient record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: PatientId,
    pub name: PersonName,
    pub gender: Gender,
    /// ISO calendar date `YYYY-MM-DD`.
    pub birthdate: Option<String>,
    pub tribe_id: Option<TribeId>,
    pub identifiers: Vec<PatientIdentifier>,
    pub voided: bool,
    pub void_reason: Option<String>,
}

impl Patient {
    /// Creates a new active patient with a generated stable ID.
    pub fn new(name: PersonName, gender: Gender) -> Self {
        Self::with_id(Uuid::new_v4(), name, gender)
    }

    /// Creates a patient with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(patient_id: PatientId, name: PersonName, gender: Gender) -> Self {
        Self {
            patient_id,
            name,
            gender,
            birthdate: None,
            tribe_id: None,
            identifiers: Vec::new(),
            voided: false,
            void_reason: None,
        }
    }

    /// Marks this patient as voided with the given reason.
    pub fn void(&mut self, reason: impl Into<String>) {
        self.voided = true;
        self.void_reason = Some(reason.into());
    }

    /// Clears the void flag and reason.
    pub fn unvoid(&mut self) {
        self.voided = false;
        self.void_reason = None;
    }

    pub fn is_active(&self) -> bool {
        !self.voided
    }

    /// Year component of `birthdate`, when present and well-formed.
    pub fn birth_year(&self) -> Option<i32> {
        self.birthdate
            .as_deref()
            .filter(|value| BIRTHDATE_RE.is_match(value))
            .and_then(|value| value.get(..4))
            .and_then(|year| year.parse().ok())
    }

    /// Validates the record before persistence.
    ///
    /// # Errors
    /// - `MissingName` when both given and family names are blank.
    /// - `InvalidBirthdate` when `birthdate` is not `YYYY-MM-DD`.
    /// - `MissingVoidReason` when voided without a reason.
    /// - `BlankIdentifier` when any identifier value is blank.
    pub fn validate(&self) -> Result<(), PatientValidationError> {
        if self.name.given_name.trim().is_empty() && self.name.family_name.trim().is_empty() {
            return Err(PatientValidationError::MissingName);
        }

        if let Some(birthdate) = self.birthdate.as_deref() {
            if !BIRTHDATE_RE.is_match(birthdate) {
                return Err(PatientValidationError::InvalidBirthdate(birthdate.to_string()));
            }
        }

        if self.voided
            && self
                .void_reason
                .as_deref()
                .map_or(true, |reason| reason.trim().is_empty())
        {
            return Err(PatientValidationError::MissingVoidReason);
        }

        if self
            .identifiers
            .iter()
            .any(|identifier| identifier.identifier.trim().is_empty())
        {
            return Err(PatientValidationError::BlankIdentifier);
        }

        Ok(())
    }
}

impl PartialEq for Patient {
    fn eq(&self, other: &Self) -> bool {
        self.patient_id == other.patient_id
    }
}

impl Eq for Patient {}

impl Hash for Patient {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.patient_id.hash(state);
    }
}

/// Patient validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientValidationError {
    MissingName,
    InvalidBirthdate(String),
    MissingVoidReason,
    BlankIdentifier,
}

impl Display for PatientValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "patient requires a given or family name"),
            Self::InvalidBirthdate(value) => {
                write!(f, "birthdate must be YYYY-MM-DD, got `{value}`")
            }
            Self::MissingVoidReason => write!(f, "voided patient requires a void reason"),
            Self::BlankIdentifier => write!(f, "patient identifier value must not be blank"),
        }
    }
}

impl Error for PatientValidationError {}

#[cfg(test)]
mod tests {
    use super::{Gender, Patient, PatientValidationError, PersonName};
    use std::collections::HashSet;

    fn patient() -> Patient {
        Patient::new(PersonName::new("Ada", "Lovelace"), Gender::Female)
    }

    #[test]
    fn new_patient_is_active_and_valid() {
        let patient = patient();
        assert!(patient.is_active());
        patient.validate().expect("fresh patient should validate");
    }

    #[test]
    fn void_and_unvoid_toggle_state() {
        let mut patient = patient();
        patient.void("duplicate record");
        assert!(!patient.is_active());
        assert_eq!(patient.void_reason.as_deref(), Some("duplicate record"));
        patient.validate().expect("voided patient with reason is valid");

        patient.unvoid();
        assert!(patient.is_active());
        assert!(patient.void_reason.is_none());
    }

    #[test]
    fn validate_rejects_blank_void_reason() {
        let mut patient = patient();
        patient.void("  ");
        assert_eq!(
            patient.validate().expect_err("blank reason must fail"),
            PatientValidationError::MissingVoidReason
        );
    }

    #[test]
    fn validate_rejects_malformed_birthdate() {
        let mut patient = patient();
        patient.birthdate = Some("12/10/1815".to_string());
        assert!(matches!(
            patient.validate(),
            Err(PatientValidationError::InvalidBirthdate(_))
        ));
    }

    #[test]
    fn validate_rejects_missing_name() {
        let patient = Patient::new(PersonName::new(" ", ""), Gender::Unknown);
        assert_eq!(
            patient.validate().expect_err("nameless patient must fail"),
            PatientValidationError::MissingName
        );
    }

    #[test]
    fn birth_year_reads_iso_prefix() {
        let mut patient = patient();
        assert_eq!(patient.birth_year(), None);
        patient.birthdate = Some("1815-12-10".to_string());
        assert_eq!(patient.birth_year(), Some(1815));
    }

    #[test]
    fn validate_rejects_non_ascii_digit_birthdate() {
        let mut patient = patient();
        patient.birthdate = Some("१९९०-01-01".to_string());
        assert!(matches!(
            patient.validate(),
            Err(PatientValidationError::InvalidBirthdate(_))
        ));
        assert_eq!(patient.birth_year(), None);
    }

    #[test]
    fn equality_and_hash_follow_identity() {
        let first = patient();
        let mut renamed = first.clone();
        renamed.name = PersonName::new("Augusta", "King");

        let set: HashSet<Patient> = [first.clone(), renamed].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_ne!(first, patient());
    }

    #[test]
    fn full_name_skips_empty_parts() {
        let mut name = PersonName::new("Ada", "Lovelace");
        assert_eq!(name.full_name(), "Ada Lovelace");
        name.middle_name = Some("Augusta".to_string());
        assert_eq!(name.full_name(), "Ada Augusta Lovelace");
    }

    #[test]
    fn gender_codes_roundtrip() {
        for gender in [Gender::Male, Gender::Female, Gender::Unknown] {
            assert_eq!(Gender::from_code(gender.as_code()), Some(gender));
        }
        assert_eq!(Gender::from_code("X"), None);
    }
}
