//! Patient directory storage contract.
//!
//! # Responsibility
//! - Declare one data-access method per directory operation.
//! - Define the error type storage failures surface as.
//!
//! # Invariants
//! - Lookups that find nothing return `Ok(None)` or an empty collection.
//! - Set-valued searches return each patient at most once.

use crate::db::DbError;
use crate::model::identifier::{
    PatientIdentifier, PatientIdentifierId, PatientIdentifierType, PatientIdentifierTypeId,
};
use crate::model::lookup::{Location, LocationId, Tribe, TribeId};
use crate::model::patient::{Gender, Patient, PatientId, PatientValidationError, PersonId};
use crate::model::relationship::{
    Relationship, RelationshipId, RelationshipType, RelationshipTypeId,
};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Unordered patient search result with identity-unique membership.
pub type PatientSet = HashSet<Patient>;

/// Storage error for directory persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(PatientValidationError),
    Db(DbError),
    PatientNotFound(PatientId),
    IdentifierNotFound(PatientIdentifierId),
    /// Identifier search pattern did not compile.
    InvalidPattern(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::PatientNotFound(id) => write!(f, "patient not found: {id}"),
            Self::IdentifierNotFound(id) => write!(f, "patient identifier not found: {id}"),
            Self::InvalidPattern(message) => {
                write!(f, "invalid identifier search pattern: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted directory data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatientValidationError> for RepoError {
    fn from(value: PatientValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access gateway behind the patient directory service.
pub trait PatientRepository {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId>;
    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>>;
    fn update_patient(&self, patient: &Patient) -> RepoResult<()>;
    fn get_patients_by_identifier(
        &self,
        identifier: &str,
        include_voided: bool,
    ) -> RepoResult<PatientSet>;
    fn get_patients_by_identifier_pattern(
        &self,
        identifier: &str,
        include_voided: bool,
    ) -> RepoResult<PatientSet>;
    fn get_patients_by_name(&self, name: &str, include_voided: bool) -> RepoResult<PatientSet>;
    fn get_similar_patients(
        &self,
        name: &str,
        birth_year: Option<i32>,
        gender: Option<Gender>,
    ) -> RepoResult<PatientSet>;
    fn void_patient(&self, patient: &Patient, reason: &str) -> RepoResult<()>;
    fn unvoid_patient(&self, patient: &Patient) -> RepoResult<()>;
    fn delete_patient(&self, patient: &Patient) -> RepoResult<()>;

    fn get_patient_identifiers(
        &self,
        identifier_type: &PatientIdentifierType,
    ) -> RepoResult<Vec<PatientIdentifier>>;
    fn update_patient_identifier(&self, identifier: &PatientIdentifier) -> RepoResult<()>;
    fn get_patient_identifier_types(&self) -> RepoResult<Vec<PatientIdentifierType>>;
    fn get_patient_identifier_type(
        &self,
        id: PatientIdentifierTypeId,
    ) -> RepoResult<Option<PatientIdentifierType>>;

    fn get_tribe(&self, id: TribeId) -> RepoResult<Option<Tribe>>;
    fn get_tribes(&self) -> RepoResult<Vec<Tribe>>;
    fn find_tribes(&self, search: &str) -> RepoResult<Vec<Tribe>>;

    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>>;
    fn get_relationships(&self) -> RepoResult<Vec<Relationship>>;
    fn get_relationships_for_person(&self, person: PersonId) -> RepoResult<Vec<Relationship>>;
    fn create_relationship(&self, relationship: &Relationship) -> RepoResult<RelationshipId>;
    fn get_relationship_types(&self) -> RepoResult<Vec<RelationshipType>>;
    fn get_relationship_type(
        &self,
        id: RelationshipTypeId,
    ) -> RepoResult<Option<RelationshipType>>;

    fn get_locations(&self) -> RepoResult<Vec<Location>>;
    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>>;
}
