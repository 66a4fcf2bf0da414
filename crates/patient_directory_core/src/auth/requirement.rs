//! Access requirements and the operation-to-requirement matrix.
//!
//! # Invariants
//! - Every directory operation maps to exactly one `Requirement`.
//! - A failed check never reaches storage.

use crate::auth::context::AuthContext;
use crate::auth::privilege::Privilege;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// What a caller must hold to run an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Any authenticated session.
    Authenticated,
    /// A specific named privilege.
    Privilege(Privilege),
}

impl Requirement {
    /// Checks this requirement against `ctx`.
    pub fn check(self, ctx: &impl AuthContext) -> Result<(), AuthorizationError> {
        match self {
            Self::Authenticated if ctx.is_authenticated() => Ok(()),
            Self::Authenticated => Err(AuthorizationError::AuthenticationRequired),
            Self::Privilege(privilege) if ctx.has_privilege(privilege) => Ok(()),
            Self::Privilege(privilege) => Err(AuthorizationError::PrivilegeRequired(privilege)),
        }
    }
}

/// Raised before any storage call when the caller lacks access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationError {
    AuthenticationRequired,
    PrivilegeRequired(Privilege),
}

impl AuthorizationError {
    /// Name of the missing privilege, if a privilege was required.
    pub fn missing_privilege(&self) -> Option<Privilege> {
        match self {
            Self::AuthenticationRequired => None,
            Self::PrivilegeRequired(privilege) => Some(*privilege),
        }
    }
}

impl Display for AuthorizationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationRequired => write!(f, "authentication required"),
            Self::PrivilegeRequired(privilege) => write!(f, "privilege required: {privilege}"),
        }
    }
}

impl Error for AuthorizationError {}

/// Every operation exposed by the patient directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientOperation {
    CreatePatient,
    GetPatient,
    UpdatePatient,
    GetPatientsByIdentifier,
    GetPatientsByIdentifierPattern,
    GetPatientsByName,
    GetSimilarPatients,
    VoidPatient,
    UnvoidPatient,
    DeletePatient,
    GetPatientIdentifiers,
    UpdatePatientIdentifier,
    GetPatientIdentifierTypes,
    GetPatientIdentifierType,
    GetTribe,
    GetTribes,
    FindTribes,
    GetRelationship,
    GetRelationships,
    GetRelationshipsForPerson,
    CreateRelationship,
    GetRelationshipTypes,
    GetRelationshipType,
    GetLocations,
    GetLocation,
    FindPatients,
}

impl PatientOperation {
    pub const ALL: [PatientOperation; 26] = [
        Self::CreatePatient,
        Self::GetPatient,
        Self::UpdatePatient,
        Self::GetPatientsByIdentifier,
        Self::GetPatientsByIdentifierPattern,
        Self::GetPatientsByName,
        Self::GetSimilarPatients,
        Self::VoidPatient,
        Self::UnvoidPatient,
        Self::DeletePatient,
        Self::GetPatientIdentifiers,
        Self::UpdatePatientIdentifier,
        Self::GetPatientIdentifierTypes,
        Self::GetPatientIdentifierType,
        Self::GetTribe,
        Self::GetTribes,
        Self::FindTribes,
        Self::GetRelationship,
        Self::GetRelationships,
        Self::GetRelationshipsForPerson,
        Self::CreateRelationship,
        Self::GetRelationshipTypes,
        Self::GetRelationshipType,
        Self::GetLocations,
        Self::GetLocation,
        Self::FindPatients,
    ];

    /// Access requirement for this operation.
    pub fn requirement(self) -> Requirement {
        use Privilege::*;
        match self {
            Self::CreatePatient => Requirement::Privilege(AddPatients),
            Self::GetPatient
            | Self::GetPatientsByIdentifier
            | Self::GetPatientsByIdentifierPattern
            | Self::GetPatientsByName
            | Self::GetSimilarPatients
            | Self::GetPatientIdentifiers
            | Self::FindPatients => Requirement::Privilege(ViewPatients),
            Self::UpdatePatient
            | Self::UpdatePatientIdentifier
            | Self::VoidPatient
            | Self::UnvoidPatient => Requirement::Privilege(EditPatients),
            Self::DeletePatient => Requirement::Privilege(DeletePatients),
            Self::GetRelationships
            | Self::GetRelationshipsForPerson
            | Self::CreateRelationship => Requirement::Privilege(ManageRelationships),
            Self::GetPatientIdentifierTypes
            | Self::GetPatientIdentifierType
            | Self::GetTribe
            | Self::GetTribes
            | Self::FindTribes
            | Self::GetRelationship
            | Self::GetRelationshipTypes
            | Self::GetRelationshipType
            | Self::GetLocations
            | Self::GetLocation => Requirement::Authenticated,
        }
    }

    /// Stable snake_case name used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatePatient => "create_patient",
            Self::GetPatient => "get_patient",
            Self::UpdatePatient => "update_patient",
            Self::GetPatientsByIdentifier => "get_patients_by_identifier",
            Self::GetPatientsByIdentifierPattern => "get_patients_by_identifier_pattern",
            Self::GetPatientsByName => "get_patients_by_name",
            Self::GetSimilarPatients => "get_similar_patients",
            Self::VoidPatient => "void_patient",
            Self::UnvoidPatient => "unvoid_patient",
            Self::DeletePatient => "delete_patient",
            Self::GetPatientIdentifiers => "get_patient_identifiers",
            Self::UpdatePatientIdentifier => "update_patient_identifier",
            Self::GetPatientIdentifierTypes => "get_patient_identifier_types",
            Self::GetPatientIdentifierType => "get_patient_identifier_type",
            Self::GetTribe => "get_tribe",
            Self::GetTribes => "get_tribes",
            Self::FindTribes => "find_tribes",
            Self::GetRelationship => "get_relationship",
            Self::GetRelationships => "get_relationships",
            Self::GetRelationshipsForPerson => "get_relationships_for_person",
            Self::CreateRelationship => "create_relationship",
            Self::GetRelationshipTypes => "get_relationship_types",
            Self::GetRelationshipType => "get_relationship_type",
            Self::GetLocations => "get_locations",
            Self::GetLocation => "get_location",
            Self::FindPatients => "find_patients",
        }
    }
}
