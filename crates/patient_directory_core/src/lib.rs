//! Permission-gated patient directory.
//! Every operation checks the caller's session before delegating to storage.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::context::{AuthContext, SessionContext};
pub use auth::privilege::{parse_privilege, Privilege, PrivilegeParseError};
pub use auth::requirement::{AuthorizationError, PatientOperation, Requirement};
pub use config::{ConfigError, DirectoryConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::identifier::{
    PatientIdentifier, PatientIdentifierId, PatientIdentifierType, PatientIdentifierTypeId,
};
pub use model::lookup::{Location, LocationId, Tribe, TribeId};
pub use model::patient::{
    Gender, Patient, PatientId, PatientValidationError, PersonId, PersonName,
};
pub use model::relationship::{
    Relationship, RelationshipId, RelationshipType, RelationshipTypeId,
};
pub use repo::patient_repo::{PatientRepository, PatientSet, RepoError, RepoResult};
pub use repo::sqlite_patient_repo::SqlitePatientRepository;
pub use service::patient_service::{PatientService, ServiceError, ServiceResult};
pub use service::search_route::{route_query, QueryRoute};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
