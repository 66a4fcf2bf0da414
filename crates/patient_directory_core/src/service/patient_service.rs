//! Permission-gated patient directory service.
//!
//! # Responsibility
//! - Check the caller's session against each operation's requirement.
//! - Forward authorized calls to the storage gateway unchanged.
//! - Route composite free-text searches to identifier or name lookup.
//!
//! # Invariants
//! - Authorization runs before anything else; a denied call never touches
//!   the repository.
//! - Each authorized call makes exactly one repository call, except
//!   `find_patients` for short queries, which makes none.
//! - Repository results and errors are returned unmodified.
//! - Log events carry ids, counts and routes only, never names or query text.

use crate::auth::context::AuthContext;
use crate::auth::requirement::{AuthorizationError, PatientOperation};
use crate::config::DirectoryConfig;
use crate::model::identifier::{
    PatientIdentifier, PatientIdentifierType, PatientIdentifierTypeId,
};
use crate::model::lookup::{Location, LocationId, Tribe, TribeId};
use crate::model::patient::{Gender, Patient, PatientId, PersonId};
use crate::model::relationship::{
    Relationship, RelationshipId, RelationshipType, RelationshipTypeId,
};
use crate::repo::patient_repo::{PatientRepository, PatientSet, RepoError};
use crate::service::search_route::{route_query, QueryRoute};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error: either the caller was denied, or storage failed.
#[derive(Debug)]
pub enum ServiceError {
    Authorization(AuthorizationError),
    Repo(RepoError),
}

impl ServiceError {
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authorization(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Authorization(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<AuthorizationError> for ServiceError {
    fn from(value: AuthorizationError) -> Self {
        Self::Authorization(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Patient directory facade over a `PatientRepository`.
pub struct PatientService<R: PatientRepository> {
    repo: R,
    config: DirectoryConfig,
}

impl<R: PatientRepository> PatientService<R> {
    /// Creates a service with default search configuration.
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, DirectoryConfig::default())
    }

    pub fn with_config(repo: R, config: DirectoryConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    fn authorize(&self, ctx: &impl AuthContext, operation: PatientOperation) -> ServiceResult<()> {
        operation.requirement().check(ctx).map_err(|err| {
            warn!(
                "event=authorization_denied module=service operation={} reason=\"{}\"",
                operation.as_str(),
                err
            );
            ServiceError::from(err)
        })
    }

    /// Registers a new patient and returns the id storage reports.
    pub fn create_patient(
        &self,
        ctx: &impl AuthContext,
        patient: &Patient,
    ) -> ServiceResult<PatientId> {
        info!(
            "event=patient_create module=service status=start patient_id={} identifiers={}",
            patient.patient_id,
            patient.identifiers.len()
        );
        self.authorize(ctx, PatientOperation::CreatePatient)?;
        let id = self.repo.create_patient(patient)?;
        info!("event=patient_create module=service status=ok patient_id={id}");
        Ok(id)
    }

    /// Gets one patient by id; `None` when unknown.
    pub fn get_patient(
        &self,
        ctx: &impl AuthContext,
        id: PatientId,
    ) -> ServiceResult<Option<Patient>> {
        self.authorize(ctx, PatientOperation::GetPatient)?;
        Ok(self.repo.get_patient(id)?)
    }

    /// Replaces a stored patient. No concurrency check happens here.
    pub fn update_patient(&self, ctx: &impl AuthContext, patient: &Patient) -> ServiceResult<()> {
        self.authorize(ctx, PatientOperation::UpdatePatient)?;
        self.repo.update_patient(patient)?;
        info!(
            "event=patient_update module=service status=ok patient_id={}",
            patient.patient_id
        );
        Ok(())
    }

    /// Patients holding exactly `identifier`.
    pub fn get_patients_by_identifier(
        &self,
        ctx: &impl AuthContext,
        identifier: &str,
        include_voided: bool,
    ) -> ServiceResult<PatientSet> {
        self.authorize(ctx, PatientOperation::GetPatientsByIdentifier)?;
        Ok(self
            .repo
            .get_patients_by_identifier(identifier, include_voided)?)
    }

    /// Patients whose identifier matches the configured identifier template
    /// with `identifier` substituted in.
    pub fn get_patients_by_identifier_pattern(
        &self,
        ctx: &impl AuthContext,
        identifier: &str,
        include_voided: bool,
    ) -> ServiceResult<PatientSet> {
        self.authorize(ctx, PatientOperation::GetPatientsByIdentifierPattern)?;
        Ok(self
            .repo
            .get_patients_by_identifier_pattern(identifier, include_voided)?)
    }

    pub fn get_patients_by_name(
        &self,
        ctx: &impl AuthContext,
        name: &str,
        include_voided: bool,
    ) -> ServiceResult<PatientSet> {
        self.authorize(ctx, PatientOperation::GetPatientsByName)?;
        Ok(self.repo.get_patients_by_name(name, include_voided)?)
    }

    /// Name search over non-voided patients only.
    pub fn get_active_patients_by_name(
        &self,
        ctx: &impl AuthContext,
        name: &str,
    ) -> ServiceResult<PatientSet> {
        self.get_patients_by_name(ctx, name, false)
    }

    /// Possible duplicates of a patient being registered. Matching rules
    /// belong to the repository.
    pub fn get_similar_patients(
        &self,
        ctx: &impl AuthContext,
        name: &str,
        birth_year: Option<i32>,
        gender: Option<Gender>,
    ) -> ServiceResult<PatientSet> {
        self.authorize(ctx, PatientOperation::GetSimilarPatients)?;
        Ok(self.repo.get_similar_patients(name, birth_year, gender)?)
    }

    /// Voids (soft-deletes) a patient.
    pub fn void_patient(
        &self,
        ctx: &impl AuthContext,
        patient: &Patient,
        reason: &str,
    ) -> ServiceResult<()> {
        self.authorize(ctx, PatientOperation::VoidPatient)?;
        self.repo.void_patient(patient, reason)?;
        info!(
            "event=patient_void module=service status=ok patient_id={}",
            patient.patient_id
        );
        Ok(())
    }

    pub fn unvoid_patient(&self, ctx: &impl AuthContext, patient: &Patient) -> ServiceResult<()> {
        self.authorize(ctx, PatientOperation::UnvoidPatient)?;
        self.repo.unvoid_patient(patient)?;
        info!(
            "event=patient_unvoid module=service status=ok patient_id={}",
            patient.patient_id
        );
        Ok(())
    }

    /// Permanently removes a patient.
    ///
    /// Administrative and test use only; callers should prefer
    /// [`PatientService::void_patient`].
    pub fn delete_patient(&self, ctx: &impl AuthContext, patient: &Patient) -> ServiceResult<()> {
        self.authorize(ctx, PatientOperation::DeletePatient)?;
        self.repo.delete_patient(patient)?;
        warn!(
            "event=patient_delete module=service status=ok patient_id={}",
            patient.patient_id
        );
        Ok(())
    }

    pub fn get_patient_identifiers(
        &self,
        ctx: &impl AuthContext,
        identifier_type: &PatientIdentifierType,
    ) -> ServiceResult<Vec<PatientIdentifier>> {
        self.authorize(ctx, PatientOperation::GetPatientIdentifiers)?;
        Ok(self.repo.get_patient_identifiers(identifier_type)?)
    }

    pub fn update_patient_identifier(
        &self,
        ctx: &impl AuthContext,
        identifier: &PatientIdentifier,
    ) -> ServiceResult<()> {
        self.authorize(ctx, PatientOperation::UpdatePatientIdentifier)?;
        Ok(self.repo.update_patient_identifier(identifier)?)
    }

    pub fn get_patient_identifier_types(
        &self,
        ctx: &impl AuthContext,
    ) -> ServiceResult<Vec<PatientIdentifierType>> {
        self.authorize(ctx, PatientOperation::GetPatientIdentifierTypes)?;
        Ok(self.repo.get_patient_identifier_types()?)
    }

    pub fn get_patient_identifier_type(
        &self,
        ctx: &impl AuthContext,
        id: PatientIdentifierTypeId,
    ) -> ServiceResult<Option<PatientIdentifierType>> {
        self.authorize(ctx, PatientOperation::GetPatientIdentifierType)?;
        Ok(self.repo.get_patient_identifier_type(id)?)
    }

    pub fn get_tribe(&self, ctx: &impl AuthContext, id: TribeId) -> ServiceResult<Option<Tribe>> {
        self.authorize(ctx, PatientOperation::GetTribe)?;
        Ok(self.repo.get_tribe(id)?)
    }

    /// Non-retired tribes.
    pub fn get_tribes(&self, ctx: &impl AuthContext) -> ServiceResult<Vec<Tribe>> {
        self.authorize(ctx, PatientOperation::GetTribes)?;
        Ok(self.repo.get_tribes()?)
    }

    /// Non-retired tribes by partial name.
    pub fn find_tribes(&self, ctx: &impl AuthContext, search: &str) -> ServiceResult<Vec<Tribe>> {
        self.authorize(ctx, PatientOperation::FindTribes)?;
        Ok(self.repo.find_tribes(search)?)
    }

    pub fn get_relationship(
        &self,
        ctx: &impl AuthContext,
        id: RelationshipId,
    ) -> ServiceResult<Option<Relationship>> {
        self.authorize(ctx, PatientOperation::GetRelationship)?;
        Ok(self.repo.get_relationship(id)?)
    }

    /// Non-voided relationships.
    pub fn get_relationships(&self, ctx: &impl AuthContext) -> ServiceResult<Vec<Relationship>> {
        self.authorize(ctx, PatientOperation::GetRelationships)?;
        Ok(self.repo.get_relationships()?)
    }

    /// Relationships with `person` on either side.
    pub fn get_relationships_for_person(
        &self,
        ctx: &impl AuthContext,
        person: PersonId,
    ) -> ServiceResult<Vec<Relationship>> {
        self.authorize(ctx, PatientOperation::GetRelationshipsForPerson)?;
        Ok(self.repo.get_relationships_for_person(person)?)
    }

    pub fn create_relationship(
        &self,
        ctx: &impl AuthContext,
        relationship: &Relationship,
    ) -> ServiceResult<RelationshipId> {
        self.authorize(ctx, PatientOperation::CreateRelationship)?;
        let id = self.repo.create_relationship(relationship)?;
        info!(
            "event=relationship_create module=service status=ok relationship_id={id} type_id={}",
            relationship.relationship_type_id
        );
        Ok(id)
    }

    pub fn get_relationship_types(
        &self,
        ctx: &impl AuthContext,
    ) -> ServiceResult<Vec<RelationshipType>> {
        self.authorize(ctx, PatientOperation::GetRelationshipTypes)?;
        Ok(self.repo.get_relationship_types()?)
    }

    pub fn get_relationship_type(
        &self,
        ctx: &impl AuthContext,
        id: RelationshipTypeId,
    ) -> ServiceResult<Option<RelationshipType>> {
        self.authorize(ctx, PatientOperation::GetRelationshipType)?;
        Ok(self.repo.get_relationship_type(id)?)
    }

    pub fn get_locations(&self, ctx: &impl AuthContext) -> ServiceResult<Vec<Location>> {
        self.authorize(ctx, PatientOperation::GetLocations)?;
        Ok(self.repo.get_locations()?)
    }

    pub fn get_location(
        &self,
        ctx: &impl AuthContext,
        id: LocationId,
    ) -> ServiceResult<Option<Location>> {
        self.authorize(ctx, PatientOperation::GetLocation)?;
        Ok(self.repo.get_location(id)?)
    }

    /// Composite free-text search.
    ///
    /// # Contract
    /// - Authorization is checked first, even for short queries.
    /// - Queries shorter than `min_query_length` characters return an empty
    ///   list without touching storage.
    /// - Queries containing an ASCII digit go to identifier pattern search,
    ///   all others to name search. Results keep storage iteration order.
    pub fn find_patients(
        &self,
        ctx: &impl AuthContext,
        query: &str,
        include_voided: bool,
    ) -> ServiceResult<Vec<Patient>> {
        self.authorize(ctx, PatientOperation::FindPatients)?;

        let route = route_query(query, self.config.min_query_length);
        debug!(
            "event=patient_find module=service route={} query_chars={}",
            route.as_str(),
            query.chars().count()
        );

        let patients = match route {
            QueryRoute::TooShort => return Ok(Vec::new()),
            QueryRoute::Identifier => self
                .repo
                .get_patients_by_identifier_pattern(query, include_voided)?,
            QueryRoute::Name => self.repo.get_patients_by_name(query, include_voided)?,
        };

        Ok(patients.into_iter().collect())
    }
}
