//! SQLite-backed patient directory gateway.
//!
//! # Responsibility
//! - Implement every `PatientRepository` operation over the migrated schema.
//! - Keep SQL and regex matching details inside the storage boundary.
//!
//! # Invariants
//! - Write paths call `Patient::validate()` before SQL mutations.
//! - Patient and identifier rows are written in one immediate transaction.
//! - Name tokens are matched as case-insensitive prefixes with `LIKE`
//!   wildcards escaped.
//! - Voided identifiers never match identifier searches.
//! - Patient searches return unordered sets; list lookups keep a stable order.

use crate::config::DirectoryConfig;
use crate::model::identifier::{
    PatientIdentifier, PatientIdentifierType, PatientIdentifierTypeId,
};
use crate::model::lookup::{Location, LocationId, Tribe, TribeId};
use crate::model::patient::{
    Gender, Patient, PatientId, PatientValidationError, PersonId, PersonName,
};
use crate::model::relationship::{
    Relationship, RelationshipId, RelationshipType, RelationshipTypeId,
};
use crate::repo::patient_repo::{PatientRepository, PatientSet, RepoError, RepoResult};
use regex::RegexBuilder;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::collections::BTreeSet;
use uuid::Uuid;

const PATIENT_SELECT_SQL: &str = "SELECT
    patient_id,
    given_name,
    middle_name,
    family_name,
    gender,
    birthdate,
    tribe_id,
    voided,
    void_reason
FROM patients";

const IDENTIFIER_SELECT_SQL: &str = "SELECT
    identifier_id,
    patient_id,
    identifier,
    identifier_type_id,
    location_id,
    preferred,
    voided
FROM patient_identifiers";

const RELATIONSHIP_SELECT_SQL: &str = "SELECT
    relationship_id,
    person_a,
    relationship_type_id,
    person_b,
    voided
FROM relationships";

const NAME_TOKEN_FILTER_SQL: &str = " AND (given_name LIKE ? ESCAPE '\\'
    OR IFNULL(middle_name, '') LIKE ? ESCAPE '\\'
    OR family_name LIKE ? ESCAPE '\\')";

/// SQLite patient directory gateway.
pub struct SqlitePatientRepository<'conn> {
    conn: &'conn Connection,
    config: DirectoryConfig,
}

impl<'conn> SqlitePatientRepository<'conn> {
    /// Creates a gateway with default search configuration.
    pub fn new(conn: &'conn Connection) -> Self {
        Self::with_config(conn, DirectoryConfig::default())
    }

    /// Creates a gateway using the given identifier search template.
    pub fn with_config(conn: &'conn Connection, config: DirectoryConfig) -> Self {
        Self { conn, config }
    }

    fn query_patient_set(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<PatientSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut patients = PatientSet::new();

        while let Some(row) = rows.next()? {
            let mut patient = parse_patient_row(row)?;
            patient.identifiers = load_identifiers(self.conn, patient.patient_id)?;
            patients.insert(patient);
        }

        Ok(patients)
    }

    fn set_void_state(
        &self,
        patient: &Patient,
        voided: bool,
        reason: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE patients
             SET
                voided = ?1,
                void_reason = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE patient_id = ?3;",
            params![bool_to_int(voided), reason, patient.patient_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::PatientNotFound(patient.patient_id));
        }

        Ok(())
    }
}

impl PatientRepository for SqlitePatientRepository<'_> {
    fn create_patient(&self, patient: &Patient) -> RepoResult<PatientId> {
        patient.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO patients (
                patient_id,
                given_name,
                middle_name,
                family_name,
                gender,
                birthdate,
                tribe_id,
                voided,
                void_reason
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                patient.patient_id.to_string(),
                patient.name.given_name.as_str(),
                patient.name.middle_name.as_deref(),
                patient.name.family_name.as_str(),
                patient.gender.as_code(),
                patient.birthdate.as_deref(),
                patient.tribe_id,
                bool_to_int(patient.voided),
                patient.void_reason.as_deref(),
            ],
        )?;
        insert_identifiers(&tx, patient)?;
        tx.commit()?;

        Ok(patient.patient_id)
    }

    fn get_patient(&self, id: PatientId) -> RepoResult<Option<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATIENT_SELECT_SQL} WHERE patient_id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            let mut patient = parse_patient_row(row)?;
            patient.identifiers = load_identifiers(self.conn, id)?;
            return Ok(Some(patient));
        }

        Ok(None)
    }

    fn update_patient(&self, patient: &Patient) -> RepoResult<()> {
        patient.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE patients
             SET
                given_name = ?1,
                middle_name = ?2,
                family_name = ?3,
                gender = ?4,
                birthdate = ?5,
                tribe_id = ?6,
                voided = ?7,
                void_reason = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE patient_id = ?9;",
            params![
                patient.name.given_name.as_str(),
                patient.name.middle_name.as_deref(),
                patient.name.family_name.as_str(),
                patient.gender.as_code(),
                patient.birthdate.as_deref(),
                patient.tribe_id,
                bool_to_int(patient.voided),
                patient.void_reason.as_deref(),
                patient.patient_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::PatientNotFound(patient.patient_id));
        }

        tx.execute(
            "DELETE FROM patient_identifiers WHERE patient_id = ?1;",
            [patient.patient_id.to_string()],
        )?;
        insert_identifiers(&tx, patient)?;
        tx.commit()?;

        Ok(())
    }

    fn get_patients_by_identifier(
        &self,
        identifier: &str,
        include_voided: bool,
    ) -> RepoResult<PatientSet> {
        let mut sql = format!(
            "{PATIENT_SELECT_SQL}
             WHERE EXISTS (
                SELECT 1 FROM patient_identifiers
                WHERE patient_identifiers.patient_id = patients.patient_id
                  AND patient_identifiers.voided = 0
                  AND patient_identifiers.identifier = ?
             )"
        );
        if !include_voided {
            sql.push_str(" AND voided = 0");
        }

        self.query_patient_set(&sql, vec![Value::Text(identifier.to_string())])
    }

    fn get_patients_by_identifier_pattern(
        &self,
        identifier: &str,
        include_voided: bool,
    ) -> RepoResult<PatientSet> {
        let pattern = self.config.identifier_pattern(identifier);
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| RepoError::InvalidPattern(err.to_string()))?;

        let mut stmt = self.conn.prepare(
            "SELECT patient_identifiers.patient_id, patient_identifiers.identifier
             FROM patient_identifiers
             JOIN patients ON patients.patient_id = patient_identifiers.patient_id
             WHERE patient_identifiers.voided = 0
               AND (?1 = 1 OR patients.voided = 0);",
        )?;
        let mut rows = stmt.query([bool_to_int(include_voided)])?;
        let mut matched_ids = BTreeSet::new();

        while let Some(row) = rows.next()? {
            let value: String = row.get(1)?;
            if matcher.is_match(&value) {
                matched_ids.insert(parse_uuid(row.get(0)?, "patient_identifiers.patient_id")?);
            }
        }

        let mut patients = PatientSet::new();
        for id in matched_ids {
            if let Some(patient) = self.get_patient(id)? {
                patients.insert(patient);
            }
        }

        Ok(patients)
    }

    fn get_patients_by_name(&self, name: &str, include_voided: bool) -> RepoResult<PatientSet> {
        let mut sql = format!("{PATIENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !push_name_filters(&mut sql, &mut bind_values, name) {
            return Ok(PatientSet::new());
        }
        if !include_voided {
            sql.push_str(" AND voided = 0");
        }

        self.query_patient_set(&sql, bind_values)
    }

    fn get_similar_patients(
        &self,
        name: &str,
        birth_year: Option<i32>,
        gender: Option<Gender>,
    ) -> RepoResult<PatientSet> {
        let mut sql = format!("{PATIENT_SELECT_SQL} WHERE voided = 0");
        let mut bind_values: Vec<Value> = Vec::new();

        if !push_name_filters(&mut sql, &mut bind_values, name) {
            return Ok(PatientSet::new());
        }

        if let Some(year) = birth_year {
            sql.push_str(
                " AND (birthdate IS NULL OR CAST(substr(birthdate, 1, 4) AS INTEGER) = ?)",
            );
            bind_values.push(Value::Integer(i64::from(year)));
        }

        if let Some(gender) = gender {
            sql.push_str(" AND (gender = 'U' OR gender = ?)");
            bind_values.push(Value::Text(gender.as_code().to_string()));
        }

        self.query_patient_set(&sql, bind_values)
    }

    fn void_patient(&self, patient: &Patient, reason: &str) -> RepoResult<()> {
        if reason.trim().is_empty() {
            return Err(PatientValidationError::MissingVoidReason.into());
        }
        self.set_void_state(patient, true, Some(reason))
    }

    fn unvoid_patient(&self, patient: &Patient) -> RepoResult<()> {
        self.set_void_state(patient, false, None)
    }

    fn delete_patient(&self, patient: &Patient) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM patients WHERE patient_id = ?1;",
            [patient.patient_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::PatientNotFound(patient.patient_id));
        }

        Ok(())
    }

    fn get_patient_identifiers(
        &self,
        identifier_type: &PatientIdentifierType,
    ) -> RepoResult<Vec<PatientIdentifier>> {
        let mut stmt = self.conn.prepare(&format!(
            "{IDENTIFIER_SELECT_SQL}
             WHERE identifier_type_id = ?1
               AND voided = 0
             ORDER BY identifier ASC, identifier_id ASC;"
        ))?;
        let mut rows = stmt.query([identifier_type.id])?;
        let mut identifiers = Vec::new();

        while let Some(row) = rows.next()? {
            identifiers.push(parse_identifier_row(row)?);
        }

        Ok(identifiers)
    }

    fn update_patient_identifier(&self, identifier: &PatientIdentifier) -> RepoResult<()> {
        if identifier.identifier.trim().is_empty() {
            return Err(PatientValidationError::BlankIdentifier.into());
        }

        let changed = self.conn.execute(
            "UPDATE patient_identifiers
             SET
                patient_id = ?1,
                identifier = ?2,
                identifier_type_id = ?3,
                location_id = ?4,
                preferred = ?5,
                voided = ?6
             WHERE identifier_id = ?7;",
            params![
                identifier.patient_id.to_string(),
                identifier.identifier.as_str(),
                identifier.identifier_type_id,
                identifier.location_id,
                bool_to_int(identifier.preferred),
                bool_to_int(identifier.voided),
                identifier.identifier_id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::IdentifierNotFound(identifier.identifier_id));
        }

        Ok(())
    }

    fn get_patient_identifier_types(&self) -> RepoResult<Vec<PatientIdentifierType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, format
             FROM patient_identifier_types
             ORDER BY name ASC;",
        )?;
        let types = stmt
            .query_map([], map_identifier_type_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(types)
    }

    fn get_patient_identifier_type(
        &self,
        id: PatientIdentifierTypeId,
    ) -> RepoResult<Option<PatientIdentifierType>> {
        let identifier_type = self
            .conn
            .query_row(
                "SELECT id, name, description, format
                 FROM patient_identifier_types
                 WHERE id = ?1;",
                [id],
                map_identifier_type_row,
            )
            .optional()?;
        Ok(identifier_type)
    }

    fn get_tribe(&self, id: TribeId) -> RepoResult<Option<Tribe>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, retired FROM tribes WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tribe_row(row)?));
        }

        Ok(None)
    }

    fn get_tribes(&self) -> RepoResult<Vec<Tribe>> {
        self.query_tribes(
            "SELECT id, name, retired FROM tribes WHERE retired = 0 ORDER BY name ASC;",
            Vec::new(),
        )
    }

    fn find_tribes(&self, search: &str) -> RepoResult<Vec<Tribe>> {
        self.query_tribes(
            "SELECT id, name, retired FROM tribes
             WHERE retired = 0
               AND name LIKE ? ESCAPE '\\'
             ORDER BY name ASC;",
            vec![Value::Text(format!("{}%", escape_like(search.trim())))],
        )
    }

    fn get_relationship(&self, id: RelationshipId) -> RepoResult<Option<Relationship>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RELATIONSHIP_SELECT_SQL} WHERE relationship_id = ?1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_relationship_row(row)?));
        }

        Ok(None)
    }

    fn get_relationships(&self) -> RepoResult<Vec<Relationship>> {
        self.query_relationships(
            &format!("{RELATIONSHIP_SELECT_SQL} WHERE voided = 0 ORDER BY relationship_id ASC;"),
            Vec::new(),
        )
    }

    fn get_relationships_for_person(&self, person: PersonId) -> RepoResult<Vec<Relationship>> {
        let person = person.to_string();
        self.query_relationships(
            &format!(
                "{RELATIONSHIP_SELECT_SQL}
                 WHERE voided = 0
                   AND (person_a = ? OR person_b = ?)
                 ORDER BY relationship_id ASC;"
            ),
            vec![Value::Text(person.clone()), Value::Text(person)],
        )
    }

    fn create_relationship(&self, relationship: &Relationship) -> RepoResult<RelationshipId> {
        self.conn.execute(
            "INSERT INTO relationships (
                relationship_id,
                person_a,
                relationship_type_id,
                person_b,
                voided
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                relationship.relationship_id.to_string(),
                relationship.person_a.to_string(),
                relationship.relationship_type_id,
                relationship.person_b.to_string(),
                bool_to_int(relationship.voided),
            ],
        )?;
        Ok(relationship.relationship_id)
    }

    fn get_relationship_types(&self) -> RepoResult<Vec<RelationshipType>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description FROM relationship_types ORDER BY name ASC;",
        )?;
        let types = stmt
            .query_map([], map_relationship_type_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(types)
    }

    fn get_relationship_type(
        &self,
        id: RelationshipTypeId,
    ) -> RepoResult<Option<RelationshipType>> {
        let relationship_type = self
            .conn
            .query_row(
                "SELECT id, name, description FROM relationship_types WHERE id = ?1;",
                [id],
                map_relationship_type_row,
            )
            .optional()?;
        Ok(relationship_type)
    }

    fn get_locations(&self) -> RepoResult<Vec<Location>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM locations ORDER BY name ASC;")?;
        let locations = stmt
            .query_map([], map_location_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(locations)
    }

    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>> {
        let location = self
            .conn
            .query_row(
                "SELECT id, name, description FROM locations WHERE id = ?1;",
                [id],
                map_location_row,
            )
            .optional()?;
        Ok(location)
    }
}

impl SqlitePatientRepository<'_> {
    fn query_tribes(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Tribe>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tribes = Vec::new();

        while let Some(row) = rows.next()? {
            tribes.push(parse_tribe_row(row)?);
        }

        Ok(tribes)
    }

    fn query_relationships(
        &self,
        sql: &str,
        bind_values: Vec<Value>,
    ) -> RepoResult<Vec<Relationship>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut relationships = Vec::new();

        while let Some(row) = rows.next()? {
            relationships.push(parse_relationship_row(row)?);
        }

        Ok(relationships)
    }
}

/// Appends one prefix filter per whitespace-separated token.
///
/// Returns `false` when `name` has no tokens.
fn push_name_filters(sql: &mut String, bind_values: &mut Vec<Value>, name: &str) -> bool {
    let mut has_tokens = false;
    for token in name.split_whitespace() {
        has_tokens = true;
        sql.push_str(NAME_TOKEN_FILTER_SQL);
        let pattern = format!("{}%", escape_like(token));
        for _ in 0..3 {
            bind_values.push(Value::Text(pattern.clone()));
        }
    }
    has_tokens
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn insert_identifiers(tx: &Transaction<'_>, patient: &Patient) -> RepoResult<()> {
    for identifier in &patient.identifiers {
        tx.execute(
            "INSERT INTO patient_identifiers (
                identifier_id,
                patient_id,
                identifier,
                identifier_type_id,
                location_id,
                preferred,
                voided
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                identifier.identifier_id.to_string(),
                patient.patient_id.to_string(),
                identifier.identifier.as_str(),
                identifier.identifier_type_id,
                identifier.location_id,
                bool_to_int(identifier.preferred),
                bool_to_int(identifier.voided),
            ],
        )?;
    }
    Ok(())
}

fn load_identifiers(
    conn: &Connection,
    patient_id: PatientId,
) -> RepoResult<Vec<PatientIdentifier>> {
    let mut stmt = conn.prepare(&format!(
        "{IDENTIFIER_SELECT_SQL}
         WHERE patient_id = ?1
         ORDER BY preferred DESC, identifier ASC, identifier_id ASC;"
    ))?;
    let mut rows = stmt.query([patient_id.to_string()])?;
    let mut identifiers = Vec::new();

    while let Some(row) = rows.next()? {
        identifiers.push(parse_identifier_row(row)?);
    }

    Ok(identifiers)
}

fn parse_patient_row(row: &Row<'_>) -> RepoResult<Patient> {
    let patient_id = parse_uuid(row.get("patient_id")?, "patients.patient_id")?;

    let gender_code: String = row.get("gender")?;
    let gender = Gender::from_code(&gender_code).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid gender `{gender_code}` in patients.gender"))
    })?;

    let name = PersonName {
        given_name: row.get("given_name")?,
        middle_name: row.get("middle_name")?,
        family_name: row.get("family_name")?,
    };

    Ok(Patient {
        patient_id,
        name,
        gender,
        birthdate: row.get("birthdate")?,
        tribe_id: row.get("tribe_id")?,
        identifiers: Vec::new(),
        voided: int_to_bool(row.get("voided")?, "patients.voided")?,
        void_reason: row.get("void_reason")?,
    })
}

fn parse_identifier_row(row: &Row<'_>) -> RepoResult<PatientIdentifier> {
    Ok(PatientIdentifier {
        identifier_id: parse_uuid(
            row.get("identifier_id")?,
            "patient_identifiers.identifier_id",
        )?,
        patient_id: parse_uuid(row.get("patient_id")?, "patient_identifiers.patient_id")?,
        identifier: row.get("identifier")?,
        identifier_type_id: row.get("identifier_type_id")?,
        location_id: row.get("location_id")?,
        preferred: int_to_bool(row.get("preferred")?, "patient_identifiers.preferred")?,
        voided: int_to_bool(row.get("voided")?, "patient_identifiers.voided")?,
    })
}

fn parse_relationship_row(row: &Row<'_>) -> RepoResult<Relationship> {
    Ok(Relationship {
        relationship_id: parse_uuid(
            row.get("relationship_id")?,
            "relationships.relationship_id",
        )?,
        person_a: parse_uuid(row.get("person_a")?, "relationships.person_a")?,
        relationship_type_id: row.get("relationship_type_id")?,
        person_b: parse_uuid(row.get("person_b")?, "relationships.person_b")?,
        voided: int_to_bool(row.get("voided")?, "relationships.voided")?,
    })
}

fn parse_tribe_row(row: &Row<'_>) -> RepoResult<Tribe> {
    Ok(Tribe {
        id: row.get("id")?,
        name: row.get("name")?,
        retired: int_to_bool(row.get("retired")?, "tribes.retired")?,
    })
}

fn map_identifier_type_row(row: &Row<'_>) -> rusqlite::Result<PatientIdentifierType> {
    Ok(PatientIdentifierType {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        format: row.get("format")?,
    })
}

fn map_relationship_type_row(row: &Row<'_>) -> rusqlite::Result<RelationshipType> {
    Ok(RelationshipType {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn map_location_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
    })
}

fn parse_uuid(text: String, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
