//! Person-to-person relationships.

use crate::model::patient::PersonId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RelationshipId = Uuid;
pub type RelationshipTypeId = i64;

/// Kind of link between two persons (e.g. `Parent/Child`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipType {
    pub id: RelationshipTypeId,
    pub name: String,
    pub description: Option<String>,
}

/// Typed link from `person_a` to `person_b`.
///
/// Symmetric types are stored once; lookups by person match either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship_id: RelationshipId,
    pub person_a: PersonId,
    pub relationship_type_id: RelationshipTypeId,
    pub person_b: PersonId,
    pub voided: bool,
}

impl Relationship {
    pub fn new(
        person_a: PersonId,
        relationship_type_id: RelationshipTypeId,
        person_b: PersonId,
    ) -> Self {
        Self {
            relationship_id: Uuid::new_v4(),
            person_a,
            relationship_type_id,
            person_b,
            voided: false,
        }
    }

    /// Returns whether `person` is on either side of this relationship.
    pub fn involves(&self, person: PersonId) -> bool {
        self.person_a == person || self.person_b == person
    }
}
