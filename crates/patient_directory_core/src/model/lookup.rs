//! Reference lookup entities: tribes and locations.

use serde::{Deserialize, Serialize};

pub type TribeId = i64;
pub type LocationId = i64;

/// Tribe lookup row. Retired tribes stay readable by id but drop out of lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribe {
    pub id: TribeId,
    pub name: String,
    pub retired: bool,
}

/// Facility or place where care happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub description: Option<String>,
}
