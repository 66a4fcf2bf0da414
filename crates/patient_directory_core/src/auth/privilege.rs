//! Privilege declarations checked before directory operations.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Named capability granted to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Privilege {
    AddPatients,
    ViewPatients,
    EditPatients,
    DeletePatients,
    ManageRelationships,
}

impl Privilege {
    /// Every privilege known to the directory, in declaration order.
    pub const ALL: [Privilege; 5] = [
        Self::AddPatients,
        Self::ViewPatients,
        Self::EditPatients,
        Self::DeletePatients,
        Self::ManageRelationships,
    ];

    /// Stable privilege name as stored in role grants.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddPatients => PRIV_ADD_PATIENTS,
            Self::ViewPatients => PRIV_VIEW_PATIENTS,
            Self::EditPatients => PRIV_EDIT_PATIENTS,
            Self::DeletePatients => PRIV_DELETE_PATIENTS,
            Self::ManageRelationships => PRIV_MANAGE_RELATIONSHIPS,
        }
    }

    /// User-facing short description.
    pub fn description(self) -> &'static str {
        match self {
            Self::AddPatients => "Allow registering new patient records.",
            Self::ViewPatients => "Allow reading and searching patient records.",
            Self::EditPatients => "Allow editing, voiding and unvoiding patient records.",
            Self::DeletePatients => "Allow permanently deleting patient records.",
            Self::ManageRelationships => "Allow viewing and recording relationships between persons.",
        }
    }
}

impl Display for Privilege {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const PRIV_ADD_PATIENTS: &str = "Add Patients";
pub const PRIV_VIEW_PATIENTS: &str = "View Patients";
pub const PRIV_EDIT_PATIENTS: &str = "Edit Patients";
pub const PRIV_DELETE_PATIENTS: &str = "Delete Patients";
pub const PRIV_MANAGE_RELATIONSHIPS: &str = "Manage Relationships";

/// Parses one privilege from its stable name.
///
/// Matching is exact after trimming surrounding whitespace.
pub fn parse_privilege(value: &str) -> Result<Privilege, PrivilegeParseError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(PrivilegeParseError::EmptyPrivilege);
    }

    Privilege::ALL
        .into_iter()
        .find(|privilege| privilege.as_str() == normalized)
        .ok_or_else(|| PrivilegeParseError::UnknownPrivilege(normalized.to_string()))
}

/// Privilege parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeParseError {
    EmptyPrivilege,
    UnknownPrivilege(String),
}

impl Display for PrivilegeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPrivilege => write!(f, "privilege name must not be empty"),
            Self::UnknownPrivilege(value) => write!(f, "privilege is unknown: {value}"),
        }
    }
}

impl Error for PrivilegeParseError {}
