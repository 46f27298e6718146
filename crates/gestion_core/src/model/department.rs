//! Department record.

use super::company::CompanyId;
use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-generated department identifier.
pub type DepartmentId = i64;

/// A department belongs to exactly one company and owns its employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// `None` until the store assigns an id on create.
    pub id: Option<DepartmentId>,
    pub name: String,
    /// Owning company. Must reference an existing row at commit time.
    pub company_id: CompanyId,
}

impl Department {
    /// Creates an unsaved department owned by `company_id`.
    pub fn new(name: impl Into<String>, company_id: CompanyId) -> Self {
        Self {
            id: None,
            name: name.into(),
            company_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("department", "name", &self.name)
    }
}
