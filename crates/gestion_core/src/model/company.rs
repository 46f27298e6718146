//! Company record.

use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-generated company identifier.
pub type CompanyId = i64;

/// Top of the ownership hierarchy; owns zero or more departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// `None` until the store assigns an id on create.
    pub id: Option<CompanyId>,
    pub name: String,
    pub industry: String,
}

impl Company {
    /// Creates an unsaved company.
    pub fn new(name: impl Into<String>, industry: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            industry: industry.into(),
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    /// - `BlankField` when `name` or `industry` is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("company", "name", &self.name)?;
        require_text("company", "industry", &self.industry)?;
        Ok(())
    }
}
