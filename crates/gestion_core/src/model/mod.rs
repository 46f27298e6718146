//! Domain model for the company/department/employee hierarchy.
//!
//! # Responsibility
//! - Define the three record types and their parent references.
//! - Provide field-level validation shared by every write path.
//!
//! # Invariants
//! - Companies and departments are identified by store-generated integers.
//! - Employees are identified by their caller-supplied national id (`dni`).
//! - Every department points at one company; every employee at one
//!   department. Ownership is expressed only through these references.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod company;
pub mod department;
pub mod employee;

/// Field validation failure detected before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace only.
    BlankField {
        entity: &'static str,
        field: &'static str,
    },
    /// Key field starts or ends with whitespace.
    PaddedKey {
        entity: &'static str,
        field: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { entity, field } => {
                write!(f, "{entity}.{field} must not be blank")
            }
            Self::PaddedKey { entity, field } => {
                write!(f, "{entity}.{field} must not start or end with whitespace")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}

/// Like `require_text`, and the value must already be trimmed so that one
/// key cannot be stored under several spellings.
pub(crate) fn require_key(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    require_text(entity, field, value)?;
    if value.trim() != value {
        return Err(ValidationError::PaddedKey { entity, field });
    }
    Ok(())
}
