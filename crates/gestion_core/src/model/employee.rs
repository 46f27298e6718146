//! Employee record keyed by national identity number.
//!
//! # Invariants
//! - `dni` is supplied by the caller, never regenerated, and unique across
//!   the whole store.
//! - Moving an employee is a plain `department_id` change; there is no
//!   separate detach step.

use super::department::DepartmentId;
use super::{require_key, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Natural key: national identity number.
pub type EmployeeId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub dni: EmployeeId,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    /// Owning department. Must reference an existing row at commit time.
    pub department_id: DepartmentId,
}

impl Employee {
    pub fn new(
        dni: impl Into<EmployeeId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        job_title: impl Into<String>,
        department_id: DepartmentId,
    ) -> Self {
        Self {
            dni: dni.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            job_title: job_title.into(),
            department_id,
        }
    }

    /// Checks that the natural key is present and trimmed and that all name
    /// fields are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_key("employee", "dni", &self.dni)?;
        require_text("employee", "first_name", &self.first_name)?;
        require_text("employee", "last_name", &self.last_name)?;
        require_text("employee", "job_title", &self.job_title)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Employee;
    use crate::model::ValidationError;

    #[test]
    fn blank_dni_is_rejected_first() {
        let employee = Employee::new("", "", "Ruiz", "Clerk", 1);
        assert_eq!(
            employee.validate(),
            Err(ValidationError::BlankField {
                entity: "employee",
                field: "dni"
            })
        );
    }

    #[test]
    fn dni_with_surrounding_whitespace_is_rejected() {
        for dni in [" 12345678", "12345678 ", "\t12345678\n"] {
            let employee = Employee::new(dni, "Ana", "Ruiz", "Clerk", 1);
            assert_eq!(
                employee.validate(),
                Err(ValidationError::PaddedKey {
                    entity: "employee",
                    field: "dni"
                })
            );
        }
    }

    #[test]
    fn complete_employee_is_valid() {
        let employee = Employee::new("12345678", "Ana", "Ruiz", "Clerk", 1);
        assert!(employee.validate().is_ok());
    }
}
