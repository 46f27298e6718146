//! Repository layer: generic CRUD engine, integrity rules and read-only
//! reporting projections.
//!
//! # Responsibility
//! - Define one CRUD contract shared by every entity type.
//! - Keep SQL details, transaction scoping and cascade policy inside the
//!   persistence boundary.
//!
//! # Invariants
//! - Every mutating call runs in its own scoped transaction; a failure
//!   drops the transaction uncommitted, which rolls it back.
//! - Validation and reference errors are raised before any write.
//! - Deleting an absent id is a no-op.

use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entity;
pub mod integrity;
pub mod report_repo;
pub mod sqlite_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Coarse error category exposed to callers that only need to pick a
/// user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ReferenceNotFound,
    ConstraintViolation,
    StoreFailure,
}

/// Reason a write was refused by a field or uniqueness rule.
#[derive(Debug)]
pub enum ConstraintViolation {
    /// A required field is missing or blank.
    Invalid(ValidationError),
    /// Natural key already in use.
    DuplicateKey { entity: &'static str, id: String },
    /// Store-generated id was supplied on create.
    IdAlreadyAssigned { entity: &'static str },
    /// Update of an entity that was never persisted.
    MissingId { entity: &'static str },
    /// Constraint rejected by the store itself.
    Rejected(String),
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::DuplicateKey { entity, id } => write!(f, "{entity} `{id}` already exists"),
            Self::IdAlreadyAssigned { entity } => {
                write!(f, "{entity} id is assigned by the store and must be empty on create")
            }
            Self::MissingId { entity } => write!(f, "{entity} has no id; create it first"),
            Self::Rejected(message) => write!(f, "store rejected write: {message}"),
        }
    }
}

/// Repository error for CRUD, integrity and reporting operations.
#[derive(Debug)]
pub enum RepoError {
    /// Update target does not exist.
    NotFound { entity: &'static str, id: String },
    /// Supplied parent reference does not exist.
    ReferenceNotFound { entity: &'static str, id: String },
    ConstraintViolation(ConstraintViolation),
    /// Store unreachable or transaction could not complete.
    StoreFailure(DbError),
    /// Persisted row cannot be converted to a valid entity.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Maps this error onto the four caller-visible categories.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ReferenceNotFound { .. } => ErrorKind::ReferenceNotFound,
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::StoreFailure(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => ErrorKind::StoreFailure,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ReferenceNotFound { entity, id } => {
                write!(f, "referenced {entity} not found: {id}")
            }
            Self::ConstraintViolation(violation) => write!(f, "{violation}"),
            Self::StoreFailure(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConstraintViolation(ConstraintViolation::Invalid(err)) => Some(err),
            Self::StoreFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::ConstraintViolation(ConstraintViolation::Invalid(value))
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::StoreFailure(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        // Only schema-level constraints count as violations; trigger aborts,
        // busy/locked and I/O errors stay store failures.
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = value {
            if matches!(
                failure.extended_code,
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY
                    | ffi::SQLITE_CONSTRAINT_UNIQUE
                    | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    | ffi::SQLITE_CONSTRAINT_NOTNULL
                    | ffi::SQLITE_CONSTRAINT_CHECK
            ) {
                let message = message.clone().unwrap_or_else(|| failure.to_string());
                return Self::ConstraintViolation(ConstraintViolation::Rejected(message));
            }
        }
        Self::StoreFailure(DbError::Sqlite(value))
    }
}
