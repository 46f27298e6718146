//! Entity descriptors consumed by the generic repository.
//!
//! # Responsibility
//! - Describe, per entity type, its table, key column, key strategy,
//!   column mapping, parent reference and owned children.
//! - Keep the descriptor static so the generic engine never dispatches on
//!   runtime type information.
//!
//! # Invariants
//! - `COLUMNS` order matches `column_values` order.
//! - `OWNED` lists every table whose rows reference this entity; the
//!   cascade in `integrity` relies on it being complete.

use crate::model::company::{Company, CompanyId};
use crate::model::department::{Department, DepartmentId};
use crate::model::employee::{Employee, EmployeeId};
use crate::model::ValidationError;
use rusqlite::types::{FromSql, ToSql, Value};
use rusqlite::Row;
use std::fmt::{Debug, Display};

/// How an entity obtains its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// Assigned by the store on insert; must be empty on create.
    Generated,
    /// Supplied by the caller and checked for uniqueness on create.
    Natural,
}

/// Parent row a child must point at when written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub entity: &'static str,
    pub table: &'static str,
    pub id_column: &'static str,
    pub id: i64,
}

/// Child table owned by a parent through a foreign key.
#[derive(Debug)]
pub struct OwnedRelation {
    pub child_table: &'static str,
    pub child_id_column: &'static str,
    /// Column in `child_table` holding the parent id.
    pub foreign_key: &'static str,
    /// Relations owned in turn by the child rows.
    pub owned: &'static [OwnedRelation],
}

/// Static description of one persisted record type.
pub trait Entity: Sized {
    type Id: ToSql + FromSql + Into<Value> + Clone + Debug + Display;

    /// Lowercase singular name used in errors and log events.
    const NAME: &'static str;
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
    const ID_STRATEGY: IdStrategy;
    /// Non-key columns, in `column_values` order.
    const COLUMNS: &'static [&'static str];
    const OWNED: &'static [OwnedRelation] = &[];

    /// Current identifier, `None` for an unsaved generated-key entity.
    fn id(&self) -> Option<Self::Id>;
    fn validate(&self) -> Result<(), ValidationError>;
    fn column_values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    fn parent(&self) -> Option<ParentRef> {
        None
    }
}

const DEPARTMENT_OWNED: &[OwnedRelation] = &[OwnedRelation {
    child_table: "employees",
    child_id_column: "dni",
    foreign_key: "department_id",
    owned: &[],
}];

const COMPANY_OWNED: &[OwnedRelation] = &[OwnedRelation {
    child_table: "departments",
    child_id_column: "id",
    foreign_key: "company_id",
    owned: DEPARTMENT_OWNED,
}];

impl Entity for Company {
    type Id = CompanyId;

    const NAME: &'static str = "company";
    const TABLE: &'static str = "companies";
    const ID_COLUMN: &'static str = "id";
    const ID_STRATEGY: IdStrategy = IdStrategy::Generated;
    const COLUMNS: &'static [&'static str] = &["name", "industry"];
    const OWNED: &'static [OwnedRelation] = COMPANY_OWNED;

    fn id(&self) -> Option<CompanyId> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Company::validate(self)
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.industry.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            industry: row.get("industry")?,
        })
    }
}

impl Entity for Department {
    type Id = DepartmentId;

    const NAME: &'static str = "department";
    const TABLE: &'static str = "departments";
    const ID_COLUMN: &'static str = "id";
    const ID_STRATEGY: IdStrategy = IdStrategy::Generated;
    const COLUMNS: &'static [&'static str] = &["name", "company_id"];
    const OWNED: &'static [OwnedRelation] = DEPARTMENT_OWNED;

    fn id(&self) -> Option<DepartmentId> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Department::validate(self)
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Integer(self.company_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            company_id: row.get("company_id")?,
        })
    }

    fn parent(&self) -> Option<ParentRef> {
        Some(ParentRef {
            entity: Company::NAME,
            table: Company::TABLE,
            id_column: Company::ID_COLUMN,
            id: self.company_id,
        })
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    const NAME: &'static str = "employee";
    const TABLE: &'static str = "employees";
    const ID_COLUMN: &'static str = "dni";
    const ID_STRATEGY: IdStrategy = IdStrategy::Natural;
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "job_title", "department_id"];

    fn id(&self) -> Option<EmployeeId> {
        Some(self.dni.clone())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Employee::validate(self)
    }

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.first_name.clone()),
            Value::Text(self.last_name.clone()),
            Value::Text(self.job_title.clone()),
            Value::Integer(self.department_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            dni: row.get("dni")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            job_title: row.get("job_title")?,
            department_id: row.get("department_id")?,
        })
    }

    fn parent(&self) -> Option<ParentRef> {
        Some(ParentRef {
            entity: Department::NAME,
            table: Department::TABLE,
            id_column: Department::ID_COLUMN,
            id: self.department_id,
        })
    }
}
