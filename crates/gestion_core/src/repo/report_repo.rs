//! Read-only reporting projections over the company hierarchy.
//!
//! # Responsibility
//! - Answer the two presentation queries the shell needs without going
//!   through the generic CRUD contract.
//!
//! # Invariants
//! - Queries never write and never open a write transaction.
//! - Headcounts include departments with zero employees.
//! - Result ordering is deterministic.

use crate::model::company::CompanyId;
use crate::model::department::DepartmentId;
use crate::repo::RepoResult;
use rusqlite::Connection;
use serde::Serialize;

/// Name and job title of one employee in a department listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeSummary {
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
}

/// Employee count for one department of a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentHeadcount {
    pub department_id: DepartmentId,
    pub name: String,
    pub employees: u32,
}

pub trait ReportRepository {
    /// Employees whose department is `department_id`, ordered by last name,
    /// first name, then dni. Empty for unknown departments.
    fn employees_in_department(
        &self,
        department_id: DepartmentId,
    ) -> RepoResult<Vec<EmployeeSummary>>;
    /// Every department of `company_id` with its employee count, ordered by
    /// department id. Empty for unknown companies.
    fn department_headcounts(&self, company_id: CompanyId)
        -> RepoResult<Vec<DepartmentHeadcount>>;
}

/// SQLite-backed reporting queries.
pub struct SqliteReportRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReportRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReportRepository for SqliteReportRepository<'_> {
    fn employees_in_department(
        &self,
        department_id: DepartmentId,
    ) -> RepoResult<Vec<EmployeeSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT first_name, last_name, job_title
             FROM employees
             WHERE department_id = ?1
             ORDER BY last_name ASC, first_name ASC, dni ASC;",
        )?;
        let rows = stmt.query_map([department_id], |row| {
            Ok(EmployeeSummary {
                first_name: row.get(0)?,
                last_name: row.get(1)?,
                job_title: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn department_headcounts(
        &self,
        company_id: CompanyId,
    ) -> RepoResult<Vec<DepartmentHeadcount>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.name, COUNT(e.dni)
             FROM departments d
             LEFT JOIN employees e ON e.department_id = d.id
             WHERE d.company_id = ?1
             GROUP BY d.id, d.name
             ORDER BY d.id ASC;",
        )?;
        let rows = stmt.query_map([company_id], |row| {
            Ok(DepartmentHeadcount {
                department_id: row.get(0)?,
                name: row.get(1)?,
                employees: row.get(2)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
