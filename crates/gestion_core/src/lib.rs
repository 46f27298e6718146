//! Core persistence for the company/department/employee directory.
//! This crate is the single source of truth for ownership invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::company::{Company, CompanyId};
pub use model::department::{Department, DepartmentId};
pub use model::employee::{Employee, EmployeeId};
pub use model::ValidationError;
pub use repo::entity::{Entity, IdStrategy, OwnedRelation, ParentRef};
pub use repo::report_repo::{
    DepartmentHeadcount, EmployeeSummary, ReportRepository, SqliteReportRepository,
};
pub use repo::sqlite_repo::{Repository, SqliteRepository};
pub use repo::{ConstraintViolation, ErrorKind, RepoError, RepoResult};

pub type CompanyRepository<'conn> = SqliteRepository<'conn, Company>;
pub type DepartmentRepository<'conn> = SqliteRepository<'conn, Department>;
pub type EmployeeRepository<'conn> = SqliteRepository<'conn, Employee>;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
