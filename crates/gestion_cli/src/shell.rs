//! Menu-driven console over the core repositories.
//!
//! # Invariants
//! - The shell holds no entity state between prompts; every action reads
//!   from and writes through the repositories.
//! - Errors are reported by kind; SQL text and file paths never reach the
//!   output.
//! - End of input exits the shell cleanly from any prompt.

use gestion_core::{
    Company, CompanyId, CompanyRepository, ConstraintViolation, Department, DepartmentId,
    DepartmentRepository, Employee, EmployeeRepository, RepoError, RepoResult, ReportRepository,
    Repository, SqliteReportRepository,
};
use log::warn;
use rusqlite::Connection;
use std::io::{self, BufRead, Write};

const RULE: &str = "----------------------------------------";

pub struct Shell<'conn, R, W> {
    companies: CompanyRepository<'conn>,
    departments: DepartmentRepository<'conn>,
    employees: EmployeeRepository<'conn>,
    reports: SqliteReportRepository<'conn>,
    input: R,
    output: W,
}

impl<'conn, R: BufRead, W: Write> Shell<'conn, R, W> {
    pub fn try_new(conn: &'conn Connection, input: R, output: W) -> RepoResult<Self> {
        Ok(Self {
            companies: CompanyRepository::try_new(conn)?,
            departments: DepartmentRepository::try_new(conn)?,
            employees: EmployeeRepository::try_new(conn)?,
            reports: SqliteReportRepository::new(conn),
            input,
            output,
        })
    }

    /// Runs the main menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        match self.main_menu() {
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                writeln!(self.output)?;
                Ok(())
            }
            other => other,
        }
    }

    fn main_menu(&mut self) -> io::Result<()> {
        loop {
            let choice = self.menu("Main menu", &["Companies", "Departments", "Employees", "Exit"])?;
            match choice {
                1 => self.company_menu()?,
                2 => self.department_menu()?,
                3 => self.employee_menu()?,
                _ => {
                    writeln!(self.output, "Goodbye.")?;
                    return Ok(());
                }
            }
        }
    }

    fn company_menu(&mut self) -> io::Result<()> {
        loop {
            let choice = self.menu(
                "Companies",
                &[
                    "Create",
                    "Read",
                    "Update",
                    "Delete",
                    "List",
                    "Departments and headcount",
                    "Back",
                ],
            )?;
            match choice {
                1 => self.create_company()?,
                2 => self.read_company()?,
                3 => self.update_company()?,
                4 => self.delete_company()?,
                5 => self.list_companies()?,
                6 => self.company_headcounts()?,
                _ => return Ok(()),
            }
        }
    }

    fn department_menu(&mut self) -> io::Result<()> {
        loop {
            let choice = self.menu(
                "Departments",
                &[
                    "Create",
                    "Read",
                    "Update",
                    "Delete",
                    "List",
                    "Employees of a department",
                    "Back",
                ],
            )?;
            match choice {
                1 => self.create_department()?,
                2 => self.read_department()?,
                3 => self.update_department()?,
                4 => self.delete_department()?,
                5 => self.list_departments()?,
                6 => self.department_employees()?,
                _ => return Ok(()),
            }
        }
    }

    fn employee_menu(&mut self) -> io::Result<()> {
        loop {
            let choice = self.menu(
                "Employees",
                &["Create", "Read", "Update", "Delete", "List", "Back"],
            )?;
            match choice {
                1 => self.create_employee()?,
                2 => self.read_employee()?,
                3 => self.update_employee()?,
                4 => self.delete_employee()?,
                5 => self.list_employees()?,
                _ => return Ok(()),
            }
        }
    }

    fn create_company(&mut self) -> io::Result<()> {
        let name = self.prompt("Company name")?;
        let industry = self.prompt("Industry")?;
        let outcome = self.companies.create(&Company::new(name, industry));
        self.report(outcome, |id| format!("Company created with id {id}."))
    }

    fn read_company(&mut self) -> io::Result<()> {
        let id = self.prompt_id("Company id")?;
        let outcome = self.companies.read(&id);
        self.report(outcome, |found| match found {
            Some(company) => format_company(&company),
            None => format!("Company {id} not found."),
        })
    }

    fn update_company(&mut self) -> io::Result<()> {
        let id: CompanyId = self.prompt_id("Company id to update")?;
        let Some(current) = self.found(self.companies.read(&id), "Company", id)? else {
            return Ok(());
        };
        let name = self.prompt_or_keep("New name", &current.name)?;
        let industry = self.prompt_or_keep("New industry", &current.industry)?;
        let outcome = self.companies.update(&Company {
            id: Some(id),
            name,
            industry,
        });
        self.report(outcome, |()| "Company updated.".to_string())
    }

    fn delete_company(&mut self) -> io::Result<()> {
        let id: CompanyId = self.prompt_id("Company id to delete")?;
        let outcome = self.companies.delete(&id);
        self.report(outcome, |()| {
            "Company deleted together with its departments and employees.".to_string()
        })
    }

    fn list_companies(&mut self) -> io::Result<()> {
        let outcome = self.companies.list();
        self.report(outcome, |companies| {
            render_list(companies.iter().map(format_company), "No companies registered.")
        })
    }

    fn company_headcounts(&mut self) -> io::Result<()> {
        let id: CompanyId = self.prompt_id("Company id")?;
        let outcome = self.reports.department_headcounts(id);
        self.report(outcome, |rows| {
            render_list(
                rows.iter()
                    .map(|row| format!("- {} (employees: {})", row.name, row.employees)),
                "The company has no departments or does not exist.",
            )
        })
    }

    fn create_department(&mut self) -> io::Result<()> {
        let name = self.prompt("Department name")?;
        let company_id: CompanyId = self.prompt_id("Owning company id")?;
        let outcome = self.departments.create(&Department::new(name, company_id));
        self.report(outcome, |id| format!("Department created with id {id}."))
    }

    fn read_department(&mut self) -> io::Result<()> {
        let id: DepartmentId = self.prompt_id("Department id")?;
        let outcome = self.departments.read(&id);
        self.report(outcome, |found| match found {
            Some(department) => format_department(&department),
            None => format!("Department {id} not found."),
        })
    }

    fn update_department(&mut self) -> io::Result<()> {
        let id: DepartmentId = self.prompt_id("Department id to update")?;
        let Some(current) = self.found(self.departments.read(&id), "Department", id)? else {
            return Ok(());
        };
        let name = self.prompt_or_keep("New name", &current.name)?;
        let company_id = self.prompt_id_or_keep("New company id", current.company_id)?;
        let outcome = self.departments.update(&Department {
            id: Some(id),
            name,
            company_id,
        });
        self.report(outcome, |()| "Department updated.".to_string())
    }

    fn delete_department(&mut self) -> io::Result<()> {
        let id: DepartmentId = self.prompt_id("Department id to delete")?;
        let outcome = self.departments.delete(&id);
        self.report(outcome, |()| {
            "Department deleted together with its employees.".to_string()
        })
    }

    fn list_departments(&mut self) -> io::Result<()> {
        let outcome = self.departments.list();
        self.report(outcome, |departments| {
            render_list(
                departments.iter().map(format_department),
                "No departments registered.",
            )
        })
    }

    fn department_employees(&mut self) -> io::Result<()> {
        let id: DepartmentId = self.prompt_id("Department id")?;
        let outcome = self.reports.employees_in_department(id);
        self.report(outcome, |rows| {
            render_list(
                rows.iter().map(|row| {
                    format!(
                        "- {} {}, {}",
                        row.first_name, row.last_name, row.job_title
                    )
                }),
                "No employees assigned to this department.",
            )
        })
    }

    fn create_employee(&mut self) -> io::Result<()> {
        let dni = self.prompt("National id (DNI)")?;
        match self.employees.exists(&dni) {
            Ok(true) => {
                writeln!(self.output, "An employee with DNI {dni} is already registered.")?;
                return Ok(());
            }
            Ok(false) => {}
            Err(err) => return self.report_error(&err),
        }
        let first_name = self.prompt("First name")?;
        let last_name = self.prompt("Last name")?;
        let job_title = self.prompt("Job title")?;
        let department_id: DepartmentId = self.prompt_id("Department id")?;
        let outcome = self.employees.create(&Employee::new(
            dni,
            first_name,
            last_name,
            job_title,
            department_id,
        ));
        self.report(outcome, |dni| format!("Employee {dni} created."))
    }

    fn read_employee(&mut self) -> io::Result<()> {
        let dni = self.prompt("National id (DNI)")?;
        let outcome = self.employees.read(&dni);
        self.report(outcome, |found| match found {
            Some(employee) => format_employee(&employee),
            None => format!("Employee {dni} not found."),
        })
    }

    fn update_employee(&mut self) -> io::Result<()> {
        let dni = self.prompt("National id (DNI) to update")?;
        let Some(current) = self.found(self.employees.read(&dni), "Employee", &dni)? else {
            return Ok(());
        };
        let first_name = self.prompt_or_keep("New first name", &current.first_name)?;
        let last_name = self.prompt_or_keep("New last name", &current.last_name)?;
        let job_title = self.prompt_or_keep("New job title", &current.job_title)?;
        let department_id =
            self.prompt_id_or_keep("New department id", current.department_id)?;
        let outcome = self.employees.update(&Employee {
            dni,
            first_name,
            last_name,
            job_title,
            department_id,
        });
        self.report(outcome, |()| "Employee updated.".to_string())
    }

    fn delete_employee(&mut self) -> io::Result<()> {
        let dni = self.prompt("National id (DNI) to delete")?;
        let outcome = self.employees.delete(&dni);
        self.report(outcome, |()| "Employee deleted.".to_string())
    }

    fn list_employees(&mut self) -> io::Result<()> {
        let outcome = self.employees.list();
        self.report(outcome, |employees| {
            render_list(employees.iter().map(format_employee), "No employees registered.")
        })
    }

    fn menu(&mut self, title: &str, options: &[&str]) -> io::Result<usize> {
        writeln!(self.output, "\n{RULE}\n{title}\n{RULE}")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {option}", index + 1)?;
        }
        loop {
            let choice: usize = self.prompt_id("Select an option")?;
            if (1..=options.len()).contains(&choice) {
                return Ok(choice);
            }
            writeln!(self.output, "Invalid option.")?;
        }
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        Ok(line.trim().to_string())
    }

    fn prompt(&mut self, label: &str) -> io::Result<String> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        self.read_line()
    }

    fn prompt_or_keep(&mut self, label: &str, current: &str) -> io::Result<String> {
        let value = self.prompt(&format!("{label} [{current}]"))?;
        Ok(if value.is_empty() {
            current.to_string()
        } else {
            value
        })
    }

    /// Re-prompts until the answer parses as `T`.
    fn prompt_id<T: std::str::FromStr>(&mut self, label: &str) -> io::Result<T> {
        loop {
            match self.prompt(label)?.parse() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }

    fn prompt_id_or_keep(&mut self, label: &str, current: i64) -> io::Result<i64> {
        loop {
            let value = self.prompt(&format!("{label} [{current}]"))?;
            if value.is_empty() {
                return Ok(current);
            }
            match value.parse() {
                Ok(parsed) => return Ok(parsed),
                Err(_) => writeln!(self.output, "Please enter a whole number.")?,
            }
        }
    }

    /// Unwraps a lookup, printing a not-found or error message otherwise.
    fn found<T>(
        &mut self,
        lookup: RepoResult<Option<T>>,
        label: &str,
        id: impl std::fmt::Display,
    ) -> io::Result<Option<T>> {
        match lookup {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => {
                writeln!(self.output, "{label} {id} not found.")?;
                Ok(None)
            }
            Err(err) => {
                self.report_error(&err)?;
                Ok(None)
            }
        }
    }

    fn report<T>(
        &mut self,
        outcome: RepoResult<T>,
        render: impl FnOnce(T) -> String,
    ) -> io::Result<()> {
        match outcome {
            Ok(value) => writeln!(self.output, "{}", render(value)),
            Err(err) => self.report_error(&err),
        }
    }

    fn report_error(&mut self, err: &RepoError) -> io::Result<()> {
        warn!(
            "event=shell_action module=cli status=error error_kind={:?}",
            err.kind()
        );
        writeln!(self.output, "{}", describe_error(err))
    }
}

fn describe_error(err: &RepoError) -> String {
    match err {
        RepoError::NotFound { entity, id } => format!("Not found: {entity} {id}."),
        RepoError::ReferenceNotFound { entity, id } => {
            format!("Referenced {entity} {id} does not exist; nothing was saved.")
        }
        RepoError::ConstraintViolation(ConstraintViolation::Invalid(reason)) => {
            format!("Invalid input: {reason}.")
        }
        RepoError::ConstraintViolation(ConstraintViolation::DuplicateKey { entity, id }) => {
            format!("A {entity} with id {id} already exists.")
        }
        RepoError::ConstraintViolation(_) => {
            "The change breaks a data rule and was rejected.".to_string()
        }
        _ => "Storage error; the operation was not applied.".to_string(),
    }
}

fn format_company(company: &Company) -> String {
    format!(
        "[{}] {} ({})",
        company.id.unwrap_or_default(),
        company.name,
        company.industry
    )
}

fn format_department(department: &Department) -> String {
    format!(
        "[{}] {} (company {})",
        department.id.unwrap_or_default(),
        department.name,
        department.company_id
    )
}

fn format_employee(employee: &Employee) -> String {
    format!(
        "[{}] {} {}, {} (department {})",
        employee.dni,
        employee.first_name,
        employee.last_name,
        employee.job_title,
        employee.department_id
    )
}

fn render_list(lines: impl Iterator<Item = String>, empty: &str) -> String {
    let lines: Vec<String> = lines.collect();
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}
