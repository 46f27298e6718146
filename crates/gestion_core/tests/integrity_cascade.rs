use gestion_core::db::open_db_in_memory;
use gestion_core::{
    Company, CompanyId, CompanyRepository, Department, DepartmentId, DepartmentRepository,
    Employee, EmployeeRepository, ErrorKind, RepoError, Repository,
};
use rusqlite::Connection;

struct Fixture {
    company_id: CompanyId,
    department_ids: Vec<DepartmentId>,
}

/// One company with `departments` departments of `per_department` employees each.
fn seed_company(
    conn: &Connection,
    name: &str,
    departments: usize,
    per_department: usize,
) -> Fixture {
    let companies = CompanyRepository::try_new(conn).unwrap();
    let department_repo = DepartmentRepository::try_new(conn).unwrap();
    let employees = EmployeeRepository::try_new(conn).unwrap();

    let company_id = companies.create(&Company::new(name, "Retail")).unwrap();
    let mut department_ids = Vec::new();
    for d in 0..departments {
        let department_id = department_repo
            .create(&Department::new(format!("{name}-dept-{d}"), company_id))
            .unwrap();
        for e in 0..per_department {
            employees
                .create(&Employee::new(
                    format!("{name}-{d}-{e}"),
                    "Ana",
                    "Ruiz",
                    "Clerk",
                    department_id,
                ))
                .unwrap();
        }
        department_ids.push(department_id);
    }

    Fixture {
        company_id,
        department_ids,
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn deleting_company_removes_whole_subtree() {
    let conn = open_db_in_memory().unwrap();
    let target = seed_company(&conn, "acme", 3, 2);
    let bystander = seed_company(&conn, "globex", 1, 4);
    assert_eq!(count(&conn, "departments"), 4);
    assert_eq!(count(&conn, "employees"), 10);

    CompanyRepository::try_new(&conn)
        .unwrap()
        .delete(&target.company_id)
        .unwrap();

    // 1 company + 3 departments + 6 employees gone; the other company intact.
    assert_eq!(count(&conn, "companies"), 1);
    assert_eq!(count(&conn, "departments"), 1);
    assert_eq!(count(&conn, "employees"), 4);

    let departments = DepartmentRepository::try_new(&conn).unwrap();
    for department_id in target.department_ids {
        assert!(departments.read(&department_id).unwrap().is_none());
    }
    assert!(departments
        .read(&bystander.department_ids[0])
        .unwrap()
        .is_some());
}

#[test]
fn deleting_department_removes_its_employees_only() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_company(&conn, "acme", 2, 3);
    let departments = DepartmentRepository::try_new(&conn).unwrap();
    let employees = EmployeeRepository::try_new(&conn).unwrap();

    departments.delete(&fixture.department_ids[0]).unwrap();

    assert!(employees.read(&"acme-0-0".to_string()).unwrap().is_none());
    assert!(employees.read(&"acme-1-0".to_string()).unwrap().is_some());
    assert_eq!(count(&conn, "employees"), 3);
    assert!(CompanyRepository::try_new(&conn)
        .unwrap()
        .read(&fixture.company_id)
        .unwrap()
        .is_some());
}

#[test]
fn failure_mid_cascade_leaves_everything_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_company(&conn, "acme", 2, 2);

    // Employees are removed before departments, so this aborts mid-cascade.
    conn.execute_batch(
        "CREATE TRIGGER fail_department_delete BEFORE DELETE ON departments
         BEGIN
            SELECT RAISE(ABORT, 'simulated store failure');
         END;",
    )
    .unwrap();

    let err = CompanyRepository::try_new(&conn)
        .unwrap()
        .delete(&fixture.company_id)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::StoreFailure);
    assert_eq!(count(&conn, "companies"), 1);
    assert_eq!(count(&conn, "departments"), 2);
    assert_eq!(count(&conn, "employees"), 4);
    assert!(conn.is_autocommit(), "transaction must be released");
}

#[test]
fn department_with_missing_company_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let departments = DepartmentRepository::try_new(&conn).unwrap();

    let err = departments
        .create(&Department::new("Sales", 404))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    assert!(matches!(
        err,
        RepoError::ReferenceNotFound { entity: "company", ref id } if id == "404"
    ));
    assert_eq!(count(&conn, "departments"), 0);
}

#[test]
fn employee_with_missing_department_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let employees = EmployeeRepository::try_new(&conn).unwrap();

    let err = employees
        .create(&Employee::new("12345678", "Ana", "Ruiz", "Clerk", 3))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);
    assert!(employees.list().unwrap().is_empty());
}

#[test]
fn reassigning_to_missing_parent_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_company(&conn, "acme", 1, 1);
    let departments = DepartmentRepository::try_new(&conn).unwrap();
    let employees = EmployeeRepository::try_new(&conn).unwrap();

    let mut department = departments
        .read(&fixture.department_ids[0])
        .unwrap()
        .unwrap();
    department.company_id = 999;
    let err = departments.update(&department).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);

    let mut employee = employees.read(&"acme-0-0".to_string()).unwrap().unwrap();
    employee.department_id = 999;
    employee.job_title = "Manager".to_string();
    let err = employees.update(&employee).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReferenceNotFound);

    let stored = employees.read(&"acme-0-0".to_string()).unwrap().unwrap();
    assert_eq!(stored.department_id, fixture.department_ids[0]);
    assert_eq!(stored.job_title, "Clerk");
}

#[test]
fn moving_employee_changes_owner_implicitly() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_company(&conn, "acme", 2, 1);
    let departments = DepartmentRepository::try_new(&conn).unwrap();
    let employees = EmployeeRepository::try_new(&conn).unwrap();

    let mut employee = employees.read(&"acme-0-0".to_string()).unwrap().unwrap();
    employee.department_id = fixture.department_ids[1];
    employees.update(&employee).unwrap();

    // The old department no longer owns the employee.
    departments.delete(&fixture.department_ids[0]).unwrap();
    assert_eq!(
        employees.read(&"acme-0-0".to_string()).unwrap().unwrap(),
        employee
    );
}

#[test]
fn acme_scenario_cascades_to_department_and_employee() {
    let conn = open_db_in_memory().unwrap();
    let companies = CompanyRepository::try_new(&conn).unwrap();
    let departments = DepartmentRepository::try_new(&conn).unwrap();
    let employees = EmployeeRepository::try_new(&conn).unwrap();

    let company_id = companies.create(&Company::new("Acme", "Retail")).unwrap();
    assert_eq!(company_id, 1);
    let department_id = departments
        .create(&Department::new("Sales", company_id))
        .unwrap();
    assert_eq!(department_id, 1);
    employees
        .create(&Employee::new("12345678", "Ana", "Ruiz", "Clerk", department_id))
        .unwrap();

    companies.delete(&1).unwrap();

    assert!(departments.read(&1).unwrap().is_none());
    assert!(employees.read(&"12345678".to_string()).unwrap().is_none());
}
