use gestion_core::db::open_db_in_memory;
use gestion_core::{
    init_logging, Company, CompanyRepository, Department, DepartmentRepository, Employee,
    EmployeeRepository, ErrorKind, Repository,
};
use std::fs;
use std::path::Path;

fn read_logs(dir: &Path) -> String {
    log::logger().flush();
    let mut logged = String::new();
    for entry in fs::read_dir(dir).unwrap() {
        logged.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap());
    }
    logged
}

#[test]
fn repository_events_never_carry_employee_dni() {
    let log_dir = tempfile::tempdir().unwrap();
    init_logging("debug", log_dir.path().to_str().unwrap()).unwrap();

    let conn = open_db_in_memory().unwrap();
    let companies = CompanyRepository::try_new(&conn).unwrap();
    let departments = DepartmentRepository::try_new(&conn).unwrap();
    let employees = EmployeeRepository::try_new(&conn).unwrap();

    let company_id = companies.create(&Company::new("Acme", "Retail")).unwrap();
    let department_id = departments
        .create(&Department::new("Sales", company_id))
        .unwrap();
    let employee = Employee::new("99887766X", "Ana", "Ruiz", "Clerk", department_id);

    employees.create(&employee).unwrap();
    let duplicate = employees.create(&employee).unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::ConstraintViolation);

    let missing = Employee::new("11223344Y", "Luis", "Gil", "Driver", department_id);
    let not_found = employees.update(&missing).unwrap_err();
    assert_eq!(not_found.kind(), ErrorKind::NotFound);

    employees.delete(&employee.dni).unwrap();
    companies.delete(&company_id).unwrap();

    let logged = read_logs(log_dir.path());
    assert!(logged.contains("event=employee_create module=repo status=ok"));
    assert!(logged.contains("event=employee_create module=repo status=error"));
    assert!(logged.contains("event=employee_update module=repo status=error"));
    assert!(logged.contains("event=employee_delete module=repo status=ok"));
    assert!(!logged.contains("99887766X"));
    assert!(!logged.contains("11223344Y"));
    assert!(!logged.contains("Ruiz"));
}
