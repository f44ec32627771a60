//! Tests for TomlFileRepository

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use orgchart::application::services::OrgChartService;
use orgchart::application::ApplicationError;
use orgchart::domain::{Change, EmployeeId, EmployeeRecord, GraphPolicy, ReportingLineRecord};
use orgchart::infrastructure::traits::{OrgRepository, TomlFileRepository};

fn record(
    id: EmployeeId,
    name: &str,
    parent_id: Option<EmployeeId>,
    owner: &str,
) -> EmployeeRecord {
    EmployeeRecord {
        id,
        name: name.to_string(),
        title: "Staff".to_string(),
        parent_id,
        owner: owner.to_string(),
    }
}

#[test]
fn given_missing_file_when_fetching_then_empty() {
    let temp = TempDir::new().unwrap();
    let repo = TomlFileRepository::new(temp.path().join("org.toml"));

    let (employees, lines) = repo.fetch_all("acme").unwrap();

    assert!(employees.is_empty());
    assert!(lines.is_empty());
    assert!(!repo.path().exists());
}

#[test]
fn given_nested_path_when_writing_then_parent_dirs_created() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("deep").join("er").join("org.toml");
    let repo = TomlFileRepository::new(&path);

    // Act
    repo.insert_employee(&record(EmployeeId::new(), "Alice", None, "acme"))
        .unwrap();

    // Assert
    assert!(path.exists());
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("Alice"));
    assert!(content.contains("[[employees]]"));
}

#[test]
fn given_two_owners_when_fetching_then_rows_are_scoped() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let repo = TomlFileRepository::new(temp.path().join("org.toml"));
    let (alice, zed, bob) = (EmployeeId::new(), EmployeeId::new(), EmployeeId::new());
    repo.insert_employee(&record(alice, "Alice", None, "acme")).unwrap();
    repo.insert_employee(&record(bob, "Bob", Some(alice), "acme")).unwrap();
    repo.insert_employee(&record(zed, "Zed", None, "globex")).unwrap();

    // Act
    repo.clear("globex").unwrap();

    // Assert
    let (acme, _) = repo.fetch_all("acme").unwrap();
    let (globex, _) = repo.fetch_all("globex").unwrap();
    assert_eq!(acme.len(), 2);
    assert!(globex.is_empty());
}

#[test]
fn given_line_rows_when_employee_deleted_then_lines_for_it_removed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let repo = TomlFileRepository::new(temp.path().join("org.toml"));
    let (alice, bob, carol) = (EmployeeId::new(), EmployeeId::new(), EmployeeId::new());
    for r in [
        record(alice, "Alice", None, "acme"),
        record(bob, "Bob", Some(alice), "acme"),
        record(carol, "Carol", Some(bob), "acme"),
    ] {
        repo.insert_employee(&r).unwrap();
    }
    repo.insert_reporting_line(&ReportingLineRecord {
        employee_id: carol,
        manager_id: alice,
        owner: "acme".into(),
    })
    .unwrap();

    // Act
    repo.apply_changes(
        "acme",
        &[
            Change::DeleteLinesFor { id: carol },
            Change::DeleteEmployee { id: carol },
        ],
    )
    .unwrap();

    // Assert
    let (employees, lines) = repo.fetch_all("acme").unwrap();
    assert_eq!(employees.len(), 2);
    assert!(lines.is_empty());
}

#[test]
fn given_failing_change_in_batch_when_applying_then_file_unchanged() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("org.toml");
    let repo = TomlFileRepository::new(&path);
    let alice = EmployeeId::new();
    repo.insert_employee(&record(alice, "Alice", None, "acme")).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    // Act: the second change targets an unknown row
    let result = repo.apply_changes(
        "acme",
        &[
            Change::UpdateDetails {
                id: alice,
                name: "Alicia".into(),
                title: "CEO".into(),
            },
            Change::UpdateParent {
                id: EmployeeId::new(),
                parent_id: Some(alice),
            },
        ],
    );

    // Assert
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn given_corrupt_file_when_fetching_then_invalid_data() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("org.toml");
    fs::write(&path, "employees = 'not a list'").unwrap();
    let repo = TomlFileRepository::new(&path);

    let err = repo.fetch_all("acme").unwrap_err();

    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn given_service_on_file_when_restarted_then_organisation_restored() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("org.toml");
    let (alice, carol, dave) = {
        let repo = Arc::new(TomlFileRepository::new(&path));
        let mut service = OrgChartService::load(repo, "acme", GraphPolicy::default()).unwrap();
        let root = service.graph().root_id();
        let alice = service.add_employee(root, "Alice", "CEO", true).unwrap();
        let bob = service.add_employee(alice, "Bob", "Manager", false).unwrap();
        let dave = service.add_employee(alice, "Dave", "CFO", false).unwrap();
        let carol = service.add_employee(bob, "Carol", "Engineer", false).unwrap();
        service.add_reporting_line(dave, carol).unwrap();
        (alice, carol, dave)
    };

    // Act
    let repo = Arc::new(TomlFileRepository::new(&path));
    let service = OrgChartService::load(repo, "acme", GraphPolicy::default()).unwrap();

    // Assert
    let graph = service.graph();
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.parent_of(alice), Some(graph.root_id()));
    assert_eq!(graph.find(carol).unwrap().secondary_managers(), &[dave]);
    graph.validate().unwrap();
}

#[test]
fn given_malformed_data_file_when_loading_service_then_parse_reason_reported() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("org.toml");
    fs::write(&path, "[[employees]]\nid = 12\n").unwrap();
    let repo = Arc::new(TomlFileRepository::new(&path));

    // Act
    let result = OrgChartService::load(repo, "acme", GraphPolicy::default());

    // Assert
    let Err(err) = result else {
        panic!("malformed data file must not load");
    };
    assert!(matches!(err, ApplicationError::Persistence { .. }));
    let message = err.to_string();
    assert!(message.contains("fetch records: acme"), "{message}");
    assert!(message.contains("parse"), "{message}");
    assert!(message.contains("org.toml"), "{message}");
}
