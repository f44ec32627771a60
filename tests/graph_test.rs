//! Tests for OrgGraph mutations and invariants

use rstest::{fixture, rstest};

use orgchart::domain::{Change, DomainError, EmployeeId, GraphPolicy, OrgGraph};
use orgchart::util::testing;

/// Alice (director) > Bob > Carol, Alice > Dave
struct Org {
    graph: OrgGraph,
    alice: EmployeeId,
    bob: EmployeeId,
    carol: EmployeeId,
    dave: EmployeeId,
}

#[fixture]
fn org() -> Org {
    testing::init_test_setup();
    let mut graph = OrgGraph::new(GraphPolicy::default());
    let root = graph.root_id();
    let (alice, _) = graph.add_employee(root, "Alice", "CEO", true).unwrap();
    let (bob, _) = graph.add_employee(alice, "Bob", "Manager", false).unwrap();
    let (carol, _) = graph.add_employee(bob, "Carol", "Engineer", false).unwrap();
    let (dave, _) = graph.add_employee(alice, "Dave", "CFO", false).unwrap();
    Org {
        graph,
        alice,
        bob,
        carol,
        dave,
    }
}

/// Primary manager equals tree parent for every node, directors excepted.
fn assert_primary_matches_parent(graph: &OrgGraph) {
    let root = graph.root_id();
    for employee in graph.employees() {
        let parent = graph.parent_of(employee.id).expect("every employee has a parent");
        if parent == root {
            assert!(employee.reports_to.is_empty(), "{} is a director", employee.name);
        } else {
            assert_eq!(employee.primary_manager(), Some(parent), "{}", employee.name);
        }
    }
    graph.validate().expect("graph invariants hold");
}

#[rstest]
fn given_fresh_graph_then_only_root_exists() {
    let graph = OrgGraph::default();

    assert!(graph.is_empty());
    assert_eq!(graph.all_nodes().count(), 1);
    let root = graph.find(graph.root_id()).unwrap();
    assert!(root.reports_to.is_empty());
    assert!(graph.parent_of(graph.root_id()).is_none());
}

#[rstest]
fn given_fixture_then_invariants_hold(org: Org) {
    assert_eq!(org.graph.len(), 4);
    assert_primary_matches_parent(&org.graph);
    assert_eq!(
        org.graph.children_of(org.alice).unwrap(),
        vec![org.bob, org.dave]
    );
}

#[rstest]
#[case("", "Engineer")]
#[case("Eve", "")]
#[case("   ", "Engineer")]
#[case("Eve", "\t")]
fn given_blank_details_when_adding_then_validation_error(
    mut org: Org,
    #[case] name: &str,
    #[case] title: &str,
) {
    // Arrange
    let before = org.graph.clone();

    // Act
    let result = org.graph.add_employee(org.bob, name, title, false);

    // Assert
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(org.graph, before);
}

#[rstest]
fn given_padded_details_when_adding_then_trimmed(mut org: Org) {
    let (eve, changes) = org
        .graph
        .add_employee(org.bob, "  Eve ", " Designer  ", false)
        .unwrap();

    let employee = org.graph.find(eve).unwrap();
    assert_eq!(employee.name, "Eve");
    assert_eq!(employee.title, "Designer");
    assert_eq!(
        changes,
        vec![Change::InsertEmployee {
            id: eve,
            name: "Eve".into(),
            title: "Designer".into(),
            parent_id: Some(org.bob),
        }]
    );
}

#[rstest]
fn given_root_as_parent_when_adding_then_becomes_director(mut org: Org) {
    let root = org.graph.root_id();

    let (eve, _) = org.graph.add_employee(root, "Eve", "COO", false).unwrap();

    assert_eq!(org.graph.parent_of(eve), Some(root));
    assert!(org.graph.find(eve).unwrap().reports_to.is_empty());
    assert_primary_matches_parent(&org.graph);
}

#[rstest]
fn given_second_line_when_added_twice_then_idempotent(mut org: Org) {
    // Act
    let first = org.graph.add_reporting_line(org.dave, org.carol).unwrap();
    let snapshot = org.graph.clone();
    let second = org.graph.add_reporting_line(org.dave, org.carol).unwrap();

    // Assert
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(org.graph, snapshot);
    assert_eq!(
        org.graph.find(org.carol).unwrap().reports_to,
        vec![org.bob, org.dave]
    );
}

#[rstest]
fn given_same_primary_when_linking_again_then_no_change(mut org: Org) {
    let changes = org.graph.add_reporting_line(org.bob, org.carol).unwrap();

    assert!(changes.is_empty());
    assert_eq!(org.graph.find(org.carol).unwrap().reports_to, vec![org.bob]);
}

#[rstest]
fn given_director_reporting_to_its_own_report_when_linking_then_circular(mut org: Org) {
    // Arrange
    let before = org.graph.clone();

    // Act: Alice would report to Carol, who reports up to Alice
    let result = org.graph.add_reporting_line(org.carol, org.alice);

    // Assert
    assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    assert_eq!(org.graph, before);
}

#[rstest]
fn given_self_as_manager_when_linking_then_circular(mut org: Org) {
    let result = org.graph.add_reporting_line(org.bob, org.bob);

    assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
}

#[rstest]
fn given_cycle_through_secondary_line_when_linking_then_circular(mut org: Org) {
    // Arrange: Dave also reports to Carol
    org.graph.add_reporting_line(org.carol, org.dave).unwrap();

    // Act: Bob reporting to Dave closes Bob > Carol > Dave > Bob
    let result = org.graph.add_reporting_line(org.dave, org.bob);

    // Assert
    assert!(matches!(result, Err(DomainError::InvariantViolation(_))));
    assert_primary_matches_parent(&org.graph);
}

#[rstest]
fn given_root_as_employee_when_linking_then_validation_error(mut org: Org) {
    let root = org.graph.root_id();

    let result = org.graph.add_reporting_line(org.alice, root);

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[rstest]
fn given_unknown_ids_when_mutating_then_not_found(mut org: Org) {
    let ghost = EmployeeId::new();

    assert_eq!(
        org.graph.add_reporting_line(ghost, org.carol),
        Err(DomainError::NotFound(ghost))
    );
    assert_eq!(
        org.graph.rename_employee(ghost, "X", "Y"),
        Err(DomainError::NotFound(ghost))
    );
    assert_eq!(
        org.graph.remove_employee(ghost),
        Err(DomainError::NotFound(ghost))
    );
    assert_eq!(
        org.graph.move_employee(ghost, org.bob),
        Err(DomainError::NotFound(ghost))
    );
}

#[rstest]
fn given_root_when_renamed_or_removed_then_refused(mut org: Org) {
    let root = org.graph.root_id();

    assert!(matches!(
        org.graph.rename_employee(root, "Acme", "Company"),
        Err(DomainError::Validation(_))
    ));
    assert!(matches!(
        org.graph.remove_employee(root),
        Err(DomainError::Validation(_))
    ));
    assert!(org.graph.find(root).is_some());
}

#[rstest]
fn given_manager_with_reports_when_removing_then_refused_and_unchanged(mut org: Org) {
    let before = org.graph.clone();

    let result = org.graph.remove_employee(org.bob);

    assert_eq!(result, Err(DomainError::violation("has subordinates")));
    assert_eq!(org.graph, before);
}

#[rstest]
fn given_secondary_manager_removed_then_employee_keeps_primary(mut org: Org) {
    // Arrange
    org.graph.add_reporting_line(org.dave, org.carol).unwrap();

    // Act: Dave leaves the company
    org.graph.remove_employee(org.dave).unwrap();

    // Assert
    assert_eq!(org.graph.find(org.carol).unwrap().reports_to, vec![org.bob]);
    assert!(org.graph.secondary_edges().is_empty());
    assert_primary_matches_parent(&org.graph);
}

#[rstest]
fn given_primary_line_removed_then_secondary_promoted_and_tree_follows(mut org: Org) {
    // Arrange
    org.graph.add_reporting_line(org.dave, org.carol).unwrap();

    // Act
    let changes = org.graph.remove_reporting_line(org.bob, org.carol).unwrap();

    // Assert
    assert_eq!(org.graph.find(org.carol).unwrap().reports_to, vec![org.dave]);
    assert_eq!(org.graph.parent_of(org.carol), Some(org.dave));
    assert!(org.graph.children_of(org.bob).unwrap().is_empty());
    assert_eq!(
        changes,
        vec![
            Change::DeleteLine {
                employee: org.carol,
                manager: org.dave
            },
            Change::UpdateParent {
                id: org.carol,
                parent_id: Some(org.dave)
            },
        ]
    );
    assert_primary_matches_parent(&org.graph);
}

#[rstest]
fn given_missing_line_when_unlinking_then_no_op(mut org: Org) {
    let before = org.graph.clone();

    let changes = org.graph.remove_reporting_line(org.dave, org.carol).unwrap();

    assert!(changes.is_empty());
    assert_eq!(org.graph, before);
}

#[rstest]
fn given_last_director_when_removing_then_refused(mut org: Org) {
    // Arrange: strip Alice down to a lone director
    org.graph.remove_employee(org.carol).unwrap();
    org.graph.remove_employee(org.bob).unwrap();
    org.graph.remove_employee(org.dave).unwrap();

    // Act
    let result = org.graph.remove_employee(org.alice);

    // Assert
    assert_eq!(result, Err(DomainError::violation("last director")));
    assert_eq!(org.graph.len(), 1);
}

#[rstest]
fn given_second_director_when_removing_one_then_allowed(mut org: Org) {
    let root = org.graph.root_id();
    let (eve, _) = org.graph.add_employee(root, "Eve", "COO", true).unwrap();

    org.graph.remove_employee(eve).unwrap();

    assert!(org.graph.find(eve).is_none());
}

#[rstest]
fn given_move_to_new_manager_then_secondaries_kept(mut org: Org) {
    // Arrange: Carol also reports to Alice
    org.graph.add_reporting_line(org.alice, org.carol).unwrap();

    // Act
    org.graph.move_employee(org.carol, org.dave).unwrap();

    // Assert
    assert_eq!(
        org.graph.find(org.carol).unwrap().reports_to,
        vec![org.dave, org.alice]
    );
    assert_eq!(org.graph.parent_of(org.carol), Some(org.dave));
    assert_primary_matches_parent(&org.graph);
}

#[rstest]
fn given_director_moved_below_peer_then_no_longer_director(mut org: Org) {
    // Arrange
    let root = org.graph.root_id();
    let (eve, _) = org.graph.add_employee(root, "Eve", "COO", true).unwrap();

    // Act
    org.graph.move_employee(eve, org.alice).unwrap();

    // Assert
    assert_eq!(org.graph.parent_of(eve), Some(org.alice));
    assert_eq!(org.graph.find(eve).unwrap().reports_to, vec![org.alice]);
    assert_primary_matches_parent(&org.graph);
}

#[rstest]
fn given_move_to_root_then_validation_error(mut org: Org) {
    let root = org.graph.root_id();

    let result = org.graph.move_employee(org.carol, root);

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[rstest]
fn given_mixed_sequence_of_mutations_then_invariants_hold_throughout(mut org: Org) {
    let root = org.graph.root_id();
    let (eve, _) = org.graph.add_employee(root, "Eve", "COO", true).unwrap();
    let (frank, _) = org.graph.add_employee(eve, "Frank", "Ops", false).unwrap();

    let steps: Vec<Box<dyn Fn(&mut OrgGraph) -> bool>> = vec![
        Box::new(move |g| g.add_reporting_line(org.bob, frank).is_ok()),
        Box::new(move |g| g.add_reporting_line(org.dave, frank).is_ok()),
        Box::new(move |g| g.remove_reporting_line(eve, frank).is_ok()),
        Box::new(move |g| g.add_reporting_line(frank, eve).is_ok()),
        Box::new(move |g| g.move_employee(org.carol, frank).is_ok()),
        Box::new(move |g| g.add_reporting_line(org.carol, org.bob).is_ok()),
        Box::new(move |g| g.remove_reporting_line(org.bob, frank).is_ok()),
        Box::new(move |g| g.remove_employee(org.carol).is_ok()),
        Box::new(move |g| g.remove_reporting_line(org.dave, frank).is_ok()),
    ];

    for step in steps {
        step(&mut org.graph);
        assert_primary_matches_parent(&org.graph);
    }
    // Frank lost all managers and is a director again
    assert_eq!(org.graph.parent_of(frank), Some(root));
}

#[rstest]
fn given_populated_graph_when_reset_then_empty_with_fresh_root(mut org: Org) {
    let old_root = org.graph.root_id();

    let changes = org.graph.reset();

    assert_eq!(changes, vec![Change::Clear]);
    assert!(org.graph.is_empty());
    assert_ne!(org.graph.root_id(), old_root);
    assert!(org.graph.find(org.alice).is_none());
}

#[rstest]
fn given_secondary_lines_then_reporting_edges_rank_in_list_order(mut org: Org) {
    org.graph.add_reporting_line(org.dave, org.carol).unwrap();
    org.graph.add_reporting_line(org.alice, org.carol).unwrap();

    let carol_edges: Vec<_> = org
        .graph
        .reporting_edges()
        .into_iter()
        .filter(|e| e.employee == org.carol)
        .collect();
    let secondary = org.graph.secondary_edges();

    assert_eq!(
        carol_edges.iter().map(|e| (e.manager, e.rank)).collect::<Vec<_>>(),
        vec![(org.bob, 0), (org.dave, 1), (org.alice, 2)]
    );
    assert_eq!(secondary.len(), 2);
    assert!(secondary.iter().all(|e| !e.is_primary()));
}
