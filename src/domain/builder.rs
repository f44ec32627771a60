//! Graph builder: reconstructs an organisation from persisted records.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument, warn};

use crate::domain::arena::OrgArena;
use crate::domain::entities::{Employee, EmployeeId, EmployeeRecord, ReportingLineRecord};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::graph::{GraphPolicy, OrgGraph};

/// Constructs an [`OrgGraph`] from employee rows and reporting-line rows.
///
/// Record order is kept as child order. Rows pointing at unknown parents are
/// treated as directors; unusable reporting lines are skipped.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    policy: GraphPolicy,
}

impl GraphBuilder {
    pub fn new(policy: GraphPolicy) -> Self {
        Self { policy }
    }

    #[instrument(level = "debug", skip_all, fields(employees = employees.len(), lines = lines.len()))]
    pub fn build(
        &self,
        employees: &[EmployeeRecord],
        lines: &[ReportingLineRecord],
    ) -> DomainResult<OrgGraph> {
        let mut records: Vec<&EmployeeRecord> = Vec::with_capacity(employees.len());
        let mut known = HashSet::new();
        for record in employees {
            if known.insert(record.id) {
                records.push(record);
            } else {
                warn!(id = %record.id, "duplicate employee record skipped");
            }
        }

        // parent -> children, in record order; None collects the directors
        let mut children: HashMap<Option<EmployeeId>, Vec<&EmployeeRecord>> = HashMap::new();
        for record in &records {
            let parent = match record.parent_id {
                Some(parent) if known.contains(&parent) => Some(parent),
                Some(parent) => {
                    warn!(id = %record.id, %parent, "unknown parent, attaching below root");
                    None
                }
                None => None,
            };
            children.entry(parent).or_default().push(record);
        }

        let mut arena = OrgArena::new();
        let mut stack: Vec<(&EmployeeRecord, Index, bool)> = children
            .get(&None)
            .map(|top| top.iter().rev().map(|r| (*r, arena.root(), true)).collect())
            .unwrap_or_default();
        let mut placed = HashSet::new();

        while let Some((record, parent_idx, top_level)) = stack.pop() {
            if !placed.insert(record.id) {
                return Err(DomainError::CycleDetected(record.id));
            }
            let mut employee = Employee::new(record.name.clone(), record.title.clone());
            employee.id = record.id;
            if !top_level {
                if let Some(parent) = record.parent_id {
                    employee.reports_to.push(parent);
                }
            }
            let idx = arena.insert_node(employee, parent_idx);

            if let Some(kids) = children.get(&Some(record.id)) {
                for child in kids.iter().rev() {
                    stack.push((*child, idx, false));
                }
            }
        }

        // Anything not reachable from the root hangs on a parent cycle
        if let Some(orphan) = records.iter().find(|r| !placed.contains(&r.id)) {
            return Err(DomainError::CycleDetected(orphan.id));
        }

        for line in lines {
            Self::attach_line(&mut arena, line);
        }
        debug!(employees = arena.len(), "graph rebuilt");

        Ok(OrgGraph::from_arena(arena, self.policy))
    }

    fn attach_line(arena: &mut OrgArena, line: &ReportingLineRecord) {
        let (employee, manager) = (line.employee_id, line.manager_id);
        let Some(current) = arena.find(employee).map(|e| e.reports_to.clone()) else {
            warn!(%employee, "reporting line for unknown employee skipped");
            return;
        };
        if !arena.contains(manager) || arena.is_root(manager) {
            warn!(%manager, "reporting line to unknown manager skipped");
            return;
        }
        if current.is_empty() {
            warn!(%employee, %manager, "secondary line on a director skipped");
            return;
        }
        if current.contains(&manager) {
            return;
        }
        if manager == employee || arena.transitive_managers(manager).contains(&employee) {
            warn!(%employee, %manager, "circular reporting line skipped");
            return;
        }
        if let Some(e) = arena.find_mut(employee) {
            e.reports_to.push(manager);
        }
    }
}

impl OrgGraph {
    /// Rebuild a graph from records fetched for one owner.
    pub fn from_records(
        employees: &[EmployeeRecord],
        lines: &[ReportingLineRecord],
        policy: GraphPolicy,
    ) -> DomainResult<Self> {
        GraphBuilder::new(policy).build(employees, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: EmployeeId, name: &str, parent: Option<EmployeeId>) -> EmployeeRecord {
        EmployeeRecord {
            id,
            name: name.into(),
            title: "t".into(),
            parent_id: parent,
            owner: "acme".into(),
        }
    }

    fn line(employee: EmployeeId, manager: EmployeeId) -> ReportingLineRecord {
        ReportingLineRecord {
            employee_id: employee,
            manager_id: manager,
            owner: "acme".into(),
        }
    }

    #[test]
    fn given_children_before_parents_when_building_then_tree_is_complete() {
        let (a, b, c) = (EmployeeId::new(), EmployeeId::new(), EmployeeId::new());
        let records = vec![
            record(c, "c", Some(b)),
            record(b, "b", Some(a)),
            record(a, "a", None),
        ];

        let graph = GraphBuilder::default().build(&records, &[]).unwrap();

        assert_eq!(graph.parent_of(c), Some(b));
        assert_eq!(graph.parent_of(b), Some(a));
        assert_eq!(graph.parent_of(a), Some(graph.root_id()));
        assert_eq!(graph.find(c).unwrap().reports_to, vec![b]);
        graph.validate().unwrap();
    }

    #[test]
    fn given_parent_cycle_when_building_then_cycle_detected() {
        let (a, b, d) = (EmployeeId::new(), EmployeeId::new(), EmployeeId::new());
        let records = vec![
            record(d, "d", None),
            record(a, "a", Some(b)),
            record(b, "b", Some(a)),
        ];

        let err = GraphBuilder::default().build(&records, &[]).unwrap_err();
        assert!(matches!(err, DomainError::CycleDetected(id) if id == a || id == b));
    }

    #[test]
    fn given_dangling_parent_when_building_then_attached_as_director() {
        let a = EmployeeId::new();
        let records = vec![record(a, "a", Some(EmployeeId::new()))];

        let graph = GraphBuilder::default().build(&records, &[]).unwrap();

        assert_eq!(graph.parent_of(a), Some(graph.root_id()));
        assert!(graph.find(a).unwrap().reports_to.is_empty());
    }

    #[test]
    fn given_bad_lines_when_building_then_they_are_skipped() {
        let (a, b, c) = (EmployeeId::new(), EmployeeId::new(), EmployeeId::new());
        let records = vec![
            record(a, "a", None),
            record(b, "b", Some(a)),
            record(c, "c", Some(b)),
        ];
        let lines = vec![
            line(c, a),
            line(c, a),
            line(a, c),
            line(b, EmployeeId::new()),
            line(EmployeeId::new(), a),
        ];

        let graph = GraphBuilder::default().build(&records, &lines).unwrap();

        assert_eq!(graph.find(c).unwrap().reports_to, vec![b, a]);
        assert!(graph.find(a).unwrap().reports_to.is_empty());
        assert_eq!(graph.find(b).unwrap().reports_to, vec![a]);
        graph.validate().unwrap();
    }
}
