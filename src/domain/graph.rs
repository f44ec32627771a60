//! Organisation graph: validated mutations over the employee tree.
//!
//! Every mutation checks its preconditions before touching the arena, so a
//! failed call leaves the graph exactly as it was. Successful calls return the
//! list of [`Change`]s the persistence layer has to replay.

use tracing::{debug, instrument};

use crate::domain::arena::OrgArena;
use crate::domain::entities::{
    Employee, EmployeeId, EmployeeRecord, ReportingEdge, ReportingLineRecord,
};
use crate::domain::error::{DomainError, DomainResult};

/// Business rules that are configuration, not structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphPolicy {
    /// Refuse to remove the last direct report of the root.
    pub require_director: bool,
}

impl Default for GraphPolicy {
    fn default() -> Self {
        Self {
            require_director: true,
        }
    }
}

/// A single persistence step produced by a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    InsertEmployee {
        id: EmployeeId,
        name: String,
        title: String,
        parent_id: Option<EmployeeId>,
    },
    UpdateDetails {
        id: EmployeeId,
        name: String,
        title: String,
    },
    UpdateParent {
        id: EmployeeId,
        parent_id: Option<EmployeeId>,
    },
    DeleteEmployee {
        id: EmployeeId,
    },
    /// Drop every secondary line where `id` is employee or manager.
    DeleteLinesFor {
        id: EmployeeId,
    },
    InsertLine {
        employee: EmployeeId,
        manager: EmployeeId,
    },
    DeleteLine {
        employee: EmployeeId,
        manager: EmployeeId,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrgGraph {
    arena: OrgArena,
    policy: GraphPolicy,
}

/// Trim both fields and reject empty values.
fn validate_details(name: &str, title: &str) -> DomainResult<(String, String)> {
    let (name, title) = (name.trim(), title.trim());
    if name.is_empty() || title.is_empty() {
        return Err(DomainError::validation("name and title required"));
    }
    Ok((name.to_string(), title.to_string()))
}

impl OrgGraph {
    pub fn new(policy: GraphPolicy) -> Self {
        Self {
            arena: OrgArena::new(),
            policy,
        }
    }

    pub(crate) fn from_arena(arena: OrgArena, policy: GraphPolicy) -> Self {
        Self { arena, policy }
    }

    pub fn arena(&self) -> &OrgArena {
        &self.arena
    }

    pub fn policy(&self) -> GraphPolicy {
        self.policy
    }

    pub fn root_id(&self) -> EmployeeId {
        self.arena.root_id()
    }

    pub fn find(&self, id: EmployeeId) -> Option<&Employee> {
        self.arena.find(id)
    }

    /// Pre-order traversal, root first.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Employee> + '_ {
        self.arena.all_nodes()
    }

    pub fn employees(&self) -> impl Iterator<Item = &Employee> + '_ {
        self.arena.employees()
    }

    pub fn parent_of(&self, id: EmployeeId) -> Option<EmployeeId> {
        self.arena.parent_of(id)
    }

    pub fn children_of(&self, id: EmployeeId) -> Option<Vec<EmployeeId>> {
        self.arena.children_of(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    fn require(&self, id: EmployeeId) -> DomainResult<&Employee> {
        self.arena.find(id).ok_or(DomainError::NotFound(id))
    }

    fn require_non_root(&self, id: EmployeeId, message: &str) -> DomainResult<&Employee> {
        if self.arena.is_root(id) {
            return Err(DomainError::validation(message));
        }
        self.require(id)
    }

    /// Would `employee` reporting to `manager` close a loop?
    fn would_cycle(&self, manager: EmployeeId, employee: EmployeeId) -> bool {
        manager == employee || self.arena.transitive_managers(manager).contains(&employee)
    }

    fn move_node(&mut self, id: EmployeeId, new_parent: EmployeeId) -> DomainResult<()> {
        let idx = self.arena.index_of(id).ok_or(DomainError::NotFound(id))?;
        let parent_idx = self
            .arena
            .index_of(new_parent)
            .ok_or(DomainError::NotFound(new_parent))?;
        self.arena.reattach(idx, parent_idx);
        Ok(())
    }

    fn reports_to_mut(&mut self, id: EmployeeId) -> DomainResult<&mut Vec<EmployeeId>> {
        self.arena
            .find_mut(id)
            .map(|e| &mut e.reports_to)
            .ok_or(DomainError::NotFound(id))
    }

    /// Add an employee below `parent_id`, or below the root for directors.
    ///
    /// Directors always attach at top level and have no primary manager.
    /// Passing the root as `parent_id` is equivalent to `is_director`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_employee(
        &mut self,
        parent_id: EmployeeId,
        name: &str,
        title: &str,
        is_director: bool,
    ) -> DomainResult<(EmployeeId, Vec<Change>)> {
        let (name, title) = validate_details(name, title)?;
        let top_level = is_director || self.arena.is_root(parent_id);
        let parent_idx = if top_level {
            self.arena.root()
        } else {
            self.arena
                .index_of(parent_id)
                .ok_or(DomainError::NotFound(parent_id))?
        };

        let mut employee = Employee::new(name.clone(), title.clone());
        let record_parent = if top_level {
            None
        } else {
            employee.reports_to.push(parent_id);
            Some(parent_id)
        };
        let id = employee.id;
        self.arena.insert_node(employee, parent_idx);
        debug!(%id, ?record_parent, "employee added");

        Ok((
            id,
            vec![Change::InsertEmployee {
                id,
                name,
                title,
                parent_id: record_parent,
            }],
        ))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn rename_employee(
        &mut self,
        id: EmployeeId,
        name: &str,
        title: &str,
    ) -> DomainResult<Vec<Change>> {
        let (name, title) = validate_details(name, title)?;
        self.require_non_root(id, "the company root cannot be renamed")?;

        let employee = self.arena.find_mut(id).ok_or(DomainError::NotFound(id))?;
        employee.name = name.clone();
        employee.title = title.clone();
        Ok(vec![Change::UpdateDetails { id, name, title }])
    }

    /// Remove a leaf employee together with every secondary line that
    /// mentions it.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_employee(&mut self, id: EmployeeId) -> DomainResult<Vec<Change>> {
        self.require_non_root(id, "the company root cannot be removed")?;
        if self.arena.has_children(id) {
            return Err(DomainError::violation("has subordinates"));
        }
        let is_director = self.arena.parent_of(id) == Some(self.root_id());
        if self.policy.require_director && is_director && self.arena.director_count() == 1 {
            return Err(DomainError::violation("last director"));
        }

        let idx = self.arena.index_of(id).ok_or(DomainError::NotFound(id))?;
        let referencing: Vec<EmployeeId> = self
            .arena
            .employees()
            .filter(|e| e.reports_to.contains(&id))
            .map(|e| e.id)
            .collect();
        for other in referencing {
            self.reports_to_mut(other)?.retain(|&m| m != id);
        }
        self.arena.remove_leaf(idx);
        debug!(%id, "employee removed");

        Ok(vec![
            Change::DeleteLinesFor { id },
            Change::DeleteEmployee { id },
        ])
    }

    /// Record that `employee_id` also reports to `manager_id`.
    ///
    /// A director has no primary manager yet, so the first line it receives
    /// becomes primary and moves it below that manager.
    #[instrument(level = "debug", skip(self))]
    pub fn add_reporting_line(
        &mut self,
        manager_id: EmployeeId,
        employee_id: EmployeeId,
    ) -> DomainResult<Vec<Change>> {
        self.require_non_root(manager_id, "cannot report to root")?;
        let employee = self.require_non_root(employee_id, "the company root reports to no one")?;
        if employee.reports_to.contains(&manager_id) {
            return Ok(Vec::new());
        }
        let becomes_primary = employee.reports_to.is_empty();
        if self.would_cycle(manager_id, employee_id) {
            return Err(DomainError::violation("circular reporting"));
        }

        if becomes_primary {
            self.move_node(employee_id, manager_id)?;
        }
        self.reports_to_mut(employee_id)?.push(manager_id);
        debug!(%manager_id, %employee_id, becomes_primary, "reporting line added");

        if becomes_primary {
            Ok(vec![Change::UpdateParent {
                id: employee_id,
                parent_id: Some(manager_id),
            }])
        } else {
            Ok(vec![Change::InsertLine {
                employee: employee_id,
                manager: manager_id,
            }])
        }
    }

    /// Drop `manager_id` from `employee_id`'s managers.
    ///
    /// Removing the primary manager promotes the next one and moves the
    /// employee below it. Removing the only manager moves the employee below
    /// the root. Removing a line that does not exist is a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_reporting_line(
        &mut self,
        manager_id: EmployeeId,
        employee_id: EmployeeId,
    ) -> DomainResult<Vec<Change>> {
        self.require(manager_id)?;
        let employee = self.require(employee_id)?;
        let Some(rank) = employee.reports_to.iter().position(|&m| m == manager_id) else {
            return Ok(Vec::new());
        };
        let new_primary = employee.reports_to.get(1).copied();

        if rank > 0 {
            self.reports_to_mut(employee_id)?.remove(rank);
            return Ok(vec![Change::DeleteLine {
                employee: employee_id,
                manager: manager_id,
            }]);
        }

        let destination = new_primary.unwrap_or_else(|| self.root_id());
        self.move_node(employee_id, destination)?;
        self.reports_to_mut(employee_id)?.remove(0);
        debug!(%employee_id, ?new_primary, "primary manager removed");

        let mut changes = Vec::new();
        if let Some(promoted) = new_primary {
            changes.push(Change::DeleteLine {
                employee: employee_id,
                manager: promoted,
            });
        }
        changes.push(Change::UpdateParent {
            id: employee_id,
            parent_id: new_primary,
        });
        Ok(changes)
    }

    /// Re-parent `id` below `new_manager_id`, which becomes its primary
    /// manager. Secondary lines are kept; the old primary line is dropped.
    #[instrument(level = "debug", skip(self))]
    pub fn move_employee(
        &mut self,
        id: EmployeeId,
        new_manager_id: EmployeeId,
    ) -> DomainResult<Vec<Change>> {
        self.require_non_root(new_manager_id, "cannot report to root")?;
        let employee = self.require_non_root(id, "the company root cannot be moved")?;
        if employee.primary_manager() == Some(new_manager_id) {
            return Ok(Vec::new());
        }
        let secondary_rank = employee.reports_to.iter().position(|&m| m == new_manager_id);
        if self.would_cycle(new_manager_id, id) {
            return Err(DomainError::violation("circular reporting"));
        }

        self.move_node(id, new_manager_id)?;
        let reports_to = self.reports_to_mut(id)?;
        if let Some(rank) = secondary_rank {
            reports_to.remove(rank);
        }
        if reports_to.is_empty() {
            reports_to.push(new_manager_id);
        } else {
            reports_to[0] = new_manager_id;
        }
        debug!(%id, %new_manager_id, "employee moved");

        let mut changes = Vec::new();
        if secondary_rank.is_some() {
            changes.push(Change::DeleteLine {
                employee: id,
                manager: new_manager_id,
            });
        }
        changes.push(Change::UpdateParent {
            id,
            parent_id: Some(new_manager_id),
        });
        Ok(changes)
    }

    /// Discard every employee and line, keeping a fresh root.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) -> Vec<Change> {
        self.arena = OrgArena::new();
        vec![Change::Clear]
    }

    /// All `reports_to` entries, pre-order by employee.
    pub fn reporting_edges(&self) -> Vec<ReportingEdge> {
        self.employees()
            .flat_map(|e| {
                e.reports_to
                    .iter()
                    .enumerate()
                    .map(move |(rank, &manager)| ReportingEdge {
                        manager,
                        employee: e.id,
                        rank,
                    })
            })
            .collect()
    }

    /// Only the lines without a tree edge (`rank >= 1`).
    pub fn secondary_edges(&self) -> Vec<ReportingEdge> {
        self.reporting_edges()
            .into_iter()
            .filter(|edge| !edge.is_primary())
            .collect()
    }

    /// Check the structural invariants of the whole graph.
    pub fn validate(&self) -> DomainResult<()> {
        let root_id = self.root_id();
        if self.find(root_id).is_some_and(|r| !r.reports_to.is_empty()) {
            return Err(DomainError::violation("root reports to someone"));
        }
        for employee in self.employees() {
            let parent = self.parent_of(employee.id);
            let expected = if parent == Some(root_id) { None } else { parent };
            if employee.primary_manager() != expected {
                return Err(DomainError::violation(format!(
                    "primary manager of {} is not its tree parent",
                    employee.id
                )));
            }
            if employee.reports_to.contains(&root_id) {
                return Err(DomainError::violation(format!(
                    "{} reports to root",
                    employee.id
                )));
            }
            let mut seen = std::collections::HashSet::new();
            if !employee.reports_to.iter().all(|m| seen.insert(*m)) {
                return Err(DomainError::violation(format!(
                    "duplicate manager for {}",
                    employee.id
                )));
            }
            if self.arena.transitive_managers(employee.id).contains(&employee.id) {
                return Err(DomainError::CycleDetected(employee.id));
            }
        }
        Ok(())
    }

    /// Flatten into persistence records, pre-order, parents before children.
    pub fn to_records(&self, owner: &str) -> (Vec<EmployeeRecord>, Vec<ReportingLineRecord>) {
        let employees = self
            .employees()
            .map(|e| EmployeeRecord {
                id: e.id,
                name: e.name.clone(),
                title: e.title.clone(),
                parent_id: e.primary_manager(),
                owner: owner.to_string(),
            })
            .collect();
        let lines = self
            .secondary_edges()
            .into_iter()
            .map(|edge| ReportingLineRecord {
                employee_id: edge.employee,
                manager_id: edge.manager,
                owner: owner.to_string(),
            })
            .collect();
        (employees, lines)
    }
}
