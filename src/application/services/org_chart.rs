//! Organisation chart service
//!
//! Owns the in-memory graph of one owner and keeps the backend in step with it.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, PersistResultExt};
use crate::domain::{
    compute_secondary_lines, Change, DomainResult, EmployeeId, GraphPolicy, Measure, OrgGraph,
    Polyline,
};
use crate::infrastructure::traits::OrgRepository;

/// Service for editing an organisation chart.
///
/// Mutations are validated and applied to the graph first. The resulting
/// changes are then written to the backend; if that fails the graph is
/// restored to its previous state and the failure is returned.
pub struct OrgChartService {
    repo: Arc<dyn OrgRepository>,
    owner: String,
    graph: OrgGraph,
}

impl OrgChartService {
    /// Create a service with an empty graph (no backend read).
    pub fn new(repo: Arc<dyn OrgRepository>, owner: impl Into<String>, policy: GraphPolicy) -> Self {
        Self {
            repo,
            owner: owner.into(),
            graph: OrgGraph::new(policy),
        }
    }

    /// Create a service and fetch the owner's graph from the backend.
    pub fn load(
        repo: Arc<dyn OrgRepository>,
        owner: impl Into<String>,
        policy: GraphPolicy,
    ) -> ApplicationResult<Self> {
        let mut service = Self::new(repo, owner, policy);
        service.reload()?;
        Ok(service)
    }

    /// Replace the in-memory graph with the backend state.
    #[instrument(level = "debug", skip(self), fields(owner = %self.owner))]
    pub fn reload(&mut self) -> ApplicationResult<()> {
        let (employees, lines) = self
            .repo
            .fetch_all(&self.owner)
            .persist_context("fetch records", &self.owner)?;
        self.graph = OrgGraph::from_records(&employees, &lines, self.graph.policy())?;
        info!(employees = self.graph.len(), "organisation loaded");
        Ok(())
    }

    pub fn graph(&self) -> &OrgGraph {
        &self.graph
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Run a domain mutation and persist its changes, reverting on failure.
    fn apply<T>(
        &mut self,
        action: &str,
        mutate: impl FnOnce(&mut OrgGraph) -> DomainResult<(T, Vec<Change>)>,
    ) -> ApplicationResult<T> {
        let snapshot = self.graph.clone();
        let (value, changes) = mutate(&mut self.graph)?;
        if changes.is_empty() {
            debug!(action, "nothing to persist");
            return Ok(value);
        }
        if let Err(e) = self
            .repo
            .apply_changes(&self.owner, &changes)
            .persist_context(action, &self.owner)
        {
            error!(action, error = %e, "backend write failed, reverting");
            self.graph = snapshot;
            return Err(e);
        }
        debug!(action, changes = changes.len(), "changes persisted");
        Ok(value)
    }

    pub fn add_employee(
        &mut self,
        parent_id: EmployeeId,
        name: &str,
        title: &str,
        is_director: bool,
    ) -> ApplicationResult<EmployeeId> {
        self.apply("add employee", |g| {
            g.add_employee(parent_id, name, title, is_director)
        })
    }

    pub fn rename_employee(
        &mut self,
        id: EmployeeId,
        name: &str,
        title: &str,
    ) -> ApplicationResult<()> {
        self.apply("rename employee", |g| {
            g.rename_employee(id, name, title).map(|c| ((), c))
        })
    }

    pub fn move_employee(&mut self, id: EmployeeId, new_manager: EmployeeId) -> ApplicationResult<()> {
        self.apply("move employee", |g| {
            g.move_employee(id, new_manager).map(|c| ((), c))
        })
    }

    pub fn remove_employee(&mut self, id: EmployeeId) -> ApplicationResult<()> {
        self.apply("remove employee", |g| g.remove_employee(id).map(|c| ((), c)))
    }

    pub fn add_reporting_line(
        &mut self,
        manager_id: EmployeeId,
        employee_id: EmployeeId,
    ) -> ApplicationResult<()> {
        self.apply("add reporting line", |g| {
            g.add_reporting_line(manager_id, employee_id).map(|c| ((), c))
        })
    }

    pub fn remove_reporting_line(
        &mut self,
        manager_id: EmployeeId,
        employee_id: EmployeeId,
    ) -> ApplicationResult<()> {
        self.apply("remove reporting line", |g| {
            g.remove_reporting_line(manager_id, employee_id)
                .map(|c| ((), c))
        })
    }

    /// Drop every employee and line of this owner.
    pub fn reset(&mut self) -> ApplicationResult<()> {
        self.apply("reset", |g| Ok(((), g.reset())))
    }

    /// Secondary reporting lines routed over the geometry `measure` reports.
    pub fn secondary_lines(&self, measure: &dyn Measure) -> Vec<Polyline> {
        let positions = measure.measure(&self.graph);
        compute_secondary_lines(&self.graph.secondary_edges(), &positions)
    }

    /// Resolve a full id, or a query that matches exactly one employee by
    /// id prefix or case-insensitive name.
    pub fn resolve_id(&self, query: &str) -> ApplicationResult<EmployeeId> {
        let query = query.trim();
        if let Ok(id) = query.parse::<EmployeeId>() {
            if self.graph.find(id).is_some() {
                return Ok(id);
            }
        }
        // Id prefixes and names are matched together; any overlap is ambiguous
        let needle = query.to_lowercase().replace('-', "");
        let candidates: Vec<EmployeeId> = self
            .graph
            .employees()
            .filter(|e| {
                let by_prefix = !needle.is_empty()
                    && e.id.to_string().replace('-', "").starts_with(&needle);
                by_prefix || e.name.eq_ignore_ascii_case(query)
            })
            .map(|e| e.id)
            .collect();
        match candidates.as_slice() {
            [id] => Ok(*id),
            [] => Err(ApplicationError::UnknownEmployee(query.to_string())),
            many => Err(ApplicationError::AmbiguousEmployee {
                query: query.to_string(),
                matches: many.len(),
            }),
        }
    }
}
