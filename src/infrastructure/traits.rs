//! I/O boundary traits for testability
//!
//! The persistence backend is abstracted behind [`OrgRepository`], allowing
//! services to be tested with in-memory or failing implementations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Change, EmployeeId, EmployeeRecord, ReportingLineRecord};

/// Persistence backend for employees and secondary reporting lines.
///
/// Every call is scoped to one owner; records of other owners are never
/// visible or touched.
pub trait OrgRepository: Send + Sync {
    /// Insert an employee row.
    fn insert_employee(&self, record: &EmployeeRecord) -> io::Result<()>;

    /// Update name and title of an employee row.
    fn update_employee_details(
        &self,
        owner: &str,
        id: EmployeeId,
        name: &str,
        title: &str,
    ) -> io::Result<()>;

    /// Re-parent an employee row (`None` = director).
    fn update_employee_parent(
        &self,
        owner: &str,
        id: EmployeeId,
        parent_id: Option<EmployeeId>,
    ) -> io::Result<()>;

    /// Delete an employee row.
    fn delete_employee(&self, owner: &str, id: EmployeeId) -> io::Result<()>;

    /// Delete every reporting line with `id` as employee or manager.
    fn delete_reporting_lines_for(&self, owner: &str, id: EmployeeId) -> io::Result<()>;

    /// Insert a secondary reporting line.
    fn insert_reporting_line(&self, record: &ReportingLineRecord) -> io::Result<()>;

    /// Delete one reporting line by (employee, manager).
    fn delete_reporting_line(
        &self,
        owner: &str,
        employee_id: EmployeeId,
        manager_id: EmployeeId,
    ) -> io::Result<()>;

    /// Fetch all rows of an owner.
    fn fetch_all(&self, owner: &str)
        -> io::Result<(Vec<EmployeeRecord>, Vec<ReportingLineRecord>)>;

    /// Delete all rows of an owner.
    fn clear(&self, owner: &str) -> io::Result<()>;

    /// Replay the changes of one mutation.
    ///
    /// The default replays them one call at a time. Implementations that can
    /// write a batch atomically should override this.
    fn apply_changes(&self, owner: &str, changes: &[Change]) -> io::Result<()> {
        for change in changes {
            match change {
                Change::InsertEmployee {
                    id,
                    name,
                    title,
                    parent_id,
                } => self.insert_employee(&EmployeeRecord {
                    id: *id,
                    name: name.clone(),
                    title: title.clone(),
                    parent_id: *parent_id,
                    owner: owner.to_string(),
                })?,
                Change::UpdateDetails { id, name, title } => {
                    self.update_employee_details(owner, *id, name, title)?
                }
                Change::UpdateParent { id, parent_id } => {
                    self.update_employee_parent(owner, *id, *parent_id)?
                }
                Change::DeleteEmployee { id } => self.delete_employee(owner, *id)?,
                Change::DeleteLinesFor { id } => self.delete_reporting_lines_for(owner, *id)?,
                Change::InsertLine { employee, manager } => {
                    self.insert_reporting_line(&ReportingLineRecord {
                        employee_id: *employee,
                        manager_id: *manager,
                        owner: owner.to_string(),
                    })?
                }
                Change::DeleteLine { employee, manager } => {
                    self.delete_reporting_line(owner, *employee, *manager)?
                }
                Change::Clear => self.clear(owner)?,
            }
        }
        Ok(())
    }
}

/// All rows of a backend, across owners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgData {
    pub employees: Vec<EmployeeRecord>,
    pub reporting_lines: Vec<ReportingLineRecord>,
}

fn not_found(what: &str, id: EmployeeId) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found: {}", what, id))
}

impl OrgData {
    pub fn for_owner(&self, owner: &str) -> (Vec<EmployeeRecord>, Vec<ReportingLineRecord>) {
        (
            self.employees
                .iter()
                .filter(|e| e.owner == owner)
                .cloned()
                .collect(),
            self.reporting_lines
                .iter()
                .filter(|l| l.owner == owner)
                .cloned()
                .collect(),
        )
    }

    fn employee_mut(&mut self, owner: &str, id: EmployeeId) -> io::Result<&mut EmployeeRecord> {
        self.employees
            .iter_mut()
            .find(|e| e.owner == owner && e.id == id)
            .ok_or_else(|| not_found("employee", id))
    }

    /// Apply one change to the rows of `owner`.
    pub fn apply(&mut self, owner: &str, change: &Change) -> io::Result<()> {
        match change {
            Change::InsertEmployee {
                id,
                name,
                title,
                parent_id,
            } => {
                if self.employees.iter().any(|e| e.id == *id) {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("employee already exists: {}", id),
                    ));
                }
                self.employees.push(EmployeeRecord {
                    id: *id,
                    name: name.clone(),
                    title: title.clone(),
                    parent_id: *parent_id,
                    owner: owner.to_string(),
                });
            }
            Change::UpdateDetails { id, name, title } => {
                let record = self.employee_mut(owner, *id)?;
                record.name = name.clone();
                record.title = title.clone();
            }
            Change::UpdateParent { id, parent_id } => {
                self.employee_mut(owner, *id)?.parent_id = *parent_id;
            }
            Change::DeleteEmployee { id } => {
                self.employees.retain(|e| !(e.owner == owner && e.id == *id));
            }
            Change::DeleteLinesFor { id } => {
                self.reporting_lines.retain(|l| {
                    !(l.owner == owner && (l.employee_id == *id || l.manager_id == *id))
                });
            }
            Change::InsertLine { employee, manager } => {
                let exists = self.reporting_lines.iter().any(|l| {
                    l.owner == owner && l.employee_id == *employee && l.manager_id == *manager
                });
                if !exists {
                    self.reporting_lines.push(ReportingLineRecord {
                        employee_id: *employee,
                        manager_id: *manager,
                        owner: owner.to_string(),
                    });
                }
            }
            Change::DeleteLine { employee, manager } => {
                self.reporting_lines.retain(|l| {
                    !(l.owner == owner && l.employee_id == *employee && l.manager_id == *manager)
                });
            }
            Change::Clear => {
                self.employees.retain(|e| e.owner != owner);
                self.reporting_lines.retain(|l| l.owner != owner);
            }
        }
        Ok(())
    }

    /// Apply a batch; on error `self` is left untouched.
    pub fn apply_all(&mut self, owner: &str, changes: &[Change]) -> io::Result<()> {
        let mut next = self.clone();
        for change in changes {
            next.apply(owner, change)?;
        }
        *self = next;
        Ok(())
    }
}

fn employee_insert(record: &EmployeeRecord) -> Change {
    Change::InsertEmployee {
        id: record.id,
        name: record.name.clone(),
        title: record.title.clone(),
        parent_id: record.parent_id,
    }
}

fn line_insert(record: &ReportingLineRecord) -> Change {
    Change::InsertLine {
        employee: record.employee_id,
        manager: record.manager_id,
    }
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// TOML file backend.
///
/// One document holds the rows of all owners. Every batch is a single
/// read-modify-write, replaced atomically via a temp file in the same
/// directory.
#[derive(Debug)]
pub struct TomlFileRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl TomlFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> io::Result<OrgData> {
        if !self.path.exists() {
            return Ok(OrgData::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("parse {}: {}", self.path.display(), e),
            )
        })
    }

    fn write(&self, data: &OrgData) -> io::Result<()> {
        let content = toml::to_string_pretty(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, changes), fields(path = %self.path.display()))]
    fn modify(&self, owner: &str, changes: &[Change]) -> io::Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "repository lock poisoned"))?;
        let mut data = self.read()?;
        data.apply_all(owner, changes)?;
        self.write(&data)?;
        debug!(changes = changes.len(), "data file written");
        Ok(())
    }
}

impl OrgRepository for TomlFileRepository {
    fn insert_employee(&self, record: &EmployeeRecord) -> io::Result<()> {
        self.modify(&record.owner, &[employee_insert(record)])
    }

    fn update_employee_details(
        &self,
        owner: &str,
        id: EmployeeId,
        name: &str,
        title: &str,
    ) -> io::Result<()> {
        self.modify(
            owner,
            &[Change::UpdateDetails {
                id,
                name: name.to_string(),
                title: title.to_string(),
            }],
        )
    }

    fn update_employee_parent(
        &self,
        owner: &str,
        id: EmployeeId,
        parent_id: Option<EmployeeId>,
    ) -> io::Result<()> {
        self.modify(owner, &[Change::UpdateParent { id, parent_id }])
    }

    fn delete_employee(&self, owner: &str, id: EmployeeId) -> io::Result<()> {
        self.modify(owner, &[Change::DeleteEmployee { id }])
    }

    fn delete_reporting_lines_for(&self, owner: &str, id: EmployeeId) -> io::Result<()> {
        self.modify(owner, &[Change::DeleteLinesFor { id }])
    }

    fn insert_reporting_line(&self, record: &ReportingLineRecord) -> io::Result<()> {
        self.modify(&record.owner, &[line_insert(record)])
    }

    fn delete_reporting_line(
        &self,
        owner: &str,
        employee_id: EmployeeId,
        manager_id: EmployeeId,
    ) -> io::Result<()> {
        self.modify(
            owner,
            &[Change::DeleteLine {
                employee: employee_id,
                manager: manager_id,
            }],
        )
    }

    fn fetch_all(
        &self,
        owner: &str,
    ) -> io::Result<(Vec<EmployeeRecord>, Vec<ReportingLineRecord>)> {
        Ok(self.read()?.for_owner(owner))
    }

    fn clear(&self, owner: &str) -> io::Result<()> {
        self.modify(owner, &[Change::Clear])
    }

    fn apply_changes(&self, owner: &str, changes: &[Change]) -> io::Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.modify(owner, changes)
    }
}

/// In-process backend, mainly for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    data: Mutex<OrgData>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all rows, across owners.
    pub fn snapshot(&self) -> OrgData {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn modify(&self, owner: &str, changes: &[Change]) -> io::Result<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "repository lock poisoned"))?;
        data.apply_all(owner, changes)
    }
}

impl OrgRepository for InMemoryRepository {
    fn insert_employee(&self, record: &EmployeeRecord) -> io::Result<()> {
        self.modify(&record.owner, &[employee_insert(record)])
    }

    fn update_employee_details(
        &self,
        owner: &str,
        id: EmployeeId,
        name: &str,
        title: &str,
    ) -> io::Result<()> {
        self.modify(
            owner,
            &[Change::UpdateDetails {
                id,
                name: name.to_string(),
                title: title.to_string(),
            }],
        )
    }

    fn update_employee_parent(
        &self,
        owner: &str,
        id: EmployeeId,
        parent_id: Option<EmployeeId>,
    ) -> io::Result<()> {
        self.modify(owner, &[Change::UpdateParent { id, parent_id }])
    }

    fn delete_employee(&self, owner: &str, id: EmployeeId) -> io::Result<()> {
        self.modify(owner, &[Change::DeleteEmployee { id }])
    }

    fn delete_reporting_lines_for(&self, owner: &str, id: EmployeeId) -> io::Result<()> {
        self.modify(owner, &[Change::DeleteLinesFor { id }])
    }

    fn insert_reporting_line(&self, record: &ReportingLineRecord) -> io::Result<()> {
        self.modify(&record.owner, &[line_insert(record)])
    }

    fn delete_reporting_line(
        &self,
        owner: &str,
        employee_id: EmployeeId,
        manager_id: EmployeeId,
    ) -> io::Result<()> {
        self.modify(
            owner,
            &[Change::DeleteLine {
                employee: employee_id,
                manager: manager_id,
            }],
        )
    }

    fn fetch_all(
        &self,
        owner: &str,
    ) -> io::Result<(Vec<EmployeeRecord>, Vec<ReportingLineRecord>)> {
        let data = self
            .data
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "repository lock poisoned"))?;
        Ok(data.for_owner(owner))
    }

    fn clear(&self, owner: &str) -> io::Result<()> {
        self.modify(owner, &[Change::Clear])
    }

    fn apply_changes(&self, owner: &str, changes: &[Change]) -> io::Result<()> {
        self.modify(owner, changes)
    }
}
