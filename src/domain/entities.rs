//! Domain entities: core data structures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, immutable employee identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(Uuid);

impl EmployeeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used for compact display.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EmployeeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A node of the organisation chart.
///
/// `reports_to[0]` is the primary manager and always equals the node's parent
/// in the tree. Further entries are secondary managers without a tree edge.
/// Directors (children of the root) have an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub title: String,
    pub reports_to: Vec<EmployeeId>,
}

impl Employee {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: EmployeeId::new(),
            name: name.into(),
            title: title.into(),
            reports_to: Vec::new(),
        }
    }

    pub fn primary_manager(&self) -> Option<EmployeeId> {
        self.reports_to.first().copied()
    }

    pub fn secondary_managers(&self) -> &[EmployeeId] {
        self.reports_to.get(1..).unwrap_or(&[])
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.title)
    }
}

/// Persisted employee row. `parent_id = None` marks a director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EmployeeId>,
    pub owner: String,
}

/// Persisted secondary reporting line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingLineRecord {
    pub employee_id: EmployeeId,
    pub manager_id: EmployeeId,
    pub owner: String,
}

/// One entry of an employee's `reports_to` list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingEdge {
    pub manager: EmployeeId,
    pub employee: EmployeeId,
    /// Position in `reports_to`; 0 is the primary line.
    pub rank: usize,
}

impl ReportingEdge {
    pub fn is_primary(&self) -> bool {
        self.rank == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Measured box of a rendered node, in screen units (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y)
    }

    pub fn bottom_center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height)
    }
}

/// Drawable path of a secondary reporting line, employee end first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub manager: EmployeeId,
    pub employee: EmployeeId,
    pub points: Vec<Point>,
}

impl Polyline {
    pub fn segments(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}
