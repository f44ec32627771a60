//! Layout projection: node boxes and secondary reporting-line routes.
//!
//! Primary lines are drawn by the tree layout itself. Secondary lines are
//! derived here from measured node boxes, which come from an injected
//! [`Measure`] implementation so the projection stays pure.

use std::collections::HashMap;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{instrument, trace};

use crate::domain::entities::{EmployeeId, Point, Polyline, Rect, ReportingEdge};
use crate::domain::graph::OrgGraph;

/// Source of on-screen node geometry after a render pass.
pub trait Measure {
    /// Snapshot of node id -> box. Nodes that are not laid out are absent.
    fn measure(&self, graph: &OrgGraph) -> HashMap<EmployeeId, Rect>;
}

/// Route every secondary edge from the employee's top-centre to the
/// manager's bottom-centre as a vertical/horizontal/vertical path.
///
/// Primary edges and edges with an unmeasured endpoint yield no line.
#[instrument(level = "debug", skip_all, fields(edges = edges.len()))]
pub fn compute_secondary_lines(
    edges: &[ReportingEdge],
    positions: &HashMap<EmployeeId, Rect>,
) -> Vec<Polyline> {
    edges
        .iter()
        .filter(|edge| !edge.is_primary())
        .filter_map(|edge| {
            let (Some(employee), Some(manager)) =
                (positions.get(&edge.employee), positions.get(&edge.manager))
            else {
                trace!(employee = %edge.employee, manager = %edge.manager, "endpoint not measured");
                return None;
            };
            let start = employee.top_center();
            let end = manager.bottom_center();
            let mid_y = (start.y + end.y) / 2.0;
            Some(Polyline {
                manager: edge.manager,
                employee: edge.employee,
                points: vec![
                    start,
                    Point::new(start.x, mid_y),
                    Point::new(end.x, mid_y),
                    end,
                ],
            })
        })
        .collect()
}

/// Box sizes and spacing for [`TreeLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between neighbouring boxes
    pub h_gap: f64,
    /// Vertical gap between management levels
    pub v_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 160.0,
            node_height: 60.0,
            h_gap: 20.0,
            v_gap: 40.0,
        }
    }
}

/// Tidy top-down tree layout.
///
/// Leaves take consecutive horizontal slots in pre-order, every parent is
/// centred over its first and last child, directors form the top row. The
/// root sentinel is not measured.
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    config: LayoutConfig,
}

impl TreeLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    fn center_of_slot(&self, slot: f64) -> f64 {
        slot * (self.config.node_width + self.config.h_gap) + self.config.node_width / 2.0
    }
}

impl Measure for TreeLayout {
    #[instrument(level = "debug", skip_all)]
    fn measure(&self, graph: &OrgGraph) -> HashMap<EmployeeId, Rect> {
        let arena = graph.arena();
        let root = arena.root();

        // Pre-order visits parents first; directors are level 0
        let mut levels: HashMap<Index, usize> = HashMap::new();
        for (idx, node) in arena.iter().skip(1) {
            let level = node
                .parent
                .and_then(|p| levels.get(&p))
                .map_or(0, |l| l + 1);
            levels.insert(idx, level);
        }

        // Post-order visits leaves left to right and children before parents
        let mut centers: HashMap<Index, f64> = HashMap::new();
        let mut out = HashMap::new();
        let mut next_slot = 0.0;
        for (idx, node) in arena.iter_postorder() {
            if idx == root {
                continue;
            }
            let first = node.children.first().and_then(|c| centers.get(c));
            let last = node.children.last().and_then(|c| centers.get(c));
            let center = match (first, last) {
                (Some(first), Some(last)) => (first + last) / 2.0,
                _ => {
                    let slot = next_slot;
                    next_slot += 1.0;
                    self.center_of_slot(slot)
                }
            };
            centers.insert(idx, center);
            let level = levels.get(&idx).copied().unwrap_or_default();
            out.insert(
                node.employee.id,
                Rect::new(
                    center - self.config.node_width / 2.0,
                    level as f64 * (self.config.node_height + self.config.v_gap),
                    self.config.node_width,
                    self.config.node_height,
                ),
            );
        }
        out
    }
}

/// Fixed snapshot, e.g. geometry reported back by a UI.
impl Measure for HashMap<EmployeeId, Rect> {
    fn measure(&self, _graph: &OrgGraph) -> HashMap<EmployeeId, Rect> {
        self.clone()
    }
}
