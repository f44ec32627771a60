//! Arena-backed employee tree (the graph store).

use std::collections::{HashMap, HashSet, VecDeque};

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{Employee, EmployeeId};

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Employee payload, including its `reports_to` back-references
    pub employee: Employee,
    /// Index of the primary manager's node, None for the root
    pub parent: Option<Index>,
    /// Direct reports along the primary reporting line, in insertion order
    pub children: Vec<Index>,
}

/// Arena-based tree holding one organisation.
///
/// There is exactly one root per arena: a sentinel employee with empty name
/// and title that stands for the company itself. The arena owns the
/// parent/child structure; `reports_to` lists are back-references only.
#[derive(Debug, Clone)]
pub struct OrgArena {
    arena: Arena<TreeNode>,
    root: Index,
    ids: HashMap<EmployeeId, Index>,
}

impl Default for OrgArena {
    fn default() -> Self {
        Self::new()
    }
}

impl OrgArena {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root_employee = Employee::new("", "");
        let root_id = root_employee.id;
        let root = arena.insert(TreeNode {
            employee: root_employee,
            parent: None,
            children: Vec::new(),
        });
        let mut ids = HashMap::new();
        ids.insert(root_id, root);
        Self { arena, root, ids }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_id(&self) -> EmployeeId {
        self.arena[self.root].employee.id
    }

    pub fn is_root(&self, id: EmployeeId) -> bool {
        self.root_id() == id
    }

    /// Number of employees, root excluded.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EmployeeId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn index_of(&self, id: EmployeeId) -> Option<Index> {
        self.ids.get(&id).copied()
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, id: EmployeeId) -> Option<&Employee> {
        self.index_of(id)
            .and_then(|idx| self.get_node(idx))
            .map(|node| &node.employee)
    }

    pub(crate) fn find_mut(&mut self, id: EmployeeId) -> Option<&mut Employee> {
        let idx = self.index_of(id)?;
        self.get_node_mut(idx).map(|node| &mut node.employee)
    }

    /// Structural parent (primary manager, or the root for directors).
    pub fn parent_of(&self, id: EmployeeId) -> Option<EmployeeId> {
        let node = self.get_node(self.index_of(id)?)?;
        let parent = self.get_node(node.parent?)?;
        Some(parent.employee.id)
    }

    pub fn children_of(&self, id: EmployeeId) -> Option<Vec<EmployeeId>> {
        let node = self.get_node(self.index_of(id)?)?;
        Some(self.ids_of(&node.children))
    }

    pub fn has_children(&self, id: EmployeeId) -> bool {
        self.index_of(id)
            .and_then(|idx| self.get_node(idx))
            .map(|node| !node.children.is_empty())
            .unwrap_or(false)
    }

    pub fn director_count(&self) -> usize {
        self.arena[self.root].children.len()
    }

    fn ids_of(&self, indices: &[Index]) -> Vec<EmployeeId> {
        indices
            .iter()
            .filter_map(|&idx| self.get_node(idx))
            .map(|node| node.employee.id)
            .collect()
    }

    /// Insert a new employee as last child of `parent`.
    #[instrument(level = "trace", skip(self, employee), fields(id = %employee.id))]
    pub(crate) fn insert_node(&mut self, employee: Employee, parent: Index) -> Index {
        let id = employee.id;
        let node_idx = self.arena.insert(TreeNode {
            employee,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent) = self.arena.get_mut(parent) {
            parent.children.push(node_idx);
        }
        self.ids.insert(id, node_idx);
        node_idx
    }

    /// Remove a leaf node. Returns None if the node is unknown, the root, or
    /// still has children.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn remove_leaf(&mut self, idx: Index) -> Option<TreeNode> {
        if idx == self.root || !self.get_node(idx)?.children.is_empty() {
            return None;
        }
        self.detach(idx);
        let node = self.arena.remove(idx)?;
        self.ids.remove(&node.employee.id);
        Some(node)
    }

    /// Move `idx` to the end of `new_parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn reattach(&mut self, idx: Index, new_parent: Index) {
        self.detach(idx);
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = Some(new_parent);
        }
        if let Some(parent) = self.arena.get_mut(new_parent) {
            parent.children.push(idx);
        }
    }

    fn detach(&mut self, idx: Index) {
        let parent = self.get_node(idx).and_then(|node| node.parent);
        if let Some(parent) = parent.and_then(|p| self.arena.get_mut(p)) {
            parent.children.retain(|&child| child != idx);
        }
    }

    /// Every manager reachable from `id` by following `reports_to` edges,
    /// secondary lines included. `id` itself is only part of the result if it
    /// sits on a cycle.
    #[instrument(level = "trace", skip(self))]
    pub fn transitive_managers(&self, id: EmployeeId) -> HashSet<EmployeeId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        if let Some(employee) = self.find(id) {
            queue.extend(employee.reports_to.iter().copied());
        }
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(employee) = self.find(current) {
                queue.extend(employee.reports_to.iter().copied());
            }
        }
        visited
    }

    pub fn iter(&self) -> TreeIterator {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator {
        PostOrderIterator::new(self)
    }

    /// Pre-order traversal of every node, root first.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Employee> + '_ {
        self.iter().map(|(_, node)| &node.employee)
    }

    /// Pre-order traversal without the root.
    pub fn employees(&self) -> impl Iterator<Item = &Employee> + '_ {
        self.all_nodes().skip(1)
    }

    /// Number of management levels below the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut heights: HashMap<Index, usize> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let height = node
                .children
                .iter()
                .filter_map(|child| heights.get(child))
                .max()
                .map_or(1, |h| h + 1);
            heights.insert(idx, height);
        }
        heights
            .get(&self.root)
            .copied()
            .unwrap_or(1)
            .saturating_sub(1)
    }
}

impl PartialEq for OrgArena {
    /// Structural equality: same pre-order shape, same fields and
    /// `reports_to` lists at every position.
    fn eq(&self, other: &Self) -> bool {
        if self.arena.len() != other.arena.len() {
            return false;
        }
        self.iter().zip(other.iter()).all(|((_, a), (_, b))| {
            a.employee == b.employee
                && self.ids_of(&a.children) == other.ids_of(&b.children)
        })
    }
}

pub struct TreeIterator<'a> {
    arena: &'a OrgArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a OrgArena) -> Self {
        Self {
            arena,
            stack: vec![arena.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a OrgArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a OrgArena) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
