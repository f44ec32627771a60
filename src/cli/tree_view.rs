//! termtree rendering of an organisation graph

use std::collections::HashMap;

use generational_arena::Index;
use itertools::Itertools;
use termtree::Tree;

use crate::domain::{Employee, OrgGraph};

/// `Name (Title) [short-id]`, followed by secondary managers if any.
pub fn employee_label(graph: &OrgGraph, employee: &Employee) -> String {
    let mut label = format!("{} [{}]", employee, employee.id.short());
    if !employee.secondary_managers().is_empty() {
        let also = employee
            .secondary_managers()
            .iter()
            .filter_map(|&m| graph.find(m))
            .map(|m| m.name.as_str())
            .join(", ");
        label.push_str(&format!(" ⇢ also reports to: {}", also));
    }
    label
}

/// Tree rooted at the company sentinel, labelled with `root_label`.
///
/// Subtrees are assembled bottom-up from a post-order walk, so chain depth
/// does not grow the call stack.
pub fn org_tree(graph: &OrgGraph, root_label: &str) -> Tree<String> {
    let arena = graph.arena();
    let mut built: HashMap<Index, Tree<String>> = HashMap::new();
    for (idx, node) in arena.iter_postorder() {
        let label = if idx == arena.root() {
            root_label.to_string()
        } else {
            employee_label(graph, &node.employee)
        };
        let mut tree = Tree::new(label);
        for child in &node.children {
            if let Some(subtree) = built.remove(child) {
                tree.push(subtree);
            }
        }
        built.insert(idx, tree);
    }
    built
        .remove(&arena.root())
        .unwrap_or_else(|| Tree::new(root_label.to_string()))
}
