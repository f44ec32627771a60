//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod graph;
pub mod layout;

pub use arena::{OrgArena, TreeNode};
pub use builder::GraphBuilder;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use graph::{Change, GraphPolicy, OrgGraph};
pub use layout::{compute_secondary_lines, LayoutConfig, Measure, TreeLayout};

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
