//! Organisation chart manager
//!
//! Employees form a tree under an invisible root. Every employee keeps an
//! ordered list of managers: the first one is its place in the tree, the
//! rest are secondary reporting lines drawn over the tree as orthogonal
//! polylines.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
