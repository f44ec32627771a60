//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (OrgRepository)
//! but are themselves concrete structs, not traits.

mod org_chart;

pub use org_chart::OrgChartService;
