//! Star-schema catalogue: table descriptors and foreign-key ordering

pub mod dependencies;
pub mod tables;
pub mod types;

pub use dependencies::DependencyResolver;
pub use tables::{get_table, ALL_TABLES};
pub use types::*;
