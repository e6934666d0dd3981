//! Text-level analysis of downloaded sources.
//!
//! Stages run in order: [`grid`] and [`parser`] work per file, [`graph`]
//! restricts the parsed relations to the repository's own classes, then
//! [`dia`] and [`uml`] derive the published datasets.

pub mod dia;
pub mod graph;
pub mod grid;
pub mod parser;
pub mod uml;

pub use dia::calculate_dia;
pub use graph::{ClassGraph, build_graph};
pub use grid::{analyze_grid, analyze_grid_file};
pub use parser::{parse_class, parse_classes};
pub use uml::{RelationKind, build_uml};
