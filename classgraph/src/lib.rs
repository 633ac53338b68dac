//! The cross-linked Class Graph: folds [`classgraph_reader::UnlinkedClassRecord`]s
//! from many classfiles into one queryable graph of super-type, interface,
//! annotation, field-type, and static-final-field-constant relationships.
//!
//! Linking is single-threaded (see `class_graph::ClassGraph::link_one`);
//! parsing may run in parallel ahead of it (see `scan::scan_sources`).

pub mod class_graph;
pub mod class_info;
pub mod error;
pub mod scan;

pub use class_graph::ClassGraph;
pub use class_info::{matches_category, ClassCategory, ClassInfo, ClassRef, RelationKind};
pub use error::{GraphError, Result};
pub use scan::{scan_sources, ScanResult};
