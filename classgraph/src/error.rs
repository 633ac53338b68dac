use thiserror::Error;

/// Errors the linker may surface. Per-classfile parse errors never reach
/// here — `classgraph_reader::ClassfileParser::parse` has already turned
/// those into a discarded record and a log entry by the time the linker
/// sees a [`crate::scan::ScanResult`].
///
/// Only duplicate-scan conditions are actually reachable at this layer:
/// everything else about a malformed classfile is swallowed upstream.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("{0} was scanned more than once as a full classfile")]
    DuplicateScannedClass(String),
    #[error("{0} was scanned more than once as a Scala companion object")]
    DuplicateScannedCompanion(String),
    #[error("{0} was scanned more than once as a Scala trait-methods class")]
    DuplicateScannedTraitMethods(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
