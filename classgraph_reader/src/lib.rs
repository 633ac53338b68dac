//! Classfile reading: turns a single `.class` byte stream into an
//! [`class_record::UnlinkedClassRecord`], the unit the `classgraph` crate's
//! linker consumes.
//!
//! This crate owns everything that is purely per-classfile and
//! embarrassingly parallel: byte-level reading, constant-pool resolution,
//! modified UTF-8 decoding, annotation/attribute skipping, and field-type
//! extraction. It never builds a cross-class graph — that is `classgraph`'s
//! job, running its linking phase single-threaded over the records this
//! crate produces.

pub mod access_flags;
mod annotation_walker;
mod attribute_info;
pub mod byte_reader;
pub mod class_file_error;
pub mod class_record;
pub mod constant_pool;
mod field_type_extractor;
pub mod intern;
pub mod match_spec;
pub mod modified_utf8;
pub mod parser;
pub mod scan_filter;

pub use class_file_error::{ClassFileError, Result};
pub use class_record::{FieldConstantValue, LogEntry, ParseLog, ParseOutcome, UnlinkedClassRecord};
pub use intern::StringInterner;
pub use match_spec::FieldsWanted;
pub use parser::ClassfileParser;
pub use scan_filter::{AllowAll, Blacklist, ScanFilter};
