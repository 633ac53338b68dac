use std::collections::{HashMap, HashSet};

/// Pre-registration of which static final fields to capture, keyed by
/// dotted class name. This crate only ever reads it; building and
/// maintaining it is the caller's job.
pub type FieldsWanted = HashMap<String, HashSet<String>>;
