use std::collections::HashSet;

/// A pure predicate deciding whether a referenced type name is in scope.
///
/// Named as a trait rather than a bare `Fn(&str) -> bool` alias so
/// implementors (a blacklist, a package allowlist, a closure) read as
/// first-class collaborators at call sites instead of anonymous
/// predicates.
pub trait ScanFilter: Send + Sync {
    /// Returns `true` if `dotted_name` is in scope for recording ("not
    /// blacklisted").
    fn is_allowed(&self, dotted_name: &str) -> bool;
}

/// Accepts every name; the default when the caller supplied no blacklist.
pub struct AllowAll;

impl ScanFilter for AllowAll {
    fn is_allowed(&self, _dotted_name: &str) -> bool {
        true
    }
}

/// Rejects names (or package prefixes ending in `.`) present in a
/// caller-supplied blacklist.
pub struct Blacklist {
    prefixes: HashSet<String>,
}

impl Blacklist {
    pub fn new(prefixes: impl IntoIterator<Item = String>) -> Self {
        Blacklist {
            prefixes: prefixes.into_iter().collect(),
        }
    }
}

impl ScanFilter for Blacklist {
    fn is_allowed(&self, dotted_name: &str) -> bool {
        if self.prefixes.contains(dotted_name) {
            return false;
        }
        !self
            .prefixes
            .iter()
            .any(|p| p.ends_with('.') && dotted_name.starts_with(p.as_str()))
    }
}

impl<F> ScanFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_allowed(&self, dotted_name: &str) -> bool {
        self(dotted_name)
    }
}
