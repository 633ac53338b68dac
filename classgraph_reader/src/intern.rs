use dashmap::DashMap;
use std::sync::Arc;

/// Deduplicates class/interface/annotation names across every classfile
/// parsed in a scan.
///
/// Both the parallel parser threads and the single-threaded linker need
/// safe concurrent read/write access, so this is backed by `dashmap`
/// rather than a plain `HashMap` behind a lock.
#[derive(Default)]
pub struct StringInterner {
    table: DashMap<Box<str>, Arc<str>>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical `Arc<str>` for `name`, inserting it if this is
    /// the first time it has been seen. Two calls with equal `name`s always
    /// return values that are `Arc::ptr_eq`.
    pub fn intern(&self, name: &str) -> Arc<str> {
        if let Some(existing) = self.table.get(name) {
            return existing.clone();
        }
        // put-if-absent: another thread may have raced us here, in which
        // case entry() resolves to the winner and we discard our arc.
        self.table
            .entry(Box::from(name))
            .or_insert_with(|| Arc::from(name))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interned_names_share_identity() {
        let interner = StringInterner::new();
        let a = interner.intern("java.lang.Object");
        let b = interner.intern("java.lang.Object");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_names_are_distinct() {
        let interner = StringInterner::new();
        let a = interner.intern("A");
        let b = interner.intern("B");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
    }
}
