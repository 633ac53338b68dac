use classgraph_reader::FieldConstantValue;
use indexmap::IndexSet;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::Arc;

/// The six edge directions a [`ClassInfo`] node can carry.
/// `FieldType` is recorded one-way; every other variant has an inverse
/// maintained alongside it by the linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    SuperClass,
    SubClass,
    ImplementedInterface,
    ImplementingClass,
    Annotation,
    AnnotatedClass,
    FieldType,
}

impl RelationKind {
    /// The edge recorded in the opposite direction when this one is added,
    /// or `None` for the one-way `FieldType` relation.
    pub fn inverse(self) -> Option<RelationKind> {
        match self {
            RelationKind::SuperClass => Some(RelationKind::SubClass),
            RelationKind::SubClass => Some(RelationKind::SuperClass),
            RelationKind::ImplementedInterface => Some(RelationKind::ImplementingClass),
            RelationKind::ImplementingClass => Some(RelationKind::ImplementedInterface),
            RelationKind::Annotation => Some(RelationKind::AnnotatedClass),
            RelationKind::AnnotatedClass => Some(RelationKind::Annotation),
            RelationKind::FieldType => None,
        }
    }
}

/// The category a node is classified under by the query layer's `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassCategory {
    StandardClass,
    Interface,
    Annotation,
    Any,
}

/// One node of the Class Graph: a distinct dotted class name ever observed,
/// whether scanned in full or merely referenced by an edge from another
/// node.
///
/// A node accumulates edges and flags as more records are linked into the
/// shared graph, rather than progressing through a fixed lifecycle.
/// `is_interface`/`is_annotation` are monotonic: callers only ever OR new
/// values in, never clear them.
pub struct ClassInfo {
    pub name: Arc<str>,
    pub is_interface: bool,
    pub is_annotation: bool,
    pub classfile_scanned: bool,
    pub companion_scanned: bool,
    pub trait_methods_scanned: bool,
    pub field_values: HashMap<String, FieldConstantValue>,
    relations: HashMap<RelationKind, IndexSet<ClassRef>>,
}

impl ClassInfo {
    pub fn new(name: Arc<str>) -> Self {
        ClassInfo {
            name,
            is_interface: false,
            is_annotation: false,
            classfile_scanned: false,
            companion_scanned: false,
            trait_methods_scanned: false,
            field_values: HashMap::new(),
            relations: HashMap::new(),
        }
    }

    pub fn direct(&self, relation: RelationKind) -> impl Iterator<Item = &ClassRef> {
        self.relations
            .get(&relation)
            .into_iter()
            .flat_map(|set| set.iter())
    }

    pub(crate) fn add_edge(&mut self, relation: RelationKind, target: ClassRef) {
        self.relations.entry(relation).or_default().insert(target);
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("is_interface", &self.is_interface)
            .field("is_annotation", &self.is_annotation)
            .field("classfile_scanned", &self.classfile_scanned)
            .finish()
    }
}

/// A shared handle to one graph node.
///
/// Wraps `Rc<RefCell<ClassInfo>>` rather than a borrowed reference because
/// the graph grows incrementally across many records instead of being
/// handed out all at once from one owning arena. Equality and hashing key
/// off `name` alone, since that's a node's stable identity.
#[derive(Clone)]
pub struct ClassRef(pub Rc<RefCell<ClassInfo>>);

impl ClassRef {
    pub fn new(info: ClassInfo) -> Self {
        ClassRef(Rc::new(RefCell::new(info)))
    }

    pub fn name(&self) -> Arc<str> {
        self.0.borrow().name.clone()
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.borrow().name == other.0.borrow().name
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.borrow().name.hash(state);
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassRef({})", self.0.borrow().name)
    }
}

/// Whether `node` belongs to `category`.
/// Categories are not mutually exclusive: a node can be both an
/// `Interface` and a `StandardClass` under a pathological classpath (the
/// spec's own note on the `StandardClass` rule being "defensive"), so this
/// is a predicate rather than a single classifying function.
pub fn matches_category(node: &ClassRef, category: ClassCategory) -> bool {
    let info = node.0.borrow();
    match category {
        ClassCategory::Any => true,
        ClassCategory::Annotation => info.is_annotation,
        ClassCategory::Interface => {
            (info.is_interface && !info.is_annotation)
                || info.direct(RelationKind::ImplementingClass).next().is_some()
        }
        ClassCategory::StandardClass => {
            !info.is_annotation
                && (info.direct(RelationKind::SubClass).next().is_some()
                    || info.direct(RelationKind::SuperClass).next().is_some()
                    || !(info.is_interface
                        || info.direct(RelationKind::ImplementingClass).next().is_some()))
        }
    }
}
