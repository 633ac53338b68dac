use crate::class_info::{matches_category, ClassCategory, ClassInfo, ClassRef, RelationKind};
use crate::error::{GraphError, Result};
use classgraph_reader::UnlinkedClassRecord;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Maps a scanned or referenced name onto the Scala "auxiliary class" base
/// name it logically belongs to: a trailing `$` denotes a companion
/// object, a trailing `$class` denotes a trait's default-method holder,
/// and every graph operation is keyed on the base name.
fn base_name(name: &str) -> &str {
    if let Some(stripped) = name.strip_suffix("$class") {
        stripped
    } else if let Some(stripped) = name.strip_suffix('$') {
        stripped
    } else {
        name
    }
}

enum AuxiliaryForm {
    None,
    Companion,
    TraitMethods,
}

fn auxiliary_form(name: &str) -> AuxiliaryForm {
    if name.ends_with("$class") {
        AuxiliaryForm::TraitMethods
    } else if name.ends_with('$') {
        AuxiliaryForm::Companion
    } else {
        AuxiliaryForm::None
    }
}

/// The globally cross-linked Class Graph, built by the single-threaded
/// linker from a sequence of [`UnlinkedClassRecord`]s and queried via
/// [`ClassGraph::direct`], [`ClassGraph::reachable`], and
/// [`ClassGraph::filter`].
///
/// Each record arrives already parsed, so linking has no separate
/// load/link/init phases of its own: it simply folds one record's worth of
/// edges into the shared name→node map at a time.
#[derive(Default)]
pub struct ClassGraph {
    nodes: HashMap<Arc<str>, ClassRef>,
}

impl ClassGraph {
    pub fn new() -> Self {
        ClassGraph::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.nodes.get(base_name(name)).cloned()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ClassRef> {
        self.nodes.values()
    }

    fn get_or_create(&mut self, name: &Arc<str>) -> ClassRef {
        let base = base_name(name);
        if let Some(existing) = self.nodes.get(base) {
            return existing.clone();
        }
        let node = ClassRef::new(ClassInfo::new(Arc::from(base)));
        self.nodes.insert(Arc::from(base), node.clone());
        node
    }

    /// Folds one record into the graph: registers the scan under its
    /// auxiliary form, merges flags and field values onto the node, then
    /// links superclass, interface, annotation, and field-type edges. The
    /// only error this can raise is a duplicate full scan of the same base
    /// name under the same auxiliary form — every other per-classfile
    /// problem was already filtered out by the parser.
    pub fn link_one(&mut self, record: UnlinkedClassRecord) -> Result<()> {
        let class_name = record
            .class_name
            .expect("parser only emits records with a class_name");
        let node = self.get_or_create(&class_name);

        match auxiliary_form(&class_name) {
            AuxiliaryForm::None => {
                if node.0.borrow().classfile_scanned {
                    return Err(GraphError::DuplicateScannedClass(node.name().to_string()));
                }
                node.0.borrow_mut().classfile_scanned = true;
            }
            AuxiliaryForm::Companion => {
                if node.0.borrow().companion_scanned {
                    return Err(GraphError::DuplicateScannedCompanion(node.name().to_string()));
                }
                node.0.borrow_mut().companion_scanned = true;
            }
            AuxiliaryForm::TraitMethods => {
                if node.0.borrow().trait_methods_scanned {
                    return Err(GraphError::DuplicateScannedTraitMethods(
                        node.name().to_string(),
                    ));
                }
                node.0.borrow_mut().trait_methods_scanned = true;
            }
        }

        {
            let mut info = node.0.borrow_mut();
            info.is_interface |= record.is_interface;
            info.is_annotation |= record.is_annotation;
            for (field, value) in record.static_final_field_values {
                info.field_values.insert(field, value);
            }
        }

        if let Some(super_name) = &record.superclass_name {
            let super_node = self.get_or_create(super_name);
            self.add_edge_pair(&node, RelationKind::SuperClass, &super_node);
        }

        for interface_name in &record.implemented_interfaces {
            let interface_node = self.get_or_create(interface_name);
            interface_node.0.borrow_mut().is_interface = true;
            self.add_edge_pair(&node, RelationKind::ImplementedInterface, &interface_node);
        }

        for annotation_name in &record.annotations {
            let annotation_node = self.get_or_create(annotation_name);
            annotation_node.0.borrow_mut().is_annotation = true;
            self.add_edge_pair(&node, RelationKind::Annotation, &annotation_node);
        }

        for field_type_name in &record.field_types {
            let target = self.get_or_create(field_type_name);
            node.0
                .borrow_mut()
                .add_edge(RelationKind::FieldType, target);
        }

        Ok(())
    }

    fn add_edge_pair(&self, from: &ClassRef, relation: RelationKind, to: &ClassRef) {
        from.0.borrow_mut().add_edge(relation, to.clone());
        if let Some(inverse) = relation.inverse() {
            to.0.borrow_mut().add_edge(inverse, from.clone());
        }
    }

    /// Immediate edge targets of `node` along `relation`.
    pub fn direct(&self, node: &ClassRef, relation: RelationKind) -> Vec<ClassRef> {
        node.0.borrow().direct(relation).cloned().collect()
    }

    /// Breadth-first closure of `relation` starting at `node`, excluding
    /// `node` itself, with a visited-set cycle guard so cyclic graphs
    /// still terminate.
    pub fn reachable(&self, node: &ClassRef, relation: RelationKind) -> HashSet<ClassRef> {
        let mut visited: HashSet<ClassRef> = HashSet::new();
        let mut queue: VecDeque<ClassRef> = VecDeque::new();
        queue.push_back(node.clone());
        visited.insert(node.clone());

        let mut result = HashSet::new();
        while let Some(current) = queue.pop_front() {
            for next in current.0.borrow().direct(relation).cloned().collect::<Vec<_>>() {
                if visited.insert(next.clone()) {
                    result.insert(next.clone());
                    queue.push_back(next);
                }
            }
        }
        result
    }

    /// Selects the subset of `nodes` matching any of `categories`,
    /// optionally excluding nodes that were never scanned as a full
    /// classfile (`include_externals = false`). A first pass checks
    /// whether every node already matches, so the common case of "nothing
    /// to filter" returns the input collected straight through without a
    /// second, filtering pass.
    pub fn filter(
        &self,
        nodes: &[ClassRef],
        include_externals: bool,
        categories: &[ClassCategory],
    ) -> Vec<ClassRef> {
        let keep = |n: &ClassRef| {
            (include_externals || n.0.borrow().classfile_scanned)
                && categories.iter().any(|c| matches_category(n, *c))
        };

        if nodes.iter().all(keep) {
            return nodes.to_vec();
        }
        nodes.iter().filter(|n| keep(n)).cloned().collect()
    }
}
