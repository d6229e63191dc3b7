//! Re-typing of stored nodes along the synthesized type hierarchy.
//!
//! A stored node carries one label per type of its ancestor closure. When it was saved as a more
//! specific type than the one it is currently loaded as, the store returns extra labels that
//! [`Retyper::downcast`] uses to find the most specific type.

use crate::error::RetypeError;
use crate::model::NodeType;
use crate::registry::Registry;
use oxrdf::Literal;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::sync::Arc;
use tracing::debug;

/// A stored node loaded as one of the synthesized node types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Identity of the record in the store.
    pub id: String,
    pub node_type: Arc<NodeType>,
    /// Field values, keyed by field name.
    pub values: BTreeMap<String, Literal>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: Arc<NodeType>) -> Self {
        Self {
            id: id.into(),
            node_type,
            values: BTreeMap::new(),
        }
    }

    /// The name of the type the node is loaded as.
    pub fn type_name(&self) -> &str {
        &self.node_type.name
    }

    pub fn value(&self, field: &str) -> Option<&Literal> {
        self.values.get(field)
    }
}

/// The storage operations re-typing relies on.
pub trait NodeStore {
    type Error: Error + Send + Sync + 'static;

    /// Loads the record `id` as a node of the given type, without its field values.
    fn inflate(&self, node_type: &Arc<NodeType>, id: &str) -> Result<Node, Self::Error>;

    /// All the labels attached to the stored record of the node.
    fn labels(&self, node: &Node) -> Result<BTreeSet<String>, Self::Error>;

    /// Reloads the field values of the node from the store.
    fn refresh(&self, node: &mut Node) -> Result<(), Self::Error>;
}

/// Moves nodes up and down the type hierarchy of a [`Registry`].
#[derive(Debug)]
pub struct Retyper<'a, S> {
    registry: &'a Registry,
    store: &'a S,
}

impl<'a, S: NodeStore> Retyper<'a, S> {
    pub fn new(registry: &'a Registry, store: &'a S) -> Self {
        Self { registry, store }
    }

    /// The labels implied by the type the node is loaded as.
    pub fn ancestor_labels<'n>(&self, node: &'n Node) -> &'n BTreeSet<String> {
        node.node_type.ancestor_labels()
    }

    /// The labels actually attached to the stored record.
    pub fn all_attached_labels(&self, node: &Node) -> Result<BTreeSet<String>, RetypeError> {
        self.store.labels(node).map_err(RetypeError::storage)
    }

    /// Loads the record of the node again as the type `name`.
    pub fn reload_as(&self, node: &Node, name: &str) -> Result<Node, RetypeError> {
        let node_type = self
            .registry
            .node_type(name)
            .ok_or_else(|| RetypeError::UnknownType(name.into()))?;
        let mut reloaded = self
            .store
            .inflate(node_type, &node.id)
            .map_err(RetypeError::storage)?;
        self.store
            .refresh(&mut reloaded)
            .map_err(RetypeError::storage)?;
        Ok(reloaded)
    }

    /// Views the node as one of the ancestors of its current type.
    ///
    /// The node and its stored record are left untouched.
    pub fn upcast(&self, node: &Node, target: &str) -> Result<Node, RetypeError> {
        if !self.ancestor_labels(node).contains(target) {
            return Err(RetypeError::InvalidUpcast {
                target: target.into(),
                current: node.type_name().into(),
            });
        }
        debug!(node = %node.id, from = node.type_name(), to = target, "upcasting");
        self.reload_as(node, target)
    }

    /// Views the node as a more specific type it has been stored as.
    ///
    /// Without `target`, the most specific type is guessed from the extra labels of the record.
    /// A node without extra labels is returned as is.
    pub fn downcast(&self, node: Node, target: Option<&str>) -> Result<Node, RetypeError> {
        let Some(resolved) = self.resolve(&node, target)? else {
            return Ok(node);
        };
        debug!(node = %node.id, from = node.type_name(), to = %resolved, "downcasting");
        self.reload_as(&node, &resolved)
    }

    /// The name of the most specific type of the node, without loading it.
    pub fn primary_label(&self, node: &Node) -> Result<String, RetypeError> {
        Ok(self
            .resolve(node, None)?
            .unwrap_or_else(|| node.type_name().into()))
    }

    /// The type to downcast to, `None` if the record has no label beyond the current ancestors.
    fn resolve(&self, node: &Node, target: Option<&str>) -> Result<Option<String>, RetypeError> {
        let attached = self.all_attached_labels(node)?;
        let extra = attached
            .difference(self.ancestor_labels(node))
            .collect::<Vec<_>>();
        if extra.is_empty() {
            return Ok(None);
        }
        if let Some(target) = target {
            return if extra.iter().any(|label| *label == target) {
                Ok(Some(target.into()))
            } else {
                Err(RetypeError::InvalidDowncast {
                    target: target.into(),
                    current: node.type_name().into(),
                })
            };
        }
        if let [label] = extra.as_slice() {
            return Ok(Some((*label).clone()));
        }
        // Largest closure wins, on ties the last label in order wins
        let mut candidates = Vec::with_capacity(extra.len());
        for label in extra {
            let node_type = self
                .registry
                .node_type(label)
                .ok_or_else(|| RetypeError::UnknownType(label.clone()))?;
            candidates.push(node_type);
        }
        Ok(candidates
            .into_iter()
            .max_by_key(|node_type| node_type.depth())
            .map(|node_type| node_type.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ModelExtensions;
    use crate::schema::{ClassEntry, SchemaTables};
    use std::cell::RefCell;
    use std::convert::Infallible;

    /// Records labels by node identity.
    #[derive(Default)]
    struct MemoryStore {
        labels: BTreeMap<String, BTreeSet<String>>,
        inflated: RefCell<Vec<String>>,
    }

    impl MemoryStore {
        fn with(mut self, id: &str, labels: &[&str]) -> Self {
            self.labels.insert(
                id.into(),
                labels.iter().map(|label| (*label).to_owned()).collect(),
            );
            self
        }
    }

    impl NodeStore for MemoryStore {
        type Error = Infallible;

        fn inflate(&self, node_type: &Arc<NodeType>, id: &str) -> Result<Node, Infallible> {
            self.inflated.borrow_mut().push(node_type.name.clone());
            Ok(Node::new(id, Arc::clone(node_type)))
        }

        fn labels(&self, node: &Node) -> Result<BTreeSet<String>, Infallible> {
            Ok(self.labels.get(&node.id).cloned().unwrap_or_default())
        }

        fn refresh(&self, node: &mut Node) -> Result<(), Infallible> {
            node.values
                .insert("value".into(), Literal::new_simple_literal("refreshed"));
            Ok(())
        }
    }

    /// Entity <- Actor <- Person, Actor <- Group, Person + Group <- Member
    fn registry() -> Registry {
        let mut tables = SchemaTables::new();
        for (name, parents) in [
            ("Entity", &[][..]),
            ("Actor", &["Entity"][..]),
            ("Person", &["Actor"][..]),
            ("Group", &["Actor"][..]),
            ("Member", &["Person", "Group"][..]),
            ("Place", &["Entity"][..]),
        ] {
            let mut entry = ClassEntry::placeholder(name);
            entry.sub_class_of = parents.iter().map(|p| (*p).to_owned()).collect();
            tables.insert_class(entry);
        }
        let mut registry = Registry::new();
        registry
            .extend(&tables, &ModelExtensions::default())
            .unwrap();
        registry.freeze();
        registry
    }

    fn node(registry: &Registry, name: &str) -> Node {
        Node::new("n1", Arc::clone(registry.node_type(name).unwrap()))
    }

    #[test]
    fn upcast_to_ancestor() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Actor", "Person"]);
        let retyper = Retyper::new(&registry, &store);
        let person = node(&registry, "Person");
        let actor = retyper.upcast(&person, "Actor").unwrap();
        assert_eq!(actor.type_name(), "Actor");
        assert_eq!(actor.id, "n1");
        assert_eq!(actor.value("value").map(Literal::value), Some("refreshed"));
        assert_eq!(person.type_name(), "Person");
    }

    #[test]
    fn upcast_to_non_ancestor() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Actor", "Person"]);
        let retyper = Retyper::new(&registry, &store);
        let person = node(&registry, "Person");
        let error = retyper.upcast(&person, "Place").unwrap_err();
        assert!(matches!(
            error,
            RetypeError::InvalidUpcast { ref target, ref current } if target == "Place" && current == "Person"
        ));
        assert!(store.inflated.borrow().is_empty());
    }

    #[test]
    fn downcast_without_extra_labels() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Actor"]);
        let retyper = Retyper::new(&registry, &store);
        let actor = node(&registry, "Actor");
        let same = retyper.downcast(actor.clone(), None).unwrap();
        assert_eq!(same, actor);
        assert!(store.inflated.borrow().is_empty());
        assert_eq!(retyper.primary_label(&actor).unwrap(), "Actor");
    }

    #[test]
    fn downcast_with_one_extra_label() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Actor", "Person"]);
        let retyper = Retyper::new(&registry, &store);
        let actor = node(&registry, "Actor");
        assert_eq!(retyper.primary_label(&actor).unwrap(), "Person");
        let person = retyper.downcast(actor, None).unwrap();
        assert_eq!(person.type_name(), "Person");
        assert_eq!(*store.inflated.borrow(), ["Person"]);
    }

    #[test]
    fn downcast_picks_the_deepest_label() {
        let registry = registry();
        let store = MemoryStore::default().with(
            "n1",
            &["Entity", "Actor", "Person", "Group", "Member"],
        );
        let retyper = Retyper::new(&registry, &store);
        let entity = node(&registry, "Entity");
        assert_eq!(retyper.primary_label(&entity).unwrap(), "Member");
        assert_eq!(
            retyper.downcast(entity, None).unwrap().type_name(),
            "Member"
        );
    }

    #[test]
    fn downcast_tie_takes_the_last_label() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Actor", "Person", "Group"]);
        let retyper = Retyper::new(&registry, &store);
        let actor = node(&registry, "Actor");
        assert_eq!(retyper.primary_label(&actor).unwrap(), "Person");
    }

    #[test]
    fn downcast_to_explicit_target() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Actor", "Person", "Group"]);
        let retyper = Retyper::new(&registry, &store);
        let actor = node(&registry, "Actor");
        let group = retyper.downcast(actor.clone(), Some("Group")).unwrap();
        assert_eq!(group.type_name(), "Group");
        let error = retyper.downcast(actor, Some("Place")).unwrap_err();
        assert!(matches!(error, RetypeError::InvalidDowncast { .. }));
    }

    #[test]
    fn unknown_extra_labels() {
        let registry = registry();
        let store = MemoryStore::default().with("n1", &["Entity", "Person", "Legacy"]);
        let retyper = Retyper::new(&registry, &store);
        let entity = node(&registry, "Entity");
        assert!(matches!(
            retyper.primary_label(&entity).unwrap_err(),
            RetypeError::UnknownType(label) if label == "Legacy"
        ));
    }
}
