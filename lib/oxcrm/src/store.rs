//! A [`NodeStore`] backed by an in-memory Oxigraph store.
//!
//! Nodes are IRIs in a namespace, their labels are `rdf:type` objects and their fields are literal
//! valued triples:
//!
//! ```text
//! <urn:oxcrm:node/1> rdf:type <urn:oxcrm:type/E21Person>, <urn:oxcrm:type/E39Actor> ;
//!     <urn:oxcrm:field/value> "Ada" ;
//!     <urn:oxcrm:relationship/p1_is_identified_by> <urn:oxcrm:node/2> .
//! ```

use crate::error::StoreError;
use crate::field::VALUE_FIELD;
use crate::model::NodeType;
use crate::retype::{Node, NodeStore};
use oxigraph::store::Store;
use oxrdf::vocab::rdf;
use oxrdf::{GraphNameRef, Literal, NamedNode, NamedNodeRef, QuadRef, Term};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Namespace used by [`GraphNodeStore::new`].
pub const DEFAULT_NAMESPACE: &str = "urn:oxcrm:";

/// Stores nodes of a [`Registry`](crate::Registry) as RDF.
///
/// ```
/// use oxcrm::{GraphNodeStore, ModelExtensions, NodeStore, Registry, SchemaImporter, SchemaSource};
///
/// let schema = r#"
/// @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
/// @prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
/// crm:E39_Actor a rdfs:Class .
/// crm:E21_Person a rdfs:Class ; rdfs:subClassOf crm:E39_Actor .
/// "#;
/// let tables = SchemaImporter::new().import(&SchemaSource::Text(schema.into()))?;
/// let mut registry = Registry::new();
/// registry.extend(&tables, &ModelExtensions::default())?;
///
/// let store = GraphNodeStore::new()?;
/// let ada = store.create(registry.node_type("E21Person").unwrap(), "Ada")?;
/// assert_eq!(
///     store.labels(&ada)?.into_iter().collect::<Vec<_>>(),
///     ["E21Person", "E39Actor"]
/// );
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct GraphNodeStore {
    store: Store,
    namespace: String,
    next_id: AtomicU64,
}

impl GraphNodeStore {
    pub fn new() -> Result<Self, StoreError> {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Builds a store minting its IRIs under `namespace`.
    pub fn with_namespace(namespace: impl Into<String>) -> Result<Self, StoreError> {
        let namespace = namespace.into();
        NamedNode::new(format!("{namespace}node/0"))?;
        Ok(Self {
            store: Store::new()?,
            namespace,
            next_id: AtomicU64::new(1),
        })
    }

    /// The underlying Oxigraph store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    fn iri(&self, kind: &str, name: &str) -> Result<NamedNode, StoreError> {
        Ok(NamedNode::new(format!("{}{kind}/{name}", self.namespace))?)
    }

    fn label_iri(&self, label: &str) -> Result<NamedNode, StoreError> {
        self.iri("type", label)
    }

    fn field_iri(&self, field: &str) -> Result<NamedNode, StoreError> {
        self.iri("field", field)
    }

    fn relationship_iri(&self, relationship: &str) -> Result<NamedNode, StoreError> {
        self.iri("relationship", relationship)
    }

    fn label_from_iri<'a>(&self, iri: &'a str) -> Option<&'a str> {
        iri.strip_prefix(self.namespace.as_str())?
            .strip_prefix("type/")
    }

    /// Creates a record labelled with the type and all its ancestors and holding `value`.
    pub fn create(&self, node_type: &Arc<NodeType>, value: &str) -> Result<Node, StoreError> {
        let id = self.iri("node", &self.next_id.fetch_add(1, Ordering::Relaxed).to_string())?;
        let value_field = self.field_iri(VALUE_FIELD)?;
        let value = node_type
            .field(VALUE_FIELD)
            .map_or_else(|| Literal::new_simple_literal(value), |field| field.literal(value));
        let labels = node_type
            .ancestor_labels()
            .iter()
            .map(|label| self.label_iri(label))
            .collect::<Result<Vec<_>, _>>()?;
        let mut transaction = self.store.start_transaction()?;
        for label in &labels {
            transaction.insert(QuadRef::new(
                &id,
                rdf::TYPE,
                label,
                GraphNameRef::DefaultGraph,
            ));
        }
        transaction.insert(QuadRef::new(
            &id,
            &value_field,
            &value,
            GraphNameRef::DefaultGraph,
        ));
        transaction.commit()?;
        trace!(node = %id, %node_type, "node created");

        let mut node = Node::new(id.into_string(), Arc::clone(node_type));
        node.values.insert(VALUE_FIELD.into(), value);
        Ok(node)
    }

    /// Attaches an extra label to the record of the node.
    pub fn add_label(&self, node: &Node, label: &str) -> Result<(), StoreError> {
        let subject = self.subject(&node.id)?;
        let label = self.label_iri(label)?;
        self.store.insert(QuadRef::new(
            &subject,
            rdf::TYPE,
            &label,
            GraphNameRef::DefaultGraph,
        ))?;
        Ok(())
    }

    /// Replaces the value of a field of the node, in the store and on the node.
    pub fn set_field(&self, node: &mut Node, name: &str, lexical: &str) -> Result<(), StoreError> {
        let Some(field) = node.node_type.field(name) else {
            return Err(StoreError::UndeclaredField {
                node_type: node.type_name().into(),
                field: name.into(),
            });
        };
        let value = field.literal(lexical);
        let subject = self.subject(&node.id)?;
        let predicate = self.field_iri(name)?;
        let mut transaction = self.store.start_transaction()?;
        let previous = transaction
            .quads_for_pattern(
                Some(subject.as_ref().into()),
                Some(predicate.as_ref()),
                None,
                Some(GraphNameRef::DefaultGraph),
            )
            .collect::<Result<Vec<_>, _>>()?;
        for quad in &previous {
            transaction.remove(quad);
        }
        transaction.insert(QuadRef::new(
            &subject,
            &predicate,
            &value,
            GraphNameRef::DefaultGraph,
        ));
        transaction.commit()?;
        node.values.insert(name.into(), value);
        Ok(())
    }

    /// Links two nodes with a relationship declared on the source type or one of its ancestors.
    ///
    /// The target record must carry the label of the relationship range.
    pub fn connect(&self, source: &Node, relationship: &str, target: &Node) -> Result<(), StoreError> {
        let Some(declaration) = source.node_type.relationship(relationship) else {
            return Err(StoreError::UndeclaredRelationship {
                node_type: source.type_name().into(),
                relationship: relationship.into(),
            });
        };
        if !self.labels(target)?.contains(&declaration.target) {
            return Err(StoreError::RangeMismatch {
                relationship: declaration.rel_type.name.clone(),
                range: declaration.target.clone(),
                node: target.id.clone(),
            });
        }
        let subject = self.subject(&source.id)?;
        let object = self.subject(&target.id)?;
        let predicate = self.relationship_iri(&declaration.name)?;
        self.store.insert(QuadRef::new(
            &subject,
            &predicate,
            &object,
            GraphNameRef::DefaultGraph,
        ))?;
        Ok(())
    }

    /// The identities of the nodes linked from `source` by the relationship.
    pub fn related(&self, source: &Node, relationship: &str) -> Result<Vec<String>, StoreError> {
        let subject = self.subject(&source.id)?;
        let predicate = self.relationship_iri(relationship)?;
        let mut targets = Vec::new();
        for quad in self.store.quads_for_pattern(
            Some(subject.as_ref().into()),
            Some(predicate.as_ref()),
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            if let Term::NamedNode(target) = quad?.object {
                targets.push(target.into_string());
            }
        }
        Ok(targets)
    }

    fn subject(&self, id: &str) -> Result<NamedNode, StoreError> {
        Ok(NamedNode::new(id)?)
    }

    fn labels_of(&self, subject: NamedNodeRef<'_>) -> Result<BTreeSet<String>, StoreError> {
        let mut labels = BTreeSet::new();
        for quad in self.store.quads_for_pattern(
            Some(subject.into()),
            Some(rdf::TYPE),
            None,
            Some(GraphNameRef::DefaultGraph),
        ) {
            if let Term::NamedNode(label) = quad?.object {
                if let Some(label) = self.label_from_iri(label.as_str()) {
                    labels.insert(label.to_owned());
                }
            }
        }
        Ok(labels)
    }
}

impl fmt::Debug for GraphNodeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNodeStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl NodeStore for GraphNodeStore {
    type Error = StoreError;

    fn inflate(&self, node_type: &Arc<NodeType>, id: &str) -> Result<Node, StoreError> {
        let labels = self.labels_of(self.subject(id)?.as_ref())?;
        if labels.is_empty() {
            return Err(StoreError::NotFound(id.into()));
        }
        if !labels.contains(&node_type.name) {
            return Err(StoreError::MissingLabel {
                node: id.into(),
                label: node_type.name.clone(),
            });
        }
        Ok(Node::new(id, Arc::clone(node_type)))
    }

    fn labels(&self, node: &Node) -> Result<BTreeSet<String>, StoreError> {
        self.labels_of(self.subject(&node.id)?.as_ref())
    }

    fn refresh(&self, node: &mut Node) -> Result<(), StoreError> {
        let subject = self.subject(&node.id)?;
        node.values.clear();
        for field in &node.node_type.fields {
            let predicate = self.field_iri(&field.name)?;
            for quad in self.store.quads_for_pattern(
                Some(subject.as_ref().into()),
                Some(predicate.as_ref()),
                None,
                Some(GraphNameRef::DefaultGraph),
            ) {
                if let Term::Literal(value) = quad?.object {
                    node.values.insert(field.name.clone(), value);
                }
            }
        }
        Ok(())
    }
}
