//! Node and relationship types synthesized from the schema tables.

use crate::field::FieldDescriptor;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// The direct parents of a [`NodeType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supertypes {
    /// The class has no declared parent and only derives from the abstract root.
    Root,
    Classes(Vec<Arc<NodeType>>),
}

impl Supertypes {
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        let classes: &[Arc<NodeType>] = match self {
            Self::Root => &[],
            Self::Classes(classes) => classes,
        };
        classes.iter()
    }
}

/// A node type built from one class entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    /// The class identifier, also used as the node label.
    pub name: String,
    pub code: Option<String>,
    pub safe_name: Option<String>,
    /// Human readable name.
    pub label: String,
    pub doc: Option<String>,
    pub supertypes: Supertypes,
    /// The name of the type and of all its transitive parents.
    pub ancestors: BTreeSet<String>,
    pub fields: Vec<FieldDescriptor>,
    /// The relationships declared with this type as domain, without the inherited ones.
    pub relationships: Vec<RelationshipDecl>,
}

impl NodeType {
    /// The labels a stored node of this type carries.
    pub fn ancestor_labels(&self) -> &BTreeSet<String> {
        &self.ancestors
    }

    /// Whether `name` is this type or one of its ancestors.
    pub fn is_a(&self, name: &str) -> bool {
        self.ancestors.contains(name)
    }

    /// How specialized the type is, counted as the size of its ancestor closure.
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Looks up a relationship declared on this type or inherited from an ancestor.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDecl> {
        self.relationships
            .iter()
            .find(|relationship| relationship.name == name)
            .or_else(|| {
                self.supertypes
                    .iter()
                    .find_map(|parent| parent.relationship(name))
            })
    }

    /// The declared and inherited relationships, the closest declaration first.
    ///
    /// A relationship inherited along several paths is listed once.
    pub fn all_relationships(&self) -> Vec<&RelationshipDecl> {
        let mut seen = FxHashSet::default();
        let mut relationships = Vec::new();
        self.collect_relationships(&mut seen, &mut relationships);
        relationships
    }

    fn collect_relationships<'a>(
        &'a self,
        seen: &mut FxHashSet<&'a str>,
        relationships: &mut Vec<&'a RelationshipDecl>,
    ) {
        for relationship in &self.relationships {
            if seen.insert(relationship.name.as_str()) {
                relationships.push(relationship);
            }
        }
        for parent in self.supertypes.iter() {
            parent.collect_relationships(seen, relationships);
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A relationship type built from one property entry.
///
/// Relationship types do not inherit from each other, `parent` only records the super property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelType {
    pub name: String,
    pub code: String,
    pub safe_name: String,
    pub label: String,
    pub doc: Option<String>,
    pub domain: Option<String>,
    pub range: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A relationship attached to a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDecl {
    /// The safe name of the property.
    pub name: String,
    pub rel_type: Arc<RelType>,
    /// Name of the node type at the other end.
    pub target: String,
}
