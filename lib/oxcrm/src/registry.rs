use crate::error::{BuildError, RegistryError, SchemaIntegrityError};
use crate::field::{ExtensionFields, FieldDescriptor, ModelExtensions};
use crate::import::import_schema;
use crate::model::{NodeType, RelType, RelationshipDecl, Supertypes};
use crate::schema::{PropertyEntry, SchemaTables};
use crate::source::SchemaSource;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Referrer reported when a type is requested directly instead of as the parent of another one.
const DIRECT_REQUEST: &str = "a direct request";

/// The synthesized node and relationship types, keyed by identifier.
///
/// Types are built once: asking again for an identifier returns the same [`Arc`].
/// A registry is filled with [`extend`](Self::extend) and then [frozen](Self::freeze),
/// after which lookups still succeed but no new type can be added.
///
/// ```
/// use oxcrm::{ModelExtensions, Registry, SchemaImporter, SchemaSource};
///
/// let schema = r#"
/// @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
/// @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
/// @prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
/// crm:E1_CRM_Entity a rdfs:Class .
/// crm:E39_Actor a rdfs:Class ; rdfs:subClassOf crm:E1_CRM_Entity .
/// crm:P1_is_identified_by a rdf:Property ; rdfs:domain crm:E1_CRM_Entity ; rdfs:range crm:E1_CRM_Entity .
/// "#;
/// let tables = SchemaImporter::new().import(&SchemaSource::Text(schema.into()))?;
/// let mut registry = Registry::new();
/// registry.extend(&tables, &ModelExtensions::default())?;
/// registry.freeze();
///
/// let actor = registry.node_type("E39Actor").unwrap();
/// assert!(actor.is_a("E1CrmEntity"));
/// assert!(actor.relationship("p1_is_identified_by").is_some());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    node_types: BTreeMap<String, Arc<NodeType>>,
    rel_types: BTreeMap<String, Arc<RelType>>,
    frozen: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the types of all the class entries, then of all the property entries.
    pub fn extend(
        &mut self,
        tables: &SchemaTables,
        extensions: &ModelExtensions,
    ) -> Result<(), RegistryError> {
        let sources = tables.sources();
        for identifier in tables.classes.keys() {
            self.get_or_create_class(identifier, tables, &sources, extensions)?;
        }
        for (identifier, entry) in &tables.properties {
            self.get_or_create_rel_class(identifier, entry, &extensions.rel_fields)?;
        }
        info!(
            node_types = self.node_types.len(),
            rel_types = self.rel_types.len(),
            "registry extended"
        );
        Ok(())
    }

    /// Returns the node type of a class entry, building it and its ancestors if needed.
    pub fn get_or_create_class(
        &mut self,
        identifier: &str,
        tables: &SchemaTables,
        sources: &FxHashMap<&str, Vec<&str>>,
        extensions: &ModelExtensions,
    ) -> Result<Arc<NodeType>, RegistryError> {
        self.create_class(identifier, DIRECT_REQUEST, tables, sources, extensions)
    }

    fn create_class(
        &mut self,
        identifier: &str,
        referenced_by: &str,
        tables: &SchemaTables,
        sources: &FxHashMap<&str, Vec<&str>>,
        extensions: &ModelExtensions,
    ) -> Result<Arc<NodeType>, RegistryError> {
        if let Some(node_type) = self.node_types.get(identifier) {
            return Ok(Arc::clone(node_type));
        }
        self.check_not_frozen(identifier)?;
        let entry = tables
            .classes
            .get(identifier)
            .ok_or_else(|| SchemaIntegrityError::MissingClass {
                identifier: identifier.into(),
                referenced_by: referenced_by.into(),
            })?;

        let mut ancestors = BTreeSet::from([identifier.to_owned()]);
        let supertypes = if entry.sub_class_of.is_empty() {
            Supertypes::Root
        } else {
            let mut parents = Vec::with_capacity(entry.sub_class_of.len());
            for parent in &entry.sub_class_of {
                let parent = self.create_class(parent, identifier, tables, sources, extensions)?;
                ancestors.extend(parent.ancestors.iter().cloned());
                parents.push(parent);
            }
            Supertypes::Classes(parents)
        };

        let mut fields = vec![FieldDescriptor::value()];
        let extra_fields = extensions.class_fields.build(identifier, &fields);
        fields.extend(extra_fields);

        let mut relationships = Vec::new();
        for property in sources.get(identifier).into_iter().flatten() {
            let property_entry = tables.properties.get(*property).ok_or_else(|| {
                SchemaIntegrityError::MissingProperty {
                    identifier: (*property).into(),
                    referenced_by: identifier.into(),
                }
            })?;
            let rel_type =
                self.get_or_create_rel_class(property, property_entry, &extensions.rel_fields)?;
            relationships.push(RelationshipDecl {
                name: rel_type.safe_name.clone(),
                target: property_entry.range.clone(),
                rel_type,
            });
        }

        let node_type = Arc::new(NodeType {
            name: identifier.into(),
            code: entry.code.clone(),
            safe_name: entry.safe_name.clone(),
            label: entry.label.clone().unwrap_or_else(|| identifier.into()),
            doc: entry.comment.clone(),
            supertypes,
            ancestors,
            fields,
            relationships,
        });
        debug!(name = identifier, depth = node_type.depth(), "node type created");
        self.node_types.insert(identifier.into(), Arc::clone(&node_type));
        Ok(node_type)
    }

    /// Returns the relationship type of a property entry, building it if needed.
    pub fn get_or_create_rel_class(
        &mut self,
        identifier: &str,
        entry: &PropertyEntry,
        fields: &ExtensionFields,
    ) -> Result<Arc<RelType>, RegistryError> {
        if let Some(rel_type) = self.rel_types.get(identifier) {
            return Ok(Arc::clone(rel_type));
        }
        self.check_not_frozen(identifier)?;
        let mut rel_fields = vec![FieldDescriptor::value()];
        let extra_fields = fields.build(identifier, &rel_fields);
        rel_fields.extend(extra_fields);
        let rel_type = Arc::new(RelType {
            name: identifier.into(),
            code: entry.code.clone(),
            safe_name: entry.safe_name.clone(),
            label: if entry.label.is_empty() {
                identifier.into()
            } else {
                entry.label.clone()
            },
            doc: entry.comment.clone(),
            domain: entry.domain.clone(),
            range: entry.range.clone(),
            parent: entry.sub_property_of.clone(),
            fields: rel_fields,
        });
        debug!(name = identifier, "relationship type created");
        self.rel_types.insert(identifier.into(), Arc::clone(&rel_type));
        Ok(rel_type)
    }

    fn check_not_frozen(&self, identifier: &str) -> Result<(), RegistryError> {
        if self.frozen {
            return Err(RegistryError::Frozen {
                identifier: identifier.into(),
            });
        }
        Ok(())
    }

    /// Prevents any new type from being added.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn node_type(&self, name: &str) -> Option<&Arc<NodeType>> {
        self.node_types.get(name)
    }

    pub fn rel_type(&self, name: &str) -> Option<&Arc<RelType>> {
        self.rel_types.get(name)
    }

    /// The node types, sorted by name.
    pub fn node_types(&self) -> impl Iterator<Item = &Arc<NodeType>> {
        self.node_types.values()
    }

    /// The relationship types, sorted by name.
    pub fn rel_types(&self) -> impl Iterator<Item = &Arc<RelType>> {
        self.rel_types.values()
    }

    /// The relationships declared on a node type or inherited from its ancestors.
    pub fn relationships(&self, name: &str) -> Option<Vec<&RelationshipDecl>> {
        Some(self.node_type(name)?.all_relationships())
    }
}

/// Imports a schema and builds a frozen registry of all its types.
///
/// `class_fields` are added to every node type and `rel_fields` to every relationship type.
pub fn build_models(
    source: impl Into<SchemaSource>,
    class_fields: ExtensionFields,
    rel_fields: ExtensionFields,
) -> Result<Registry, BuildError> {
    let tables = import_schema(&source.into())?;
    let mut registry = Registry::new();
    registry.extend(&tables, &ModelExtensions::new(class_fields, rel_fields))?;
    registry.freeze();
    Ok(registry)
}
