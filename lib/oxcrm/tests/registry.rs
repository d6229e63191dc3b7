//! Integration tests for type synthesis.

use oxcrm::{
    ConfigurationError, ExtensionFields, FieldDescriptor, FieldKind, LITERAL_IDENTIFIER,
    ModelExtensions, Registry, RegistryError, SchemaImporter, SchemaSource, build_models,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn sample_registry() -> Registry {
    build_models(data("crm_sample.rdfs"), ExtensionFields::new(), ExtensionFields::new())
        .expect("Failed to build the models")
}

#[test]
fn test_end_to_end_scenario() {
    let schema = r#"
        @prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix ex: <http://example.com/schema/> .
        ex:Entity a rdfs:Class .
        ex:Actor a rdfs:Class ; rdfs:subClassOf ex:Entity .
        ex:P1_is a rdf:Property ; rdfs:domain ex:Actor ; rdfs:range ex:Entity .
    "#;
    let registry = build_models(
        SchemaSource::Text(schema.into()),
        ExtensionFields::new(),
        ExtensionFields::new(),
    )
    .expect("Failed to build the models");
    assert!(registry.is_frozen());

    let entity = registry.node_type("Entity").expect("Entity type");
    assert!(entity.supertypes.is_root());
    assert!(entity.relationships.is_empty());
    assert!(registry.relationships("Entity").unwrap().is_empty());

    let actor = registry.node_type("Actor").expect("Actor type");
    assert!(actor.ancestor_labels().contains("Entity"));
    assert!(actor.ancestor_labels().contains("Actor"));

    let rel = registry.rel_type("P1Is").expect("P1Is type");
    assert_eq!(rel.safe_name, "p1_is");
    assert_eq!(rel.domain.as_deref(), Some("Actor"));
    assert_eq!(rel.range, "Entity");
    let declaration = actor.relationship("p1_is").expect("p1_is relationship");
    assert_eq!(declaration.target, "Entity");
    assert!(Arc::ptr_eq(&declaration.rel_type, rel));
}

#[test]
fn test_sample_hierarchy() {
    let registry = sample_registry();
    assert!(registry.node_type(LITERAL_IDENTIFIER).is_some());
    let person = registry.node_type("E21Person").expect("E21Person type");
    assert_eq!(
        person.ancestors.iter().map(String::as_str).collect::<Vec<_>>(),
        [
            "E1CrmEntity",
            "E20BiologicalObject",
            "E21Person",
            "E39Actor",
            "E77PersistentItem"
        ]
    );
    assert_eq!(person.label, "Person");
    assert_eq!(person.code.as_deref(), Some("E21"));
    assert_eq!(person.depth(), 5);

    let placeholder = registry
        .node_type("E20BiologicalObject")
        .expect("placeholder type");
    assert_eq!(placeholder.label, "E20BiologicalObject");
    assert!(placeholder.supertypes.is_root());
}

#[test]
fn test_inherited_relationships() {
    let registry = sample_registry();
    let mut names = registry
        .relationships("E74Group")
        .expect("E74Group type")
        .into_iter()
        .map(|declaration| declaration.name.as_str())
        .collect::<Vec<_>>();
    names.sort_unstable();
    assert_eq!(
        names,
        [
            "p107_has_current_or_former_member",
            "p1_is_identified_by",
            "p3_has_note",
            "p48_has_preferred_identifier",
            "p74_has_current_or_former_residence",
        ]
    );
    let person = registry.node_type("E21Person").unwrap();
    assert!(person.relationship("p107_has_current_or_former_member").is_none());
    assert_eq!(
        person.relationship("p97_from_father").map(|d| d.target.as_str()),
        Some("E21Person")
    );
}

#[test]
fn test_relationship_types() {
    let registry = sample_registry();
    assert_eq!(registry.rel_types().count(), 7);
    let father = registry.rel_type("P97FromFather").unwrap();
    assert_eq!(father.parent.as_deref(), Some("P152HasParent"));
    assert_eq!(father.label, "from father");
    let note = registry.rel_type("P3HasNote").unwrap();
    assert_eq!(note.range, LITERAL_IDENTIFIER);
}

#[test]
fn test_construction_is_idempotent() {
    let tables = SchemaImporter::new()
        .import(&SchemaSource::Path(data("crm_sample.rdfs")))
        .expect("Failed to import schema");
    let sources = tables.sources();
    let extensions = ModelExtensions::default();
    let mut registry = Registry::new();
    let first = registry
        .get_or_create_class("E21Person", &tables, &sources, &extensions)
        .unwrap();
    registry.extend(&tables, &extensions).unwrap();
    let second = registry
        .get_or_create_class("E21Person", &tables, &sources, &extensions)
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, registry.node_type("E21Person").unwrap()));

    let entry = &tables.properties["P1IsIdentifiedBy"];
    let rel = registry
        .get_or_create_rel_class("P1IsIdentifiedBy", entry, &extensions.rel_fields)
        .unwrap();
    assert!(Arc::ptr_eq(&rel, registry.rel_type("P1IsIdentifiedBy").unwrap()));
}

#[test]
fn test_frozen_registry_rejects_new_types() {
    let mut registry = sample_registry();
    let tables = SchemaImporter::new()
        .import(&SchemaSource::Path(data("crm_sample.ttl")))
        .expect("Failed to import schema");
    let sources = tables.sources();
    let result =
        registry.get_or_create_class("E22HumanMadeObject", &tables, &sources, &ModelExtensions::default());
    assert!(matches!(result, Err(RegistryError::Frozen { .. })));
    assert!(registry.node_type("E21Person").is_some());
}

#[test]
fn test_extension_fields() {
    let class_fields = ExtensionFields::from_declarations(["uri=string", "created=datetime"])
        .unwrap()
        .with("broken", || {
            Err(ConfigurationError::Factory {
                field: "broken".into(),
                message: "no default value".into(),
            })
        });
    let rel_fields = ExtensionFields::new().with("certainty", || {
        Ok(FieldDescriptor::new("certainty", FieldKind::Float))
    });
    let registry = build_models(data("crm_sample.rdfs"), class_fields, rel_fields)
        .expect("Failed to build the models");
    for node_type in registry.node_types() {
        assert_eq!(
            node_type.fields,
            [
                FieldDescriptor::value(),
                FieldDescriptor::new("uri", FieldKind::String),
                FieldDescriptor::new("created", FieldKind::DateTime),
            ]
        );
    }
    for rel_type in registry.rel_types() {
        assert_eq!(
            rel_type.fields,
            [
                FieldDescriptor::value(),
                FieldDescriptor::new("certainty", FieldKind::Float)
            ]
        );
    }
}

#[test]
fn test_bad_field_declaration() {
    assert!(matches!(
        ExtensionFields::from_declarations(["uri:string"]),
        Err(ConfigurationError::MalformedDeclaration(_))
    ));
    assert!(matches!(
        ExtensionFields::from_declarations(["uri=json"]),
        Err(ConfigurationError::UnknownKind { .. })
    ));
}
