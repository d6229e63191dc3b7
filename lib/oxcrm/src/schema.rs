//! The normalized class and property tables produced by the importer.
//!
//! [`SchemaTables`] is the only contract between the importer and the type synthesizer.
//! It serializes to JSON so that a parsed schema can be cached instead of fetched again.

use crate::identifier::DerivedName;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Identifier of the synthetic class used as range of scalar-valued properties.
pub const LITERAL_IDENTIFIER: &str = "Literal";

/// One ontology class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Identifiers of the parent classes, sorted by the IRI of the parent.
    #[serde(rename = "subClassOf", default)]
    pub sub_class_of: Vec<String>,
}

impl ClassEntry {
    /// Builds an entry for a declared class.
    pub fn new(name: DerivedName, label: String, comment: Option<String>) -> Self {
        Self {
            identifier: name.identifier,
            code: Some(name.code),
            safe_name: Some(name.safe_name),
            label: Some(label),
            comment,
            sub_class_of: Vec::new(),
        }
    }

    /// Builds an entry carrying only an identifier, for classes referenced but never declared.
    pub fn placeholder(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            code: None,
            safe_name: None,
            label: None,
            comment: None,
            sub_class_of: Vec::new(),
        }
    }

    /// The synthetic literal class.
    pub fn literal() -> Self {
        Self {
            label: Some(LITERAL_IDENTIFIER.into()),
            ..Self::placeholder(LITERAL_IDENTIFIER)
        }
    }

    /// Whether the entry was created for an undeclared reference.
    pub fn is_placeholder(&self) -> bool {
        self.code.is_none() && self.label.is_none()
    }
}

/// One relationship declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub identifier: String,
    pub code: String,
    pub safe_name: String,
    pub label: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Identifier of the class the relationship starts from, if the schema declares one.
    #[serde(default)]
    pub domain: Option<String>,
    /// Identifier of the class the relationship points to.
    pub range: String,
    #[serde(rename = "subPropertyOf", default, skip_serializing_if = "Option::is_none")]
    pub sub_property_of: Option<String>,
}

/// The class table and the property table, both keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaTables {
    pub classes: BTreeMap<String, ClassEntry>,
    pub properties: BTreeMap<String, PropertyEntry>,
}

impl SchemaTables {
    /// Builds tables that only contain the literal class.
    pub fn new() -> Self {
        let mut tables = Self::default();
        tables.insert_class(ClassEntry::literal());
        tables
    }

    /// Inserts a class entry, replacing any entry with the same identifier.
    pub fn insert_class(&mut self, entry: ClassEntry) {
        self.classes.insert(entry.identifier.clone(), entry);
    }

    /// Inserts a property entry, replacing any entry with the same identifier.
    pub fn insert_property(&mut self, entry: PropertyEntry) {
        self.properties.insert(entry.identifier.clone(), entry);
    }

    /// Adds a placeholder entry if the class is unknown and returns whether one was added.
    pub(crate) fn ensure_class(&mut self, identifier: &str) -> bool {
        if self.classes.contains_key(identifier) {
            return false;
        }
        self.insert_class(ClassEntry::placeholder(identifier));
        true
    }

    /// Maps every domain class identifier to the identifiers of the properties starting from it.
    ///
    /// Properties without a domain are not listed.
    pub fn sources(&self) -> FxHashMap<&str, Vec<&str>> {
        let mut sources = FxHashMap::<&str, Vec<&str>>::default();
        for (identifier, entry) in &self.properties {
            if let Some(domain) = &entry.domain {
                sources
                    .entry(domain.as_str())
                    .or_default()
                    .push(identifier.as_str());
            }
        }
        sources
    }

    /// Reads tables previously written with [`to_writer`](Self::to_writer).
    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }

    /// Writes the tables as pretty-printed JSON.
    pub fn to_writer(&self, writer: impl Write) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}
