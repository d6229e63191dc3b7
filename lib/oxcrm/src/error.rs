use oxrdf::IriParseError;
use oxrdfio::{RdfFormat, RdfParseError};
use std::error::Error;
use std::io;
use thiserror::Error;

/// An error raised while fetching or parsing a schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchemaLoadError {
    /// The schema source could not be read.
    #[error("Unable to read the schema from {location}: {error}")]
    Io {
        location: String,
        #[source]
        error: io::Error,
    },
    /// The source kind can not be fetched with the enabled features.
    #[error("Unable to fetch {location}: {reason}")]
    UnsupportedSource { location: String, reason: String },
    /// The base IRI is invalid.
    #[error("Invalid base IRI '{iri}': {error}")]
    InvalidBaseIri {
        iri: String,
        #[source]
        error: IriParseError,
    },
    /// Both the detected format and the RDF/XML fallback failed to parse the source.
    #[error("Unable to parse {location} as {format} ({first}) nor as RDF/XML ({fallback})")]
    Parse {
        location: String,
        format: RdfFormat,
        first: RdfParseError,
        #[source]
        fallback: RdfParseError,
    },
    /// The schema references a property that is not in the property table.
    #[error(transparent)]
    Integrity(#[from] SchemaIntegrityError),
}

/// A table entry referenced during type construction is missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIntegrityError {
    #[error("The class {identifier} referenced by {referenced_by} is not in the class table")]
    MissingClass {
        identifier: String,
        referenced_by: String,
    },
    #[error("The property {identifier} referenced by {referenced_by} is not in the property table")]
    MissingProperty {
        identifier: String,
        referenced_by: String,
    },
}

/// An extension field could not be declared or built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A field declaration is not of the form `name=kind`.
    #[error("The field declaration '{0}' is not of the form name=kind")]
    MalformedDeclaration(String),
    /// The field kind is not one of the supported scalar kinds.
    #[error("The field {field} has the unknown kind '{kind}'")]
    UnknownKind { field: String, kind: String },
    /// The field name is already used by a built-in field.
    #[error("The field name {0} is reserved")]
    ReservedName(String),
    /// The field factory failed.
    #[error("The factory of the field {field} failed: {message}")]
    Factory { field: String, message: String },
}

/// An error raised while extending a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Integrity(#[from] SchemaIntegrityError),
    /// The registry has been frozen and the type is not in it yet.
    #[error("The registry is frozen, {identifier} can not be added to it")]
    Frozen { identifier: String },
}

/// An error raised by [`build_models`](crate::build_models).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Load(#[from] SchemaLoadError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// An error raised while re-typing a stored node.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RetypeError {
    /// The target is not an ancestor of the current type.
    #[error("{target} is not a super-class of {current}")]
    InvalidUpcast { target: String, current: String },
    /// The target is not one of the labels attached beyond the current type ancestors.
    #[error("{target} is not a sub-class of {current}")]
    InvalidDowncast { target: String, current: String },
    /// A label attached to the stored node has no type in the registry.
    #[error("The label {0} has no type in the registry")]
    UnknownType(String),
    /// The store failed.
    #[error("{0}")]
    Storage(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl RetypeError {
    pub(crate) fn storage(error: impl Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(error))
    }
}

/// An error raised by [`GraphNodeStore`](crate::GraphNodeStore).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Storage(#[from] oxigraph::store::StorageError),
    /// No record has the given identity.
    #[error("No node {0} in the store")]
    NotFound(String),
    /// The record exists but does not carry the label of the requested type.
    #[error("The node {node} is not labelled {label}")]
    MissingLabel { node: String, label: String },
    /// The field is not carried by the node type.
    #[error("{node_type} has no field named {field}")]
    UndeclaredField { node_type: String, field: String },
    /// The relationship is not declared on the source type or its ancestors.
    #[error("{node_type} has no relationship named {relationship}")]
    UndeclaredRelationship {
        node_type: String,
        relationship: String,
    },
    /// The target node does not carry the relationship range label.
    #[error("The relationship {relationship} expects a {range} target, {node} is not one")]
    RangeMismatch {
        relationship: String,
        range: String,
        node: String,
    },
    /// A node identity can not be turned into an IRI.
    #[error(transparent)]
    InvalidIri(#[from] IriParseError),
}
