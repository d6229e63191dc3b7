#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod field;
#[cfg(feature = "http-client")]
mod http;
mod identifier;
mod import;
mod model;
mod registry;
mod retype;
mod schema;
mod source;
mod store;
pub mod vocab;

pub use error::{
    BuildError, ConfigurationError, RegistryError, RetypeError, SchemaIntegrityError,
    SchemaLoadError, StoreError,
};
pub use field::{ExtensionFields, FieldDescriptor, FieldKind, ModelExtensions, VALUE_FIELD};
pub use identifier::DerivedName;
pub use import::{ImportOptions, SchemaImporter, SubPropertyResolution, import_schema};
pub use model::{NodeType, RelType, RelationshipDecl, Supertypes};
pub use registry::{Registry, build_models};
pub use retype::{Node, NodeStore, Retyper};
pub use schema::{ClassEntry, LITERAL_IDENTIFIER, PropertyEntry, SchemaTables};
pub use source::{HttpOptions, SchemaSource};
pub use store::{DEFAULT_NAMESPACE, GraphNodeStore};
