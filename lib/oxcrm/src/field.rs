//! Scalar fields carried by node and relationship types.

use crate::error::ConfigurationError;
use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

/// Name of the scalar field every node type carries.
pub const VALUE_FIELD: &str = "value";

/// The kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
}

impl FieldKind {
    /// The XML Schema datatype of the stored literals.
    pub fn datatype(self) -> NamedNodeRef<'static> {
        match self {
            Self::String => xsd::STRING,
            Self::Integer => xsd::INTEGER,
            Self::Float => xsd::DOUBLE,
            Self::Boolean => xsd::BOOLEAN,
            Self::DateTime => xsd::DATE_TIME,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
        }
    }
}

impl FromStr for FieldKind {
    type Err = ();

    fn from_str(kind: &str) -> Result<Self, ()> {
        Ok(match kind.to_ascii_lowercase().as_str() {
            "string" | "str" => Self::String,
            "integer" | "int" => Self::Integer,
            "float" | "double" => Self::Float,
            "boolean" | "bool" => Self::Boolean,
            "datetime" => Self::DateTime,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named scalar field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The built-in `value` field.
    pub fn value() -> Self {
        Self::new(VALUE_FIELD, FieldKind::String)
    }

    /// Builds the literal storing the given lexical value in this field.
    pub fn literal(&self, lexical: impl Into<String>) -> Literal {
        match self.kind {
            FieldKind::String => Literal::new_simple_literal(lexical),
            kind => Literal::new_typed_literal(lexical, kind.datatype()),
        }
    }
}

type FieldFactory = Arc<dyn Fn() -> Result<FieldDescriptor, ConfigurationError> + Send + Sync>;

/// Extra fields added to every synthesized type.
///
/// Each field is built by a factory when a type is constructed.
/// A factory failure only skips the field on the type being constructed.
///
/// ```
/// use oxcrm::ExtensionFields;
///
/// let fields = ExtensionFields::from_declarations(["uri=string", "created=datetime"])?;
/// assert_eq!(fields.names().collect::<Vec<_>>(), ["uri", "created"]);
/// assert!(ExtensionFields::from_declarations(["uri"]).is_err());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Clone, Default)]
pub struct ExtensionFields {
    factories: Vec<(String, FieldFactory)>,
}

impl ExtensionFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads declarations of the form `name=kind`.
    pub fn from_declarations<'a>(
        declarations: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, ConfigurationError> {
        let mut fields = Self::new();
        for declaration in declarations {
            fields.declare(declaration)?;
        }
        Ok(fields)
    }

    /// Adds a field from a `name=kind` declaration.
    ///
    /// The kind is one of `string`, `integer`, `float`, `boolean` and `datetime`.
    pub fn declare(&mut self, declaration: &str) -> Result<(), ConfigurationError> {
        let Some((name, kind)) = declaration.split_once('=') else {
            return Err(ConfigurationError::MalformedDeclaration(declaration.into()));
        };
        let (name, kind) = (name.trim(), kind.trim());
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ConfigurationError::MalformedDeclaration(declaration.into()));
        }
        let kind = kind
            .parse::<FieldKind>()
            .map_err(|()| ConfigurationError::UnknownKind {
                field: name.into(),
                kind: kind.into(),
            })?;
        let descriptor = FieldDescriptor::new(name, kind);
        self.insert(name, move || Ok(descriptor.clone()));
        Ok(())
    }

    /// Adds a field built by the given factory, replacing any field with the same name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Result<FieldDescriptor, ConfigurationError> + Send + Sync + 'static,
    ) {
        let name = name.into();
        self.factories.retain(|(n, _)| *n != name);
        self.factories.push((name, Arc::new(factory)));
    }

    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Result<FieldDescriptor, ConfigurationError> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, factory);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Runs the factories, skipping the failing ones and the fields named like a built-in one.
    ///
    /// A factory must build a field named like the key it has been registered with.
    pub(crate) fn build(&self, owner: &str, built_in: &[FieldDescriptor]) -> Vec<FieldDescriptor> {
        let mut fields = Vec::with_capacity(self.factories.len());
        for (name, factory) in &self.factories {
            let result = if built_in.iter().any(|field| field.name == *name) {
                Err(ConfigurationError::ReservedName(name.clone()))
            } else {
                factory().and_then(|field| {
                    if field.name == *name {
                        Ok(field)
                    } else if built_in.iter().any(|built_in| built_in.name == field.name) {
                        Err(ConfigurationError::ReservedName(field.name))
                    } else {
                        Err(ConfigurationError::Factory {
                            field: name.clone(),
                            message: format!("built a field named {}", field.name),
                        })
                    }
                })
            };
            match result {
                Ok(field) => fields.push(field),
                Err(error) => warn!(%owner, field = %name, %error, "skipping extension field"),
            }
        }
        fields
    }
}

impl fmt::Debug for ExtensionFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The extension fields of node types and relationship types.
#[derive(Debug, Clone, Default)]
pub struct ModelExtensions {
    pub class_fields: ExtensionFields,
    pub rel_fields: ExtensionFields,
}

impl ModelExtensions {
    pub fn new(class_fields: ExtensionFields, rel_fields: ExtensionFields) -> Self {
        Self {
            class_fields,
            rel_fields,
        }
    }
}
