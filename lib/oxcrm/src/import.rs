//! Turns an RDF schema into the class and property tables.

use crate::error::{SchemaIntegrityError, SchemaLoadError};
use crate::identifier::DerivedName;
use crate::schema::{ClassEntry, LITERAL_IDENTIFIER, PropertyEntry, SchemaTables};
use crate::source::{FetchedSource, HttpOptions, SchemaSource, detect_format};
use crate::vocab::{dcterms, owl};
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use oxrdfio::{RdfFormat, RdfParseError, RdfParser};
use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

/// Suffix of the code of inverse properties, e.g. `P1i`.
const INVERSE_MARKER: char = 'i';

/// How `rdfs:subPropertyOf` edges are looked up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubPropertyResolution {
    /// Each property reads its own `rdfs:subPropertyOf` values, the last one in IRI order is kept.
    ///
    /// Parents that are not in the property table, like dropped inverse properties, are ignored.
    #[default]
    Declared,
    /// Each property reads the `rdfs:subPropertyOf` value of the last class of the class pass.
    ///
    /// This reproduces the historical behavior of the CRM loaders.
    /// The class pass walks the `rdfs:Class` declarations then the `owl:Class` ones, each sorted by IRI,
    /// and a class declared with both types is visited twice, so the last class is the last `owl:Class`
    /// if there is one.
    /// A parent missing from the property table is an error.
    LastClass,
}

/// Options of a [`SchemaImporter`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Format of the first parsing attempt. Guessed from the source if not set.
    pub format: Option<RdfFormat>,
    /// Base IRI of the schema. Defaults to the source URL or file URL.
    pub base_iri: Option<String>,
    pub sub_properties: SubPropertyResolution,
    pub http: HttpOptions,
}

/// Reads a schema and builds its [`SchemaTables`].
///
/// ```
/// use oxcrm::{SchemaImporter, SchemaSource};
///
/// let schema = r#"
/// @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
/// @prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
/// crm:E1_CRM_Entity a rdfs:Class ; rdfs:label "CRM Entity"@en .
/// crm:E77_Persistent_Item a rdfs:Class ; rdfs:subClassOf crm:E1_CRM_Entity .
/// "#;
/// let tables = SchemaImporter::new().import(&SchemaSource::Text(schema.into()))?;
/// assert_eq!(tables.classes["E77PersistentItem"].sub_class_of, ["E1CrmEntity"]);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct SchemaImporter {
    options: ImportOptions,
}

impl SchemaImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ImportOptions) -> Self {
        Self { options }
    }

    /// Sets the format of the first parsing attempt.
    pub fn with_format(mut self, format: RdfFormat) -> Self {
        self.options.format = Some(format);
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.options.base_iri = Some(base_iri.into());
        self
    }

    pub fn with_sub_property_resolution(mut self, resolution: SubPropertyResolution) -> Self {
        self.options.sub_properties = resolution;
        self
    }

    /// Fetches, parses and imports a schema.
    ///
    /// The source is parsed with the detected format first and as RDF/XML if that fails.
    pub fn import(&self, source: &SchemaSource) -> Result<SchemaTables, SchemaLoadError> {
        let fetched = source.fetch(&self.options.http)?;
        let graph = self.parse(source, &fetched)?;
        self.import_graph(&graph)
    }

    fn parse(
        &self,
        source: &SchemaSource,
        fetched: &FetchedSource,
    ) -> Result<Graph, SchemaLoadError> {
        let format = self
            .options
            .format
            .unwrap_or_else(|| detect_format(source, fetched));
        let base_iri = self.options.base_iri.clone().or_else(|| source.base_iri());
        debug!(%source, %format, "parsing schema");
        let first = match read_graph(parser(format, base_iri.as_deref())?, &fetched.content) {
            Ok(graph) => return Ok(graph),
            Err(error) => error,
        };
        debug!(%source, error = %first, "retrying as RDF/XML");
        read_graph(
            parser(RdfFormat::RdfXml, base_iri.as_deref())?,
            &fetched.content,
        )
        .map_err(|fallback| SchemaLoadError::Parse {
            location: source.to_string(),
            format,
            first,
            fallback,
        })
    }

    /// Builds the tables of an already parsed schema.
    pub fn import_graph(&self, graph: &Graph) -> Result<SchemaTables, SchemaLoadError> {
        let mut tables = SchemaTables::new();

        // Parents may be declared after their children, edges are resolved once all classes exist
        let mut sub_class_relations = Vec::new();
        let mut last_class = None;
        let mut seen = FxHashSet::default();
        for class in declared_subjects(graph, &[rdfs::CLASS, owl::CLASS]) {
            last_class = Some(class);
            if !seen.insert(class) {
                continue;
            }
            let name = DerivedName::from_iri(class.as_str());
            for parent in named_objects(graph, class, rdfs::SUB_CLASS_OF) {
                sub_class_relations.push((
                    name.identifier.clone(),
                    DerivedName::from_iri(parent.as_str()).identifier,
                ));
            }
            let label = label(graph, class).unwrap_or_else(|| name.identifier.clone());
            tables.insert_class(ClassEntry::new(name, label, comment(graph, class)));
        }
        for (child, parent) in sub_class_relations {
            if tables.ensure_class(&parent) {
                warn!(class = %child, parent = %parent, "super class is not declared, adding a placeholder");
            }
            if let Some(entry) = tables.classes.get_mut(&child) {
                entry.sub_class_of.push(parent);
            }
        }

        let mut sub_property_relations = Vec::new();
        seen.clear();
        for property in declared_subjects(
            graph,
            &[rdf::PROPERTY, owl::OBJECT_PROPERTY, owl::DATATYPE_PROPERTY],
        ) {
            if !seen.insert(property) {
                continue;
            }
            let name = DerivedName::from_iri(property.as_str());
            if name.code.ends_with(INVERSE_MARKER) {
                debug!(property = %property, "skipping inverse property");
                continue;
            }
            let domain = named_object(graph, property, rdfs::DOMAIN).map(|domain| {
                let identifier = DerivedName::from_iri(domain.as_str()).identifier;
                if tables.ensure_class(&identifier) {
                    warn!(property = %name.identifier, domain = %identifier, "domain class is not declared, adding a placeholder");
                }
                identifier
            });
            let range = named_object(graph, property, rdfs::RANGE).map_or_else(
                || {
                    if graph
                        .object_for_subject_predicate(property, rdfs::RANGE)
                        .is_some()
                    {
                        warn!(property = %name.identifier, "anonymous range class, using Literal");
                    }
                    LITERAL_IDENTIFIER.to_owned()
                },
                |range| {
                    let identifier = DerivedName::from_iri(range.as_str()).identifier;
                    if tables.ensure_class(&identifier) {
                        debug!(property = %name.identifier, range = %identifier, "range class is not declared, adding a placeholder");
                    }
                    identifier
                },
            );
            let parents = match self.options.sub_properties {
                SubPropertyResolution::Declared => {
                    named_objects(graph, property, rdfs::SUB_PROPERTY_OF)
                }
                SubPropertyResolution::LastClass => last_class
                    .and_then(|class| named_object(graph, class, rdfs::SUB_PROPERTY_OF))
                    .into_iter()
                    .collect(),
            };
            for parent in parents {
                sub_property_relations.push((
                    name.identifier.clone(),
                    DerivedName::from_iri(parent.as_str()).identifier,
                ));
            }
            let label = label(graph, property).unwrap_or_else(|| name.identifier.clone());
            tables.insert_property(PropertyEntry {
                comment: comment(graph, property),
                identifier: name.identifier,
                code: name.code,
                safe_name: name.safe_name,
                label,
                domain,
                range,
                sub_property_of: None,
            });
        }
        for (child, parent) in sub_property_relations {
            if !tables.properties.contains_key(&parent) {
                if self.options.sub_properties == SubPropertyResolution::LastClass {
                    return Err(SchemaIntegrityError::MissingProperty {
                        identifier: parent,
                        referenced_by: child,
                    }
                    .into());
                }
                warn!(property = %child, parent = %parent, "ignoring unknown super property");
                continue;
            }
            if let Some(entry) = tables.properties.get_mut(&child) {
                entry.sub_property_of = Some(parent);
            }
        }

        info!(
            classes = tables.classes.len(),
            properties = tables.properties.len(),
            "schema imported"
        );
        Ok(tables)
    }
}

/// Fetches, parses and imports a schema with the default options.
pub fn import_schema(source: &SchemaSource) -> Result<SchemaTables, SchemaLoadError> {
    SchemaImporter::new().import(source)
}

fn parser(format: RdfFormat, base_iri: Option<&str>) -> Result<RdfParser, SchemaLoadError> {
    let parser = RdfParser::from_format(format);
    let Some(base_iri) = base_iri else {
        return Ok(parser);
    };
    parser
        .with_base_iri(base_iri)
        .map_err(|error| SchemaLoadError::InvalidBaseIri {
            iri: base_iri.into(),
            error,
        })
}

fn read_graph(parser: RdfParser, content: &[u8]) -> Result<Graph, RdfParseError> {
    let mut graph = Graph::new();
    for quad in parser.for_reader(content) {
        graph.insert(quad?.as_ref());
    }
    Ok(graph)
}

/// The IRI subjects of `rdf:type` triples with each of the given objects in turn.
///
/// The subjects of each type are sorted by IRI, a subject declared with several types is listed once per type.
fn declared_subjects<'a>(graph: &'a Graph, types: &[NamedNodeRef<'_>]) -> Vec<NamedNodeRef<'a>> {
    let mut subjects = Vec::new();
    for declared_type in types {
        let mut declared = Vec::new();
        for subject in graph.subjects_for_predicate_object(rdf::TYPE, *declared_type) {
            match subject {
                NamedOrBlankNodeRef::NamedNode(subject) => declared.push(subject),
                NamedOrBlankNodeRef::BlankNode(_) => {
                    debug!(class = %declared_type, "ignoring anonymous declaration");
                }
            }
        }
        declared.sort_unstable_by_key(|subject| subject.as_str());
        subjects.extend(declared);
    }
    subjects
}

/// The IRI objects of the subject and predicate, sorted by IRI.
///
/// Graph iteration order is not stable across runs.
fn named_objects<'a>(
    graph: &'a Graph,
    subject: NamedNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Vec<NamedNodeRef<'a>> {
    let mut objects = Vec::new();
    for object in graph.objects_for_subject_predicate(subject, predicate) {
        if let TermRef::NamedNode(object) = object {
            objects.push(object);
        } else {
            debug!(%subject, %predicate, "ignoring anonymous object");
        }
    }
    objects.sort_unstable_by_key(|object| object.as_str());
    objects
}

/// The first of the [`named_objects`].
fn named_object<'a>(
    graph: &'a Graph,
    subject: NamedNodeRef<'_>,
    predicate: NamedNodeRef<'_>,
) -> Option<NamedNodeRef<'a>> {
    named_objects(graph, subject, predicate).into_iter().next()
}

fn text(term: TermRef<'_>) -> Option<&str> {
    match term {
        TermRef::Literal(literal) => Some(literal.value()),
        TermRef::NamedNode(node) => Some(node.as_str()),
        _ => None,
    }
}

/// The English label if there is one, else the first label.
fn label(graph: &Graph, subject: NamedNodeRef<'_>) -> Option<String> {
    let mut first = None;
    for label in graph.objects_for_subject_predicate(subject, rdfs::LABEL) {
        if let TermRef::Literal(literal) = label {
            if literal
                .language()
                .is_some_and(|language| language.eq_ignore_ascii_case("en"))
            {
                return Some(literal.value().to_owned());
            }
        }
        if first.is_none() {
            first = text(label);
        }
    }
    first.map(ToOwned::to_owned)
}

/// The description if there is one, else the comment.
fn comment(graph: &Graph, subject: NamedNodeRef<'_>) -> Option<String> {
    [dcterms::DESCRIPTION, rdfs::COMMENT]
        .into_iter()
        .find_map(|predicate| {
            graph
                .object_for_subject_predicate(subject, predicate)
                .and_then(text)
                .filter(|text| !text.is_empty())
        })
        .map(ToOwned::to_owned)
}
