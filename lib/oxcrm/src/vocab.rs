//! Vocabulary terms read from CIDOC-CRM schemas that are not provided by [`oxrdf::vocab`].

/// [OWL](https://www.w3.org/TR/owl2-overview/) vocabulary.
pub mod owl {
    use oxrdf::NamedNodeRef;

    /// The class of OWL classes.
    pub const CLASS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
    /// The class of object properties.
    pub const OBJECT_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
    /// The class of data properties.
    pub const DATATYPE_PROPERTY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#DatatypeProperty");
}

/// [DCMI Metadata Terms](https://www.dublincore.org/specifications/dublin-core/dcmi-terms/) vocabulary.
pub mod dcterms {
    use oxrdf::NamedNodeRef;

    /// An account of the resource.
    pub const DESCRIPTION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/description");
}
