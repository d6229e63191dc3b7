//! Schema locations and how their content is fetched and recognized.

use crate::error::SchemaLoadError;
use oxrdfio::RdfFormat;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Media types accepted when downloading a schema.
#[cfg(feature = "http-client")]
const ACCEPT: &str = "application/rdf+xml, text/turtle;q=0.9, application/n-triples;q=0.8, */*;q=0.1";

/// Where a schema is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// An `http` or `https` URL.
    Url(String),
    /// A local file.
    Path(PathBuf),
    /// The schema document itself.
    Text(String),
}

impl SchemaSource {
    /// Classifies a user provided locator.
    ///
    /// `http(s)://` URLs are downloaded, `file://` URLs and plain strings are read from the file system,
    /// and strings that look like a document (markup or several lines) are used as is.
    ///
    /// ```
    /// use oxcrm::SchemaSource;
    /// use std::path::PathBuf;
    ///
    /// assert_eq!(
    ///     SchemaSource::from_locator("https://cidoc-crm.org/rdfs/cidoc_crm.rdfs"),
    ///     SchemaSource::Url("https://cidoc-crm.org/rdfs/cidoc_crm.rdfs".into())
    /// );
    /// assert_eq!(
    ///     SchemaSource::from_locator("schema.rdfs"),
    ///     SchemaSource::Path(PathBuf::from("schema.rdfs"))
    /// );
    /// assert!(matches!(SchemaSource::from_locator("<rdf:RDF/>"), SchemaSource::Text(_)));
    /// ```
    pub fn from_locator(locator: &str) -> Self {
        if let Ok(url) = Url::parse(locator) {
            match url.scheme() {
                "http" | "https" => return Self::Url(locator.into()),
                "file" => {
                    if let Ok(path) = url.to_file_path() {
                        return Self::Path(path);
                    }
                }
                _ => (),
            }
        }
        if locator.trim_start().starts_with('<') || locator.contains('\n') {
            Self::Text(locator.into())
        } else {
            Self::Path(locator.into())
        }
    }

    /// The IRI relative references in the document are resolved against.
    pub fn base_iri(&self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url.clone()),
            Self::Path(path) => fs::canonicalize(path)
                .ok()
                .and_then(|path| Url::from_file_path(path).ok())
                .map(String::from),
            Self::Text(_) => None,
        }
    }

    /// The file name extension of the location, if any.
    pub fn extension(&self) -> Option<&str> {
        match self {
            Self::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                let name = path.rsplit('/').next()?;
                Path::new(name).extension().and_then(OsStr::to_str)
            }
            Self::Path(path) => path.extension().and_then(OsStr::to_str),
            Self::Text(_) => None,
        }
    }

    /// Reads the whole content of the source.
    pub(crate) fn fetch(&self, http: &HttpOptions) -> Result<FetchedSource, SchemaLoadError> {
        match self {
            Self::Url(url) => fetch_url(url, http),
            Self::Path(path) => Ok(FetchedSource {
                content: fs::read(path).map_err(|error| SchemaLoadError::Io {
                    location: self.to_string(),
                    error,
                })?,
                media_type: None,
            }),
            Self::Text(text) => Ok(FetchedSource {
                content: text.as_bytes().to_vec(),
                media_type: None,
            }),
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Text(text) => write!(f, "inline schema of {} bytes", text.len()),
        }
    }
}

impl From<&str> for SchemaSource {
    fn from(locator: &str) -> Self {
        Self::from_locator(locator)
    }
}

impl From<PathBuf> for SchemaSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Options used when the schema is downloaded.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Option<Duration>,
    pub redirection_limit: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(60)),
            redirection_limit: 5,
        }
    }
}

/// The raw content of a schema source.
pub(crate) struct FetchedSource {
    pub content: Vec<u8>,
    pub media_type: Option<String>,
}

#[cfg(feature = "http-client")]
fn fetch_url(url: &str, options: &HttpOptions) -> Result<FetchedSource, SchemaLoadError> {
    let io_error = |error| SchemaLoadError::Io {
        location: url.into(),
        error,
    };
    let client = crate::http::Client::new(options.timeout, options.redirection_limit)
        .map_err(io_error)?;
    let (media_type, content) = client.get(url, ACCEPT).map_err(io_error)?;
    Ok(FetchedSource {
        content,
        media_type,
    })
}

#[cfg(not(feature = "http-client"))]
fn fetch_url(url: &str, _options: &HttpOptions) -> Result<FetchedSource, SchemaLoadError> {
    Err(SchemaLoadError::UnsupportedSource {
        location: url.into(),
        reason: "oxcrm has been built without the http-client feature".into(),
    })
}

/// Guesses the serialization of a fetched schema.
///
/// The file extension wins over the HTTP media type, which wins over the first characters of the content.
pub(crate) fn detect_format(source: &SchemaSource, fetched: &FetchedSource) -> RdfFormat {
    if let Some(format) = source.extension().and_then(format_from_extension) {
        return format;
    }
    if let Some(format) = fetched
        .media_type
        .as_deref()
        .and_then(RdfFormat::from_media_type)
    {
        return format;
    }
    sniff_format(&fetched.content)
}

fn format_from_extension(extension: &str) -> Option<RdfFormat> {
    if extension.eq_ignore_ascii_case("rdfs") || extension.eq_ignore_ascii_case("owl") {
        return Some(RdfFormat::RdfXml);
    }
    RdfFormat::from_extension(extension)
}

/// An XML declaration or element tag means RDF/XML, anything else (including a leading `<iri>`) Turtle.
fn sniff_format(content: &[u8]) -> RdfFormat {
    let start = content
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(content.len());
    let Some(tag) = content[start..].strip_prefix(b"<") else {
        return RdfFormat::Turtle;
    };
    if matches!(tag.first(), Some(b'?' | b'!')) {
        return RdfFormat::RdfXml;
    }
    let name = tag
        .split(|b| b.is_ascii_whitespace() || matches!(*b, b'>' | b'/'))
        .next()
        .unwrap_or_default();
    if name.first().is_some_and(u8::is_ascii_alphabetic) && !name.ends_with(b":") {
        RdfFormat::RdfXml
    } else {
        RdfFormat::Turtle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(content: &str, media_type: Option<&str>) -> FetchedSource {
        FetchedSource {
            content: content.as_bytes().to_vec(),
            media_type: media_type.map(Into::into),
        }
    }

    #[test]
    fn locator_classification() {
        assert_eq!(
            SchemaSource::from_locator("http://example.com/crm.rdfs"),
            SchemaSource::Url("http://example.com/crm.rdfs".into())
        );
        assert_eq!(
            SchemaSource::from_locator("data/crm.ttl"),
            SchemaSource::Path("data/crm.ttl".into())
        );
        assert!(matches!(
            SchemaSource::from_locator("@prefix ex: <http://example.com/> .\nex:a a ex:B ."),
            SchemaSource::Text(_)
        ));
    }

    #[test]
    fn url_extension_ignores_query() {
        let source = SchemaSource::Url("http://example.com/crm/cidoc_crm_v7.1.rdfs?download=1".into());
        assert_eq!(source.extension(), Some("rdfs"));
    }

    #[test]
    fn extension_beats_media_type() {
        let source = SchemaSource::Path("crm.rdfs".into());
        assert_eq!(
            detect_format(&source, &fetched("", Some("text/turtle"))),
            RdfFormat::RdfXml
        );
    }

    #[test]
    fn media_type_beats_sniffing() {
        let source = SchemaSource::Url("http://example.com/crm".into());
        assert_eq!(
            detect_format(&source, &fetched("<?xml version=\"1.0\"?>", Some("text/turtle"))),
            RdfFormat::Turtle
        );
    }

    #[test]
    fn sniffing() {
        assert_eq!(sniff_format(b"  <?xml version=\"1.0\"?>"), RdfFormat::RdfXml);
        assert_eq!(sniff_format(b"<rdf:RDF>"), RdfFormat::RdfXml);
        assert_eq!(sniff_format(b"<RDF xmlns=\"x\"/>"), RdfFormat::RdfXml);
        assert_eq!(
            sniff_format(b"<http://example.com/s> <http://example.com/p> <http://example.com/o> ."),
            RdfFormat::Turtle
        );
        assert_eq!(sniff_format(b"@prefix ex: <http://example.com/> ."), RdfFormat::Turtle);
    }
}
