//! Derivation of table keys and field names from schema IRIs.

/// The names derived from the trailing segment of a schema IRI.
///
/// ```
/// use oxcrm::DerivedName;
///
/// let name = DerivedName::from_iri("http://www.cidoc-crm.org/cidoc-crm/E21_Person");
/// assert_eq!(name.identifier, "E21Person");
/// assert_eq!(name.safe_name, "e21_person");
/// assert_eq!(name.code, "E21");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedName {
    /// Title-cased concatenation of the segment tokens, used as type name and table key.
    pub identifier: String,
    /// Lowercase underscore-joined variant, usable as a field name.
    pub safe_name: String,
    /// The first underscore-delimited token, verbatim.
    pub code: String,
}

impl DerivedName {
    /// Derives the names from an IRI.
    ///
    /// The local name is what follows the last `#` if the IRI contains one, else what follows the last `/`.
    pub fn from_iri(iri: &str) -> Self {
        let local_name = local_name(iri);
        let tokens = local_name.split('_').collect::<Vec<_>>();
        let identifier = title_case(&tokens.join(" "))
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();
        let safe_name = tokens.join("_").replace('-', "").to_lowercase();
        Self {
            identifier,
            safe_name,
            code: tokens[0].to_owned(),
        }
    }
}

fn local_name(iri: &str) -> &str {
    let delimiter = if iri.contains('#') { '#' } else { '/' };
    iri.rsplit(delimiter).next().unwrap_or(iri)
}

/// Upper-cases the first cased character of every run of cased characters and lower-cases the others.
///
/// Any character without case (digits, spaces, punctuation) starts a new run, so `p1i` becomes `P1I`.
fn title_case(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut previous_is_cased = false;
    for c in text.chars() {
        let is_cased = c.is_lowercase() || c.is_uppercase();
        if !is_cased {
            output.push(c);
        } else if previous_is_cased {
            output.extend(c.to_lowercase());
        } else {
            output.extend(c.to_uppercase());
        }
        previous_is_cased = is_cased;
    }
    output
}
