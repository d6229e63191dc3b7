use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "oxcrm")]
/// OxCRM command line toolkit to import and inspect CIDOC-CRM schemas
pub struct Args {
    /// Format of the logs written to stderr
    ///
    /// The verbosity is set with the RUST_LOG environment variable, `info` by default.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import a schema and write its class and property tables as JSON
    Import {
        /// URL, file path or file:// URL of the schema
        #[arg(short, long, value_hint = ValueHint::AnyPath)]
        schema: String,
        /// The format of the schema
        ///
        /// It can be an extension like "rdfs", "ttl" or "owl" or a MIME type like "application/rdf+xml".
        /// By default the format is guessed from the file extension, the HTTP content type or the content itself.
        /// RDF/XML is always tried if the first attempt fails.
        #[arg(long, required = false)]
        format: Option<String>,
        /// Base IRI of the schema
        #[arg(long, value_hint = ValueHint::Url)]
        base: Option<String>,
        /// Resolve rdfs:subPropertyOf against the last class of the schema like the historical loaders
        ///
        /// By default each property reads its own rdfs:subPropertyOf values.
        #[arg(long)]
        legacy_subproperties: bool,
        /// File to write the tables to
        ///
        /// By default the tables are written to stdout.
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Build the type hierarchy of a schema and describe it
    Inspect {
        /// URL, file path or file:// URL of the schema
        #[arg(short, long, value_hint = ValueHint::AnyPath, required_unless_present = "tables", conflicts_with = "tables")]
        schema: Option<String>,
        /// JSON tables written by the import command
        #[arg(long, value_hint = ValueHint::FilePath)]
        tables: Option<PathBuf>,
        /// Name of a node or relationship type to describe
        ///
        /// By default a summary of the whole hierarchy is written.
        #[arg(short = 't', long = "type")]
        type_name: Option<String>,
        /// Extra field of every node type, as name=kind
        ///
        /// The kind is one of string, integer, float, boolean and datetime.
        #[arg(long = "class-field")]
        class_fields: Vec<String>,
        /// Extra field of every relationship type, as name=kind
        #[arg(long = "rel-field")]
        rel_fields: Vec<String>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable lines
    Text,
    /// One JSON object per line
    Json,
}
