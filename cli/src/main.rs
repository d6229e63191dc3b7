use crate::cli::{Args, Command, LogFormat};
use anyhow::{Context, bail};
use clap::Parser;
use oxcrm::{
    ExtensionFields, ImportOptions, ModelExtensions, NodeType, Registry, RelType, SchemaImporter,
    SchemaSource, SchemaTables, SubPropertyResolution,
};
use oxrdfio::RdfFormat;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

mod cli;

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);
    match args.command {
        Command::Import {
            schema,
            format,
            base,
            legacy_subproperties,
            output,
        } => {
            let options = ImportOptions {
                format: format.as_deref().map(rdf_format_from_name).transpose()?,
                base_iri: base,
                sub_properties: if legacy_subproperties {
                    SubPropertyResolution::LastClass
                } else {
                    SubPropertyResolution::Declared
                },
                ..ImportOptions::default()
            };
            let tables = import(&schema, options)?;
            if let Some(output) = output {
                write_tables(&tables, BufWriter::new(File::create(&output).with_context(
                    || format!("Failed to create {}", output.display()),
                )?))?;
                info!(output = %output.display(), "tables written");
            } else {
                write_tables(&tables, io::stdout().lock())?;
            }
            Ok(())
        }
        Command::Inspect {
            schema,
            tables,
            type_name,
            class_fields,
            rel_fields,
        } => {
            let extensions = ModelExtensions::new(
                ExtensionFields::from_declarations(class_fields.iter().map(String::as_str))
                    .context("Invalid --class-field")?,
                ExtensionFields::from_declarations(rel_fields.iter().map(String::as_str))
                    .context("Invalid --rel-field")?,
            );
            let tables = match (schema, tables) {
                (_, Some(tables)) => read_tables(&tables)?,
                (Some(schema), None) => import(&schema, ImportOptions::default())?,
                (None, None) => bail!("Either --schema or --tables must be set"),
            };
            let mut registry = Registry::new();
            registry
                .extend(&tables, &extensions)
                .context("Failed to build the type hierarchy")?;
            registry.freeze();

            let mut stdout = io::stdout().lock();
            if let Some(name) = type_name {
                if let Some(node_type) = registry.node_type(&name) {
                    describe_node_type(node_type, &mut stdout)?;
                } else if let Some(rel_type) = registry.rel_type(&name) {
                    describe_rel_type(rel_type, &mut stdout)?;
                } else {
                    bail!("The type {name} is not defined by the schema")
                }
            } else {
                summarize(&registry, &mut stdout)?;
            }
            stdout.flush()?;
            Ok(())
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
    }
}

fn import(schema: &str, options: ImportOptions) -> anyhow::Result<SchemaTables> {
    SchemaImporter::with_options(options)
        .import(&SchemaSource::from_locator(schema))
        .with_context(|| format!("Failed to import the schema {schema}"))
}

fn read_tables(path: &Path) -> anyhow::Result<SchemaTables> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    SchemaTables::from_reader(BufReader::new(file))
        .with_context(|| format!("{} does not contain schema tables", path.display()))
}

fn write_tables(tables: &SchemaTables, mut writer: impl Write) -> anyhow::Result<()> {
    tables
        .to_writer(&mut writer)
        .context("Failed to write the tables")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn rdf_format_from_name(name: &str) -> anyhow::Result<RdfFormat> {
    if name.eq_ignore_ascii_case("rdfs") || name.eq_ignore_ascii_case("owl") {
        return Ok(RdfFormat::RdfXml);
    }
    if let Some(t) = RdfFormat::from_extension(name) {
        return Ok(t);
    }
    if let Some(t) = RdfFormat::from_media_type(name) {
        return Ok(t);
    }
    bail!("The file format '{name}' is unknown")
}

fn summarize(registry: &Registry, mut output: impl Write) -> io::Result<()> {
    writeln!(
        output,
        "{} node types, {} relationship types",
        registry.node_types().count(),
        registry.rel_types().count()
    )?;
    for node_type in registry.node_types() {
        let parents = node_type
            .supertypes
            .iter()
            .map(|parent| parent.name.as_str())
            .collect::<Vec<_>>();
        if parents.is_empty() {
            writeln!(output, "{node_type}")?;
        } else {
            writeln!(output, "{node_type} < {}", parents.join(", "))?;
        }
    }
    for rel_type in registry.rel_types() {
        writeln!(
            output,
            "{rel_type}: {} -> {}",
            rel_type.domain.as_deref().unwrap_or("*"),
            rel_type.range
        )?;
    }
    Ok(())
}

fn describe_node_type(node_type: &NodeType, mut output: impl Write) -> io::Result<()> {
    writeln!(output, "node type {node_type}: {}", node_type.label)?;
    if let Some(code) = &node_type.code {
        writeln!(output, "code: {code}")?;
    }
    if let Some(safe_name) = &node_type.safe_name {
        writeln!(output, "safe name: {safe_name}")?;
    }
    let supertypes = node_type
        .supertypes
        .iter()
        .map(|parent| parent.name.as_str())
        .collect::<Vec<_>>();
    if !supertypes.is_empty() {
        writeln!(output, "supertypes: {}", supertypes.join(", "))?;
    }
    writeln!(
        output,
        "ancestors: {}",
        node_type
            .ancestors
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    )?;
    writeln!(
        output,
        "fields: {}",
        node_type
            .fields
            .iter()
            .map(|field| format!("{} ({})", field.name, field.kind))
            .collect::<Vec<_>>()
            .join(", ")
    )?;
    let relationships = node_type.all_relationships();
    if !relationships.is_empty() {
        writeln!(output, "relationships:")?;
        for relationship in relationships {
            writeln!(
                output,
                "  {} -> {} ({})",
                relationship.name, relationship.target, relationship.rel_type
            )?;
        }
    }
    if let Some(doc) = &node_type.doc {
        writeln!(output, "\n{doc}")?;
    }
    Ok(())
}

fn describe_rel_type(rel_type: &RelType, mut output: impl Write) -> io::Result<()> {
    writeln!(output, "relationship type {rel_type}: {}", rel_type.label)?;
    writeln!(output, "code: {}", rel_type.code)?;
    writeln!(output, "safe name: {}", rel_type.safe_name)?;
    if let Some(domain) = &rel_type.domain {
        writeln!(output, "domain: {domain}")?;
    }
    writeln!(output, "range: {}", rel_type.range)?;
    if let Some(parent) = &rel_type.parent {
        writeln!(output, "parent: {parent}")?;
    }
    if !rel_type.fields.is_empty() {
        writeln!(
            output,
            "fields: {}",
            rel_type
                .fields
                .iter()
                .map(|field| format!("{} ({})", field.name, field.kind))
                .collect::<Vec<_>>()
                .join(", ")
        )?;
    }
    if let Some(doc) = &rel_type.doc {
        writeln!(output, "\n{doc}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names() -> anyhow::Result<()> {
        assert_eq!(rdf_format_from_name("rdfs")?, RdfFormat::RdfXml);
        assert_eq!(rdf_format_from_name("OWL")?, RdfFormat::RdfXml);
        assert_eq!(rdf_format_from_name("ttl")?, RdfFormat::Turtle);
        assert_eq!(
            rdf_format_from_name("application/rdf+xml")?,
            RdfFormat::RdfXml
        );
        assert!(rdf_format_from_name("docx").is_err());
        Ok(())
    }
}
