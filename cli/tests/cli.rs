//! Integration tests of the oxcrm command line tool.

use anyhow::Result;
use assert_cmd::Command;
use assert_fs::NamedTempFile;
use assert_fs::prelude::*;
use predicates::prelude::*;

const SCHEMA: &str = r#"
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix crm: <http://www.cidoc-crm.org/cidoc-crm/> .
crm:E1_CRM_Entity a rdfs:Class ; rdfs:label "CRM Entity"@en .
crm:E39_Actor a rdfs:Class ; rdfs:label "Actor"@en ; rdfs:subClassOf crm:E1_CRM_Entity .
crm:E21_Person a rdfs:Class ; rdfs:label "Person"@en ;
    rdfs:comment "Real persons who live or are assumed to have lived." ;
    rdfs:subClassOf crm:E39_Actor .
crm:P1_is_identified_by a rdf:Property ; rdfs:label "is identified by"@en ;
    rdfs:domain crm:E1_CRM_Entity ; rdfs:range crm:E41_Appellation .
crm:P1i_identifies a rdf:Property ;
    rdfs:domain crm:E41_Appellation ; rdfs:range crm:E1_CRM_Entity .
crm:P152_has_parent a rdf:Property ; rdfs:label "has parent"@en ;
    rdfs:domain crm:E21_Person ; rdfs:range crm:E21_Person .
crm:P97_from_father a rdf:Property ; rdfs:label "from father"@en ;
    rdfs:domain crm:E21_Person ; rdfs:range crm:E21_Person ;
    rdfs:subPropertyOf crm:P152_has_parent .
"#;

fn cli_command() -> Command {
    let mut command = Command::cargo_bin("oxcrm").unwrap();
    command.env("RUST_LOG", "warn");
    command
}

fn schema_file() -> Result<NamedTempFile> {
    let file = NamedTempFile::new("crm.ttl")?;
    file.write_str(SCHEMA)?;
    Ok(file)
}

#[test]
fn cli_help() {
    cli_command()
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("Usage: oxcrm"));
}

#[test]
fn cli_import_to_stdout() -> Result<()> {
    let schema = schema_file()?;
    cli_command()
        .arg("import")
        .arg("--schema")
        .arg(schema.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"E21Person\"")
                .and(predicate::str::contains("\"subClassOf\""))
                .and(predicate::str::contains("\"subPropertyOf\": \"P152HasParent\""))
                .and(predicate::str::contains("P1IIdentifies").not()),
        );
    Ok(())
}

#[test]
fn cli_import_to_file_and_inspect() -> Result<()> {
    let schema = schema_file()?;
    let output = NamedTempFile::new("tables.json")?;
    cli_command()
        .arg("import")
        .arg("-s")
        .arg(schema.path())
        .arg("--output")
        .arg(output.path())
        .assert()
        .success()
        .stdout("");
    output.assert(predicate::str::contains("\"E41Appellation\""));

    cli_command()
        .arg("inspect")
        .arg("--tables")
        .arg(output.path())
        .arg("--type")
        .arg("E21Person")
        .arg("--class-field")
        .arg("uri=string")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("node type E21Person: Person")
                .and(predicate::str::contains(
                    "ancestors: E1CrmEntity, E21Person, E39Actor",
                ))
                .and(predicate::str::contains("fields: value (string), uri (string)"))
                .and(predicate::str::contains(
                    "p1_is_identified_by -> E41Appellation (P1IsIdentifiedBy)",
                ))
                .and(predicate::str::contains("Real persons who live")),
        );
    Ok(())
}

#[test]
fn cli_inspect_summary() -> Result<()> {
    let schema = schema_file()?;
    cli_command()
        .arg("inspect")
        .arg("--schema")
        .arg(schema.path())
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("5 node types, 3 relationship types")
                .and(predicate::str::contains("E39Actor < E1CrmEntity"))
                .and(predicate::str::contains("P97FromFather: E21Person -> E21Person")),
        );
    Ok(())
}

#[test]
fn cli_inspect_relationship_type() -> Result<()> {
    let schema = schema_file()?;
    cli_command()
        .arg("inspect")
        .arg("--schema")
        .arg(schema.path())
        .arg("-t")
        .arg("P97FromFather")
        .arg("--rel-field")
        .arg("certainty=float")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("relationship type P97FromFather: from father")
                .and(predicate::str::contains("parent: P152HasParent"))
                .and(predicate::str::contains("fields: value (string), certainty (float)")),
        );
    Ok(())
}

#[test]
fn cli_inspect_unknown_type() -> Result<()> {
    let schema = schema_file()?;
    cli_command()
        .arg("inspect")
        .arg("--schema")
        .arg(schema.path())
        .arg("--type")
        .arg("E999Nothing")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E999Nothing is not defined"));
    Ok(())
}

#[test]
fn cli_bad_field_declaration() -> Result<()> {
    let schema = schema_file()?;
    cli_command()
        .arg("inspect")
        .arg("--schema")
        .arg(schema.path())
        .arg("--class-field")
        .arg("uri")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --class-field"));
    Ok(())
}

#[test]
fn cli_unparsable_schema() -> Result<()> {
    let schema = NamedTempFile::new("crm.rdfs")?;
    schema.write_str("not a schema")?;
    cli_command()
        .arg("import")
        .arg("--schema")
        .arg(schema.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to import the schema"));
    Ok(())
}

#[test]
fn cli_json_logs() -> Result<()> {
    let schema = schema_file()?;
    cli_command()
        .env("RUST_LOG", "info")
        .arg("--log-format")
        .arg("json")
        .arg("inspect")
        .arg("--schema")
        .arg(schema.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("\"message\":\"schema imported\""));
    Ok(())
}
