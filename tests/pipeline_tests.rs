//! Dictionary, configuration and catalog persistence working together

mod common;

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use common::write_file;
use data_source_sdk::catalog::{MetadataCatalog, VariableType};
use data_source_sdk::config::EtlConfig;
use data_source_sdk::dictionary::{DictionaryEntry, catalog_from_entries};
use data_source_sdk::location::FilesystemLocation;
use data_source_sdk::models::Value;
use data_source_sdk::source::{AccessMode, DataSource, Partitioning};
use tempfile::TempDir;

fn entries() -> Vec<DictionaryEntry> {
    vec![
        DictionaryEntry::new("ID", "NUM", 8, "8."),
        DictionaryEntry::new("AMOUNT", "NUM", 8, "COMMA10.2"),
        DictionaryEntry::new("BOOKED", "NUM", 8, "DDMMYY10."),
        DictionaryEntry::new("LABEL", "CHAR", 12, ""),
    ]
}

#[test]
fn test_dictionary_catalog_drives_a_file_copy() -> Result<()> {
    let dir = TempDir::new()?;
    let config_path = write_file(
        dir.path(),
        "etl.toml",
        "[source]\nchunk_size = 2\n\n[file]\ndelimiter = \";\"\n",
    );
    let config = EtlConfig::from_file(&config_path)?;
    assert_eq!(config.file.delimiter, ';');

    let catalog = catalog_from_entries(&entries())?;
    assert!(catalog.is_case_sensitive());
    assert_eq!(catalog.get_type("BOOKED")?, VariableType::Date);
    assert_eq!(catalog.get_type("AMOUNT")?, VariableType::Float);

    let input = write_file(
        dir.path(),
        "in/ledger.csv",
        "ID;AMOUNT;BOOKED;LABEL\n1;10.5;04/03/2021;rent\n2;3;05/03/2021;food\n3;;;\n",
    );
    let mut source = DataSource::file(
        FilesystemLocation::new([input.display().to_string()])?,
        config.file.clone(),
    )
    .dictionary(Arc::new(catalog.clone()))
    .config(config.source.clone())
    .open(AccessMode::ReadOnly)?;
    assert_eq!(source.shape().rows, Some(3));
    let frame = source.read_all()?.frame;
    assert_eq!(
        frame.column("AMOUNT").map(|c| c.values.clone()),
        Some(vec![Value::Float(10.5), Value::Float(3.0), Value::Null])
    );

    let output = dir.path().join("out/ledger.csv").display().to_string();
    let mut sink = DataSource::file(FilesystemLocation::literal([output.clone()])?, config.file)
        .metadata(catalog)
        .config(config.source)
        .open(AccessMode::Create)?;
    sink.write(frame, &Partitioning::Even)?;

    let written = fs::read_to_string(&output)?;
    assert_eq!(
        written,
        "AMOUNT;BOOKED;ID;LABEL\n10.5;04/03/2021;1;rent\n3;05/03/2021;2;food\n;;3;\n"
    );
    Ok(())
}

#[test]
fn test_catalog_survives_json_round_trip() -> Result<()> {
    let catalog = catalog_from_entries(&entries())?;
    let json = catalog.to_json()?;
    let restored = MetadataCatalog::from_json(&json)?;
    assert_eq!(restored, catalog);
    assert!(restored.schema_differences(&catalog).is_empty());
    assert_eq!(restored.get_datetime_format("BOOKED")?, Some("dd/MM/yyyy"));
    Ok(())
}
