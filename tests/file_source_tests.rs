//! File-backed data source tests

mod common;

use std::fs;
use std::ops::ControlFlow;
use std::sync::Arc;

use common::write_file;
use data_source_sdk::catalog::{MetadataCatalog, VariableMetadata, VariableType};
use data_source_sdk::location::FilesystemLocation;
use data_source_sdk::models::{Column, DataFrame, Value};
use data_source_sdk::source::{
    AccessMode, DataSource, FileOptions, Partitioning, SourceConfig, SourceError, SourceKind,
};
use tempfile::TempDir;

fn people_catalog() -> MetadataCatalog {
    MetadataCatalog::new(
        vec![
            VariableMetadata::new("name", VariableType::Text).num_bytes(10),
            VariableMetadata::new("code", VariableType::Text).num_bytes(3),
            VariableMetadata::new("age", VariableType::Integer),
        ],
        false,
    )
    .expect("Failed to build catalog")
}

fn numbers_catalog() -> MetadataCatalog {
    MetadataCatalog::new(
        vec![
            VariableMetadata::new("id", VariableType::Integer),
            VariableMetadata::new("grp", VariableType::Text).num_bytes(1),
        ],
        false,
    )
    .expect("Failed to build catalog")
}

fn numbers_file(rows: usize) -> String {
    let mut content = String::from("id,grp\n");
    for i in 0..rows {
        content.push_str(&format!("{},{}\n", i, if i % 2 == 0 { "a" } else { "b" }));
    }
    content
}

fn open_read(
    pattern: &str,
    catalog: MetadataCatalog,
    config: SourceConfig,
) -> Result<DataSource, SourceError> {
    let location = FilesystemLocation::new([pattern]).expect("Failed to build location");
    DataSource::file(location, FileOptions::default())
        .dictionary(Arc::new(catalog))
        .config(config)
        .open(AccessMode::ReadOnly)
}

#[test]
fn test_read_all_types_columns_from_metadata() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "people.csv", "name,code,age\na,x,1\nb,y,2\n");

    let mut source = open_read(
        &path.display().to_string(),
        people_catalog(),
        SourceConfig::default(),
    )
    .expect("Failed to open source");
    assert_eq!(source.kind(), SourceKind::File);
    assert_eq!(source.shape().rows, Some(2));
    assert_eq!(source.shape().columns, 3);
    assert_eq!(source.num_data_locations(), 1);
    assert_eq!(source.get_name(0).as_deref(), Some("people.csv"));

    let result = source.read_all().expect("Failed to read");
    let frame = result.frame;
    assert_eq!(frame.column_names(), vec!["AGE", "CODE", "NAME"]);
    assert_eq!(
        frame.column("AGE").expect("AGE column").values,
        vec![Value::Integer(1), Value::Integer(2)]
    );
    assert_eq!(
        frame.column("NAME").expect("NAME column").values,
        vec![Value::from("a"), Value::from("b")]
    );
}

#[test]
fn test_chunks_follow_chunk_size_across_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_file(dir.path(), "a.csv", &numbers_file(10));
    write_file(dir.path(), "b.csv", &numbers_file(3));
    let pattern = dir.path().join("*.csv").display().to_string();

    let config = SourceConfig::builder()
        .chunk_size(4)
        .build()
        .expect("Failed to build config");
    let mut source = open_read(&pattern, numbers_catalog(), config).expect("Failed to open source");
    assert_eq!(source.shape().rows, Some(13));

    let mut sizes = Vec::new();
    let summary = source
        .read_chunks(|chunk| {
            sizes.push(chunk.num_rows());
            ControlFlow::Continue(())
        })
        .expect("Failed to read chunks");
    assert_eq!(sizes, vec![4, 4, 2, 3]);
    assert!(summary.drained);
    assert_eq!(summary.rows, 13);
    assert_eq!(summary.chunks, 4);
}

#[test]
fn test_break_then_resume() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.csv", &numbers_file(10));
    let config = SourceConfig::builder()
        .chunk_size(4)
        .build()
        .expect("Failed to build config");
    let mut source = open_read(&path.display().to_string(), numbers_catalog(), config)
        .expect("Failed to open source");

    let first = source
        .read_chunks(|_| ControlFlow::Break(()))
        .expect("Failed to read first chunk");
    assert!(!first.drained);
    assert_eq!(first.rows, 4);

    let mut ids = Vec::new();
    let rest = source
        .read_chunks(|chunk| {
            ids.extend(chunk.column("ID").expect("ID column").values.iter().cloned());
            ControlFlow::Continue(())
        })
        .expect("Failed to resume");
    assert!(rest.drained);
    assert_eq!(rest.rows, 6);
    assert_eq!(ids.first(), Some(&Value::Integer(4)));
}

#[test]
fn test_truncated_file_is_a_row_count_mismatch() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.csv", &numbers_file(10));
    let mut source = open_read(
        &path.display().to_string(),
        numbers_catalog(),
        SourceConfig::default(),
    )
    .expect("Failed to open source");
    assert_eq!(source.shape().rows, Some(10));

    write_file(dir.path(), "n.csv", &numbers_file(9));
    let err = source.read_all().unwrap_err();
    assert!(matches!(
        err,
        SourceError::RowCountMismatch {
            expected: 10,
            actual: 9
        }
    ));
    assert!(err.user_message().contains("Hint:"));
}

#[test]
fn test_unexpected_columns_are_schema_drift() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.csv", "id,other\n1,x\n");
    let mut source = open_read(
        &path.display().to_string(),
        numbers_catalog(),
        SourceConfig::default(),
    )
    .expect("Failed to open source");

    match source.read_all().unwrap_err() {
        SourceError::SchemaDrift {
            missing,
            unexpected,
            ..
        } => {
            assert_eq!(missing, vec!["GRP"]);
            assert_eq!(unexpected, vec!["OTHER"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_location_cannot_be_opened() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("absent.csv").display().to_string();
    let location = FilesystemLocation::literal([path]).expect("Failed to build location");
    let err = DataSource::file(location, FileOptions::default())
        .dictionary(Arc::new(numbers_catalog()))
        .open(AccessMode::ReadOnly)
        .unwrap_err();
    assert!(matches!(err, SourceError::NotFound(_)));
}

#[test]
fn test_read_only_source_rejects_writes() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.csv", &numbers_file(2));
    let mut source = open_read(
        &path.display().to_string(),
        numbers_catalog(),
        SourceConfig::default(),
    )
    .expect("Failed to open source");

    let frame = DataFrame::from_columns(vec![
        Column::new("id", vec![Value::Integer(1)]),
        Column::new("grp", vec!["a".into()]),
    ])
    .expect("Failed to build frame");
    assert!(matches!(
        source.write(frame, &Partitioning::Even),
        Err(SourceError::AccessMode { .. })
    ));
    assert!(matches!(source.drop(), Err(SourceError::AccessMode { .. })));
}

#[test]
fn test_create_and_write_even_partitions() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let paths: Vec<String> = ["p1.csv", "p2.csv", "p3.csv"]
        .iter()
        .map(|n| dir.path().join("out").join(n).display().to_string())
        .collect();
    let location = FilesystemLocation::literal(paths.clone()).expect("Failed to build location");
    let config = SourceConfig::builder()
        .workers(3)
        .build()
        .expect("Failed to build config");

    let mut sink = DataSource::file(location, FileOptions::default())
        .metadata(numbers_catalog())
        .config(config)
        .open(AccessMode::Create)
        .expect("Failed to create sink");
    assert_eq!(sink.shape().rows, Some(0));
    assert!(sink.exists().expect("exists"));

    let ids: Vec<Value> = (0..10).map(Value::Integer).collect();
    let groups: Vec<Value> = (0..10).map(|i| Value::from(if i < 5 { "a" } else { "b" })).collect();
    let frame = DataFrame::from_columns(vec![Column::new("id", ids), Column::new("grp", groups)])
        .expect("Failed to build frame");

    let summary = sink
        .write(frame, &Partitioning::Even)
        .expect("Failed to write");
    assert_eq!(summary.rows_per_location, vec![4, 3, 3]);
    assert_eq!(summary.total(), 10);
    assert_eq!(sink.shape().rows, Some(10));

    let first = fs::read_to_string(&paths[0]).expect("Failed to read partition");
    assert_eq!(first, "GRP,ID\na,0\na,1\na,2\na,3\n");

    let mut reader = sink.read_only_copy();
    assert_eq!(reader.access_mode(), AccessMode::ReadOnly);
    let frame = reader.read_all().expect("Failed to read back").frame;
    let mut read_ids: Vec<i64> = frame
        .column("ID")
        .expect("ID column")
        .values
        .iter()
        .filter_map(Value::as_i64)
        .collect();
    read_ids.sort();
    assert_eq!(read_ids, (0..10).collect::<Vec<i64>>());
}

#[test]
fn test_write_by_variable_groups_rows() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let paths: Vec<String> = ["a.csv", "b.csv"]
        .iter()
        .map(|n| dir.path().join(n).display().to_string())
        .collect();
    let location = FilesystemLocation::literal(paths.clone()).expect("Failed to build location");
    let mut sink = DataSource::file(location, FileOptions::default())
        .metadata(numbers_catalog())
        .open(AccessMode::Create)
        .expect("Failed to create sink");

    let frame = DataFrame::from_columns(vec![
        Column::new("id", (0..5).map(Value::Integer).collect()),
        Column::new(
            "grp",
            ["b", "a", "b", "a", "b"].iter().map(|s| Value::from(*s)).collect(),
        ),
    ])
    .expect("Failed to build frame");

    let summary = sink
        .write(frame, &Partitioning::by_variable("grp"))
        .expect("Failed to write");
    assert_eq!(summary.rows_per_location, vec![2, 3]);
    let second = fs::read_to_string(&paths[1]).expect("Failed to read partition");
    assert_eq!(second, "GRP,ID\nb,0\nb,2\nb,4\n");
}

#[test]
fn test_append_extends_existing_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.csv", "grp,id\na,0\n");
    let location =
        FilesystemLocation::literal([path.display().to_string()]).expect("Failed to build location");
    let mut sink = DataSource::file(location, FileOptions::default())
        .dictionary(Arc::new(numbers_catalog()))
        .open(AccessMode::Append)
        .expect("Failed to open for append");
    assert_eq!(sink.shape().rows, Some(1));

    let frame = DataFrame::from_columns(vec![
        Column::new("ID", vec!["1".into(), "2".into()]),
        Column::new("GRP", vec!["b".into(), Value::Null]),
    ])
    .expect("Failed to build frame");
    sink.write(frame, &Partitioning::Even).expect("Failed to append");

    assert_eq!(
        fs::read_to_string(&path).expect("Failed to read file"),
        "grp,id\na,0\nb,1\n,2\n"
    );
    assert_eq!(sink.shape().rows, Some(3));
    assert_eq!(sink.compute_size().expect("Failed to count"), 3);
}

#[test]
fn test_uniques_count_values_and_missing() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.csv", "id,grp\n1,a\n2,b\n3,a\n4,\n");
    let source = open_read(
        &path.display().to_string(),
        numbers_catalog(),
        SourceConfig::default(),
    )
    .expect("Failed to open source");

    let uniques = source.get_uniques().expect("Failed to compute uniques");
    let groups = &uniques["GRP"];
    assert_eq!(groups.missing, 1);
    assert_eq!(groups.distinct(), 2);
    assert_eq!(groups.total(), 4);
    assert!(groups.counts.contains(&(Value::from("a"), 2)));
    assert_eq!(uniques["ID"].distinct(), 4);
}

#[test]
fn test_headerless_files_use_column_names() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(dir.path(), "n.txt", "1;a\n2;b\n");
    let options = FileOptions {
        delimiter: ';',
        has_header: false,
        column_names: Some(vec!["id".to_string(), "grp".to_string()]),
    };
    let location =
        FilesystemLocation::new([path.display().to_string()]).expect("Failed to build location");
    let mut source = DataSource::file(location, options)
        .dictionary(Arc::new(numbers_catalog()))
        .open(AccessMode::ReadOnly)
        .expect("Failed to open source");
    assert_eq!(source.shape().rows, Some(2));
    let frame = source.read_all().expect("Failed to read").frame;
    assert_eq!(
        frame.column("ID").expect("ID column").values,
        vec![Value::Integer(1), Value::Integer(2)]
    );
}

#[test]
fn test_dates_are_canonicalized_on_read_and_rendered_on_write() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let catalog = MetadataCatalog::new(
        vec![
            VariableMetadata::new("day", VariableType::Date).datetime_format("dd/MM/yyyy"),
            VariableMetadata::new("id", VariableType::Integer),
        ],
        false,
    )
    .expect("Failed to build catalog");
    let input = write_file(dir.path(), "in.csv", "day,id\n04/03/2021,7\n");
    let mut source = open_read(&input.display().to_string(), catalog.clone(), SourceConfig::default())
        .expect("Failed to open source");
    let frame = source.read_all().expect("Failed to read").frame;
    assert_eq!(
        frame.column("DAY").expect("DAY column").values[0],
        Value::Date(chrono::NaiveDate::from_ymd_opt(2021, 3, 4).expect("valid date"))
    );

    let output = dir.path().join("out.csv").display().to_string();
    let mut sink = DataSource::file(
        FilesystemLocation::literal([output.clone()]).expect("Failed to build location"),
        FileOptions::default(),
    )
    .metadata(catalog)
    .open(AccessMode::Create)
    .expect("Failed to create sink");
    sink.write(frame, &Partitioning::Even).expect("Failed to write");
    assert_eq!(
        fs::read_to_string(&output).expect("Failed to read output"),
        "DAY,ID\n04/03/2021,7\n"
    );
}

#[test]
fn test_multiline_text_reads_back_after_write() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let catalog = MetadataCatalog::new(
        vec![VariableMetadata::new("note", VariableType::Text).num_bytes(20)],
        false,
    )
    .expect("Failed to build catalog");
    let output = dir.path().join("notes.csv").display().to_string();
    let mut sink = DataSource::file(
        FilesystemLocation::literal([output.clone()]).expect("Failed to build location"),
        FileOptions::default(),
    )
    .metadata(catalog.clone())
    .open(AccessMode::Create)
    .expect("Failed to create sink");
    let frame = DataFrame::from_columns(vec![Column::new(
        "NOTE",
        vec![Value::from("line1\nline2"), Value::from("single")],
    )])
    .expect("Failed to build frame");
    sink.write(frame, &Partitioning::Even).expect("Failed to write");
    assert_eq!(
        fs::read_to_string(&output).expect("Failed to read output"),
        "NOTE\n\"line1\nline2\"\nsingle\n"
    );

    let mut source = open_read(&output, catalog, SourceConfig::default())
        .expect("Failed to open source");
    assert_eq!(source.shape().rows, Some(2));
    let values = source.read_all().expect("Failed to read").frame;
    assert_eq!(
        values.column("NOTE").expect("NOTE column").values,
        vec![Value::from("line1\nline2"), Value::from("single")]
    );
}
