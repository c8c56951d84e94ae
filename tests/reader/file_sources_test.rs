//! Tests for the Parquet and CSV row sources

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ltr_cohort::{
    CohortError, CsvRows, ParquetRows, RowSource, csv_to_parquet, open_row_source,
};
use parquet::arrow::ArrowWriter;
use tempfile::tempdir;

#[test]
fn test_parquet_rows_as_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("follow_up.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("PTCODE", DataType::Float64, true),
        Field::new("TRRIDCODE", DataType::Utf8, true),
        Field::new("HOSP", DataType::Utf8, true),
        Field::new("PXSTATDATE", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(vec![Some(17.0), Some(18.0)])),
            Arc::new(StringArray::from(vec![Some("A17"), Some("A18")])),
            Arc::new(StringArray::from(vec![Some("Y"), None])),
            Arc::new(StringArray::from(vec![Some("2020-04-01"), Some("2020-05-01")])),
        ],
    )
    .unwrap();

    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let rows = ParquetRows::new(&path).with_batch_size(1).read_rows(&[]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("TRRIDCODE"), "A17");
    assert_eq!(rows[0].get("PXSTATDATE"), "2020-04-01");
    assert!(rows[0].get("PTCODE").starts_with("17"));
    assert_eq!(rows[1].get("HOSP"), "");
}

#[test]
fn test_csv_rows_keep_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("primary.csv");
    let mut file = File::create(&path).unwrap();
    writeln!(file, "PTCODE,TRRIDCODE,AGE,DIAB").unwrap();
    writeln!(file, "12.0,A12,54,2.0").unwrap();
    writeln!(file, "13.0,A13,,1.0").unwrap();
    drop(file);

    let rows = CsvRows::new(&path).read_rows(&[]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("PTCODE"), "12.0");
    assert_eq!(rows[0].get("DIAB"), "2.0");
    assert_eq!(rows[1].get("AGE"), "");
    assert!(rows[1].contains("AGE"));
}

#[test]
fn test_csv_with_semicolons() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("primary.csv");
    std::fs::write(&path, "PTCODE;HOSP\n4.0;Y\n").unwrap();

    let rows = CsvRows::new(&path).with_delimiter(b';').read_rows(&[]).unwrap();
    assert_eq!(rows[0].get("HOSP"), "Y");
}

#[test]
fn test_empty_csv_is_missing_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "").unwrap();

    assert!(matches!(
        CsvRows::new(&path).read_rows(&[]),
        Err(CohortError::MissingField(_))
    ));
}

#[test]
fn test_source_chosen_by_extension() {
    let source = open_row_source(std::path::Path::new("extract.parquet")).unwrap();
    assert!(source.describe().starts_with("Parquet"));
    assert!(matches!(
        open_row_source(std::path::Path::new("extract.txt")),
        Err(CohortError::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let source = ParquetRows::new(dir.path().join("absent.parquet"));
    assert!(matches!(source.read_rows(&[]), Err(CohortError::Io(_))));
}

#[test]
fn test_parquet_projection_keeps_requested_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("wide.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("PTCODE", DataType::Float64, true),
        Field::new("COMMENTS", DataType::Utf8, true),
        Field::new("HOSP", DataType::Utf8, true),
        Field::new("REGION", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(vec![Some(5.0)])),
            Arc::new(StringArray::from(vec![Some("free text")])),
            Arc::new(StringArray::from(vec![Some("Y")])),
            Arc::new(StringArray::from(vec![Some("7")])),
        ],
    )
    .unwrap();
    let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let source = ParquetRows::new(&path);
    let rows = source.read_rows(&["HOSP", "PTCODE"]).unwrap();
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[0].get("HOSP"), "Y");
    assert!(!rows[0].contains("COMMENTS"));

    assert!(matches!(
        source.read_rows(&["PXSTATDATE"]),
        Err(CohortError::MissingField(_))
    ));
}

#[test]
fn test_csv_projection_keeps_requested_columns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("follow_up.csv");
    std::fs::write(&path, "PTCODE,NOTES,HOSP\n8.0,long note,Y\n9.0,,N\n").unwrap();

    let rows = CsvRows::new(&path).read_rows(&["PTCODE", "HOSP"]).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].len(), 2);
    assert_eq!(rows[1].get("HOSP"), "N");
    assert!(!rows[0].contains("NOTES"));

    assert!(matches!(
        CsvRows::new(&path).read_rows(&["AGE"]),
        Err(CohortError::MissingField(_))
    ));
}

#[test]
fn test_csv_quoted_header_with_delimiter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("quoted.csv");
    std::fs::write(&path, "PTCODE,\"LAST, FIRST\",HOSP\n3.0,\"Doe, J\",Y\n").unwrap();

    let rows = CsvRows::new(&path).read_rows(&[]).unwrap();
    assert_eq!(rows[0].len(), 3);
    assert_eq!(rows[0].get("LAST, FIRST"), "Doe, J");
    assert_eq!(rows[0].get("HOSP"), "Y");
}

#[test]
fn test_csv_converts_to_parquet() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("follow_up.csv");
    let output = dir.path().join("follow_up.parquet");
    std::fs::write(
        &input,
        "PTCODE,TRRIDCODE,HOSP,PXSTATDATE\n\
         31.0,A31,Y,2022-01-15\n\
         32.0,A32,,2022-02-01\n\
         33.0,A33,N,2022-03-01\n",
    )
    .unwrap();

    let written = csv_to_parquet(&input, &output).unwrap();
    assert_eq!(written, 3);

    let from_csv = CsvRows::new(&input).read_rows(&[]).unwrap();
    let from_parquet = ParquetRows::new(&output).read_rows(&[]).unwrap();
    assert_eq!(from_parquet, from_csv);
    assert_eq!(from_parquet[0].get("PTCODE"), "31.0");
    assert_eq!(from_parquet[1].get("HOSP"), "");
}

#[test]
fn test_conversion_in_batches() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("primary.csv");
    let output = dir.path().join("primary.parquet");
    let mut file = File::create(&input).unwrap();
    writeln!(file, "PTCODE;AGE").unwrap();
    for code in 0..25 {
        writeln!(file, "{code}.0;{}", 40 + code).unwrap();
    }
    drop(file);

    let written = CsvRows::new(&input)
        .with_delimiter(b';')
        .with_batch_size(4)
        .write_parquet(&output)
        .unwrap();
    assert_eq!(written, 25);

    let rows = ParquetRows::new(&output).read_rows(&["AGE"]).unwrap();
    assert_eq!(rows.len(), 25);
    assert_eq!(rows[24].get("AGE"), "64");
}
