//! Row sources for registry extracts
//!
//! The cohort builder consumes [`EncounterRow`]s. A [`RowSource`] produces
//! them from memory, a Parquet file or a CSV file. File sources project the
//! requested columns, read Arrow record batches, cast every column to text
//! and key the values by column name; nulls become empty strings.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, StringArray};
use arrow::compute::cast;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{CohortError, Result};
use crate::models::EncounterRow;
use crate::utils::logging::{
    create_spinner, finish_and_clear, log_operation_complete, log_operation_start,
};

/// Default batch size for file reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// A producer of encounter rows
pub trait RowSource {
    /// Short description for logs
    fn describe(&self) -> String;

    /// Read every row, keeping only `columns`
    ///
    /// An empty `columns` keeps every column. A requested column the source
    /// does not carry is a [`CohortError::MissingField`].
    fn read_rows(&self, columns: &[&str]) -> Result<Vec<EncounterRow>>;
}

/// Rows already in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRows {
    name: String,
    rows: Vec<EncounterRow>,
}

impl InMemoryRows {
    /// Wrap a list of rows
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<EncounterRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// The wrapped rows
    #[must_use]
    pub fn rows(&self) -> &[EncounterRow] {
        &self.rows
    }
}

impl RowSource for InMemoryRows {
    fn describe(&self) -> String {
        format!("{} ({} rows in memory)", self.name, self.rows.len())
    }

    fn read_rows(&self, columns: &[&str]) -> Result<Vec<EncounterRow>> {
        if columns.is_empty() {
            return Ok(self.rows.clone());
        }
        // in-memory rows have no schema; the first row stands in for one
        if let Some(first) = self.rows.first() {
            if let Some(missing) = columns.iter().find(|&&column| !first.contains(column)) {
                return Err(CohortError::MissingField(format!("{missing} in {}", self.name)));
            }
        }
        Ok(self
            .rows
            .iter()
            .map(|row| columns.iter().map(|&column| (column, row.get(column))).collect())
            .collect())
    }
}

/// Schema indices of the requested columns, sorted and deduplicated
///
/// `None` when every column is wanted.
fn projection(schema: &Schema, columns: &[&str], source: &Path) -> Result<Option<Vec<usize>>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let mut indices = columns
        .iter()
        .map(|&column| {
            schema.index_of(column).map_err(|_| {
                CohortError::MissingField(format!("{column} in {}", source.display()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    indices.sort_unstable();
    indices.dedup();
    Ok(Some(indices))
}

/// Text value of every cell of a batch, keyed by column name
fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<EncounterRow>> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let text = cast(column, &DataType::Utf8)?;
        let strings = text
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| {
                CohortError::UnsupportedFormat(format!(
                    "column {} did not cast to text",
                    field.name()
                ))
            })?
            .clone();
        columns.push((field.name().as_str(), strings));
    }

    let rows = (0..batch.num_rows())
        .map(|row| {
            columns
                .iter()
                .map(|(name, values)| {
                    let value = if values.is_null(row) {
                        ""
                    } else {
                        values.value(row)
                    };
                    (*name, value)
                })
                .collect()
        })
        .collect();
    Ok(rows)
}

/// Collect the rows of a batch iterator, logging the read
fn read_batches<I>(operation: &str, path: &Path, batches: I) -> Result<Vec<EncounterRow>>
where
    I: Iterator<Item = std::result::Result<RecordBatch, arrow::error::ArrowError>>,
{
    let start = Instant::now();
    let spinner = create_spinner(Some(&format!("{operation} {}", path.display())));

    let mut rows = Vec::new();
    for batch in batches {
        let batch = batch?;
        rows.extend(batch_to_rows(&batch)?);
        spinner.set_message(format!("{} rows from {}", rows.len(), path.display()));
    }

    finish_and_clear(&spinner);
    log_operation_complete("read", path, rows.len(), Some(start.elapsed()));
    Ok(rows)
}

/// Rows of a Parquet file
#[derive(Debug, Clone)]
pub struct ParquetRows {
    path: PathBuf,
    batch_size: usize,
}

impl ParquetRows {
    /// Read from `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the record batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

impl RowSource for ParquetRows {
    fn describe(&self) -> String {
        format!("Parquet file {}", self.path.display())
    }

    fn read_rows(&self, columns: &[&str]) -> Result<Vec<EncounterRow>> {
        log_operation_start("Reading parquet file", &self.path);
        let file = File::open(&self.path)?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(self.batch_size);

        let reader = match projection(builder.schema(), columns, &self.path)? {
            Some(indices) => {
                log::debug!(
                    "Projecting {} of {} columns",
                    indices.len(),
                    builder.schema().fields().len()
                );
                let mask = ProjectionMask::roots(builder.parquet_schema(), indices);
                builder.with_projection(mask).build()?
            }
            None => builder.build()?,
        };
        read_batches("Reading", &self.path, reader)
    }
}

/// Rows of a CSV file with a header line
///
/// Every column is read as text, so values reach the builder exactly as
/// they appear in the file.
#[derive(Debug, Clone)]
pub struct CsvRows {
    path: PathBuf,
    delimiter: u8,
    batch_size: usize,
}

impl CsvRows {
    /// Read comma-separated values from `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Use another field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Override the record batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    fn format(&self) -> Format {
        Format::default()
            .with_header(true)
            .with_delimiter(self.delimiter)
    }

    /// All-text schema named after the header line
    fn header_schema(&self) -> Result<Schema> {
        let (header, _) = self.format().infer_schema(File::open(&self.path)?, Some(0))?;
        if header.fields().is_empty() {
            return Err(CohortError::MissingField(format!(
                "header line of {}",
                self.path.display()
            )));
        }

        let fields: Vec<Field> = header
            .fields()
            .iter()
            .map(|field| Field::new(field.name().trim(), DataType::Utf8, true))
            .collect();
        Ok(Schema::new(fields))
    }

    /// Batch reader over the file, optionally projected
    fn batches(
        &self,
        schema: SchemaRef,
        projection: Option<Vec<usize>>,
    ) -> Result<arrow::csv::Reader<File>> {
        let mut builder = arrow::csv::ReaderBuilder::new(schema)
            .with_format(self.format())
            .with_batch_size(self.batch_size);
        if let Some(indices) = projection {
            builder = builder.with_projection(indices);
        }
        Ok(builder.build(File::open(&self.path)?)?)
    }

    /// Write the whole file to Parquet at `output`, every column as text
    ///
    /// Batches are streamed straight into the writer. Returns the number of
    /// rows written.
    pub fn write_parquet(&self, output: &Path) -> Result<usize> {
        log_operation_start("Converting CSV file", &self.path);
        let start = Instant::now();

        let schema = Arc::new(self.header_schema()?);
        let batches = self.batches(Arc::clone(&schema), None)?;
        let properties = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(File::create(output)?, schema, Some(properties))?;

        let spinner = create_spinner(Some(&format!("Converting {}", self.path.display())));
        let mut rows = 0;
        for batch in batches {
            let batch = batch?;
            writer.write(&batch)?;
            rows += batch.num_rows();
            spinner.set_message(format!("{rows} rows written to {}", output.display()));
        }
        writer.close()?;
        finish_and_clear(&spinner);

        log_operation_complete("converted", &self.path, rows, Some(start.elapsed()));
        log::info!("Parquet output written to {}", output.display());
        Ok(rows)
    }
}

impl RowSource for CsvRows {
    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }

    fn read_rows(&self, columns: &[&str]) -> Result<Vec<EncounterRow>> {
        log_operation_start("Reading CSV file", &self.path);
        let schema = self.header_schema()?;
        let projection = projection(&schema, columns, &self.path)?;
        let reader = self.batches(Arc::new(schema), projection)?;
        read_batches("Reading", &self.path, reader)
    }
}

/// Convert a comma-separated extract to Parquet
pub fn csv_to_parquet(input: &Path, output: &Path) -> Result<usize> {
    CsvRows::new(input).write_parquet(output)
}

/// Open a file source chosen by extension (`.parquet` or `.csv`)
pub fn open_row_source(path: &Path) -> Result<Box<dyn RowSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("parquet") => Ok(Box::new(ParquetRows::new(path))),
        Some("csv") => Ok(Box::new(CsvRows::new(path))),
        _ => Err(CohortError::UnsupportedFormat(path.display().to_string())),
    }
}
