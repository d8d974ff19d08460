//! Tabular file to columnar extract conversion.
//!
//! Reads Excel workbooks (via calamine) and CSV files, infers a column type
//! for each field, and writes the data as a columnar extract at the target
//! path using Arrow's Parquet writer.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::ArrowWriter;
use tracing::info;

use crate::ports::{ConversionReport, ConvertError, ExtractConverter};

/// Converter backed by Arrow's columnar format.
pub struct ArrowExtractConverter;

impl ArrowExtractConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ArrowExtractConverter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractConverter for ArrowExtractConverter {
    async fn convert(
        &self,
        source: &Path,
        output: Option<&Path>,
    ) -> Result<ConversionReport, ConvertError> {
        if !source.is_file() {
            return Err(ConvertError::SourceNotFound(source.display().to_string()));
        }

        let source = source.to_path_buf();
        let output = resolve_output(&source, output);

        // File parsing and encoding are CPU and disk bound.
        let report = tokio::task::spawn_blocking(move || convert_blocking(&source, &output))
            .await
            .map_err(|e| ConvertError::write(format!("conversion task failed: {}", e)))??;

        info!(
            input = %report.input_file.display(),
            output = %report.output_file.display(),
            rows = report.rows,
            columns = report.columns,
            "Conversion complete"
        );
        Ok(report)
    }
}

fn resolve_output(source: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        // Relative outputs land next to the source file.
        Some(path) => source
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(path),
        None => source.with_extension("hyper"),
    }
}

fn convert_blocking(source: &Path, output: &Path) -> Result<ConversionReport, ConvertError> {
    let extension = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "xlsb" => read_excel(source)?,
        "csv" => read_csv(source)?,
        other => {
            let shown = if other.is_empty() {
                "(none)".to_string()
            } else {
                format!(".{}", other)
            };
            return Err(ConvertError::UnsupportedFormat(shown));
        }
    };

    write_extract(&table, output)?;

    Ok(ConversionReport {
        input_file: source.to_path_buf(),
        output_file: output.to_path_buf(),
        rows: table.row_count(),
        columns: table.headers.len(),
        column_names: table.headers.clone(),
    })
}

/// One parsed cell, before column type inference.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Column-major table parsed from a source file.
struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl Table {
    fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

fn read_excel(source: &Path) -> Result<Table, ConvertError> {
    let mut workbook =
        open_workbook_auto(source).map_err(|e| ConvertError::read(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ConvertError::read("workbook has no sheets"))?
        .map_err(|e| ConvertError::read(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| ConvertError::read("sheet has no header row"))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(ConvertError::read("sheet has no header row"));
    }

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (index, column) in columns.iter_mut().enumerate() {
            let cell = match row.get(index) {
                None | Some(Data::Empty) => Cell::Null,
                Some(Data::Bool(b)) => Cell::Bool(*b),
                Some(Data::Int(i)) => Cell::Int(*i),
                Some(Data::Float(f)) => {
                    // Excel stores integers as floats
                    if f.fract() == 0.0 && f.abs() < (i64::MAX as f64) {
                        Cell::Int(*f as i64)
                    } else {
                        Cell::Float(*f)
                    }
                }
                Some(Data::String(s)) => parse_text(s),
                Some(other) => Cell::Text(other.to_string()),
            };
            column.push(cell);
        }
    }

    Ok(Table { headers, columns })
}

fn read_csv(source: &Path) -> Result<Table, ConvertError> {
    let mut reader =
        csv::Reader::from_path(source).map_err(|e| ConvertError::read(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ConvertError::read(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(ConvertError::read("CSV file has no header row"));
    }

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|e| ConvertError::read(e.to_string()))?;
        for (index, column) in columns.iter_mut().enumerate() {
            column.push(match record.get(index) {
                None | Some("") => Cell::Null,
                Some(field) => parse_text(field),
            });
        }
    }

    Ok(Table { headers, columns })
}

/// Parses a text field into the narrowest cell type it fits.
fn parse_text(text: &str) -> Cell {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Cell::Int(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Cell::Float(f);
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "true" => Cell::Bool(true),
        "false" => Cell::Bool(false),
        _ => Cell::Text(text.to_string()),
    }
}

/// Narrowest Arrow type that holds every cell in the column.
fn infer_type(column: &[Cell]) -> DataType {
    let mut data_type: Option<DataType> = None;
    for cell in column {
        let cell_type = match cell {
            Cell::Null => continue,
            Cell::Bool(_) => DataType::Boolean,
            Cell::Int(_) => DataType::Int64,
            Cell::Float(_) => DataType::Float64,
            Cell::Text(_) => DataType::Utf8,
        };
        data_type = Some(match (data_type, cell_type) {
            (None, t) => t,
            (Some(current), t) if current == t => current,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => DataType::Utf8,
        });
        if data_type == Some(DataType::Utf8) {
            break;
        }
    }
    data_type.unwrap_or(DataType::Utf8)
}

fn build_array(column: &[Cell], data_type: &DataType) -> ArrayRef {
    match data_type {
        DataType::Boolean => Arc::new(BooleanArray::from_iter(column.iter().map(|c| match c {
            Cell::Bool(b) => Some(*b),
            _ => None,
        }))),
        DataType::Int64 => Arc::new(Int64Array::from_iter(column.iter().map(|c| match c {
            Cell::Int(i) => Some(*i),
            _ => None,
        }))),
        DataType::Float64 => Arc::new(Float64Array::from_iter(column.iter().map(|c| match c {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }))),
        _ => Arc::new(StringArray::from_iter(column.iter().map(|c| match c {
            Cell::Null => None,
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Int(i) => Some(i.to_string()),
            Cell::Float(f) => Some(f.to_string()),
            Cell::Text(s) => Some(s.clone()),
        }))),
    }
}

fn write_extract(table: &Table, output: &Path) -> Result<(), ConvertError> {
    let mut fields = Vec::with_capacity(table.headers.len());
    let mut arrays = Vec::with_capacity(table.headers.len());
    for (header, column) in table.headers.iter().zip(&table.columns) {
        let data_type = infer_type(column);
        arrays.push(build_array(column, &data_type));
        fields.push(Field::new(header, data_type, true));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .map_err(|e| ConvertError::write(e.to_string()))?;

    let file = File::create(output).map_err(|e| ConvertError::write(e.to_string()))?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).map_err(|e| ConvertError::write(e.to_string()))?;
    writer
        .write(&batch)
        .map_err(|e| ConvertError::write(e.to_string()))?;
    writer
        .close()
        .map_err(|e| ConvertError::write(e.to_string()))?;
    Ok(())
}
