//! Input boundary: parse CSV/TSV/Excel/JSON files into the uniform
//! [`Table`] model.
//!
//! Malformed or unsupported inputs fail here with a typed [`IngestError`];
//! the analysis core downstream assumes a well-formed table.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use calamine::{Data, Reader as _};
use encoding_rs::Encoding;
use log::debug;
use thiserror::Error;

use crate::{
    data::{Cell, Table},
    io_utils,
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported input extension '{0}' (expected csv, tsv, xlsx, xls, or json)")]
    UnsupportedExtension(String),
    #[error("Input contains no rows")]
    EmptyInput,
    #[error("JSON input must be a top-level array of objects")]
    NotAnArray,
    #[error("JSON row {0} is not a flat object of scalar values")]
    NonScalarRow(usize),
}

/// Load a tabular file into memory, dispatching on extension.
///
/// The `-` path reads CSV from stdin. Excel input reads the first
/// worksheet with row 1 as headers. JSON input must be an array of flat
/// objects; the header set is the union of keys across objects, and absent
/// keys become nulls.
pub fn load_table(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Table> {
    if io_utils::is_dash(path) {
        return load_csv(path, io_utils::resolve_input_delimiter(path, delimiter), encoding);
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "csv" | "tsv" => load_csv(
            path,
            io_utils::resolve_input_delimiter(path, delimiter),
            encoding,
        ),
        "xlsx" | "xls" | "xlsm" | "xlsb" => load_excel(path),
        "json" => load_json(path),
        other => Err(IngestError::UnsupportedExtension(other.to_string()).into()),
    }
}

fn load_csv(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, encoding)?;
    let mut table = Table::new(headers);

    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = io_utils::decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        let mut row = Vec::with_capacity(table.column_count());
        for field in decoded.into_iter().take(table.column_count()) {
            if field.is_empty() {
                row.push(Cell::Null);
            } else {
                row.push(Cell::Text(field));
            }
        }
        while row.len() < table.column_count() {
            row.push(Cell::Null);
        }
        table.rows.push(row);
    }

    debug!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}

fn load_excel(path: &Path) -> Result<Table> {
    let mut workbook = calamine::open_workbook_auto(path)
        .with_context(|| format!("Opening workbook {path:?}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyInput)?
        .with_context(|| format!("Reading first worksheet of {path:?}"))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .ok_or(IngestError::EmptyInput)?
        .iter()
        .map(excel_header)
        .collect();
    let mut table = Table::new(headers);

    for sheet_row in sheet_rows {
        let mut row: Vec<Cell> = sheet_row
            .iter()
            .take(table.column_count())
            .map(excel_cell)
            .collect();
        while row.len() < table.column_count() {
            row.push(Cell::Null);
        }
        table.rows.push(row);
    }

    debug!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}

/// Map one worksheet cell into the scalar model. Date cells are rendered
/// as ISO text so they flow through the same datetime inference path as
/// CSV input.
fn excel_cell(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(timestamp) => {
                Cell::Text(timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            None => Cell::Null,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

fn excel_header(value: &Data) -> String {
    match value {
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn load_json(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Parsing JSON from {path:?}"))?;
    let array = value.as_array().ok_or(IngestError::NotAnArray)?;
    if array.is_empty() {
        return Err(IngestError::EmptyInput.into());
    }

    // Union of keys across objects, in first-seen order.
    let mut headers: Vec<String> = Vec::new();
    for entry in array {
        let object = entry.as_object().ok_or(IngestError::NonScalarRow(0))?;
        for key in object.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let mut table = Table::new(headers);
    for (row_idx, entry) in array.iter().enumerate() {
        let object = entry
            .as_object()
            .ok_or(IngestError::NonScalarRow(row_idx + 1))?;
        let mut row = Vec::with_capacity(table.column_count());
        for header in &table.headers {
            let cell = match object.get(header) {
                None | Some(serde_json::Value::Null) => Cell::Null,
                Some(serde_json::Value::Bool(b)) => Cell::Boolean(*b),
                Some(serde_json::Value::Number(n)) => {
                    Cell::Number(n.as_f64().ok_or(IngestError::NonScalarRow(row_idx + 1))?)
                }
                Some(serde_json::Value::String(s)) => {
                    if s.is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(s.clone())
                    }
                }
                Some(_) => return Err(IngestError::NonScalarRow(row_idx + 1).into()),
            };
            row.push(cell);
        }
        table.rows.push(row);
    }

    debug!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}
