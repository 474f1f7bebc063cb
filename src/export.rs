//! Output formatting for loaded tables.
//!
//! This is the boundary where typed cell values become text: a padded grid
//! for terminals, CSV, or JSON.
use crate::core::db::{CellValue, TableData};
use crate::core::{BrowserError, Result};
use serde_json::{Map, Number, Value};
use std::str::FromStr;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = BrowserError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "grid" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(BrowserError::Export(format!(
                "Unsupported export format: '{}'. Supported formats: text, csv, json",
                s
            ))),
        }
    }
}

/// Formats a loaded table in the requested format.
pub fn export(data: &TableData, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Text => Ok(render_grid(data)),
        ExportFormat::Csv => Ok(export_to_csv(data)),
        ExportFormat::Json => export_to_json(data),
    }
}

/// Renders headers and rows as a column-aligned grid.
pub fn render_grid(data: &TableData) -> String {
    let headers = data.column_names();
    if headers.is_empty() {
        return String::new();
    }
    let rows = data.display_rows();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_grid_line(&mut output, &headers, &widths);
    let underline: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&underline.join("-|-"));
    output.push('\n');
    for row in &rows {
        push_grid_line(&mut output, row, &widths);
    }
    output
}

fn push_grid_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    output.push_str(padded.join(" | ").trim_end());
    output.push('\n');
}

fn export_to_csv(data: &TableData) -> String {
    let mut output = String::new();
    let headers = data.column_names();
    if !headers.is_empty() {
        push_csv_line(&mut output, &headers);
    }
    for row in data.display_rows() {
        push_csv_line(&mut output, &row);
    }
    output
}

fn push_csv_line(output: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    output.push_str(&escaped.join(","));
    output.push('\n');
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// One JSON object per row, keyed by column name in declaration order, with
/// typed values.
fn export_to_json(data: &TableData) -> Result<String> {
    let names = data.column_names();
    let rows: Vec<Value> = data
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Value> = names
                .iter()
                .cloned()
                .zip(row.iter().map(json_value))
                .collect();
            Value::Object(object)
        })
        .collect();
    Ok(serde_json::to_string(&rows)?)
}

fn json_value(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Integer(i) => Value::from(*i),
        CellValue::Real(r) => Number::from_f64(*r).map_or(Value::Null, Value::Number),
        CellValue::Text(t) => Value::String(t.clone()),
        CellValue::Blob(_) => Value::String(value.to_display()),
    }
}
