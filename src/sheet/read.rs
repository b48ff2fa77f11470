// src/sheet/read.rs

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;
use tracing::{debug, info, instrument};

use super::{CellValue, Record, Table};

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::Error(e) => CellValue::Text(format!("{e:?}")),
        other => CellValue::Text(other.to_string()),
    }
}

/// Excel serial day 0, as the 1900 date system counts it.
fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

fn header_text(cell: CellValue) -> String {
    match cell {
        CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        CellValue::DateTime(serial) => {
            let millis = (serial * 86_400_000.0).round() as i64;
            excel_epoch()
                .zip(Duration::try_milliseconds(millis))
                .and_then(|(epoch, offset)| epoch.checked_add_signed(offset))
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| CellValue::DateTime(serial).to_string())
        }
        other => other.to_string(),
    }
}

/// Header names from the first row; blanks become `Unnamed: <index>`.
fn header_names(row: &[CellValue]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(idx, cell)| match cell {
            CellValue::Empty => format!("Unnamed: {idx}"),
            CellValue::Text(s) if s.trim().is_empty() => format!("Unnamed: {idx}"),
            other => header_text(other.clone()),
        })
        .collect()
}

/// Cells of `row`, shifted right by the empty leading columns the used range skips.
fn row_cells(lead: usize, row: &[Data]) -> Vec<CellValue> {
    let mut cells = vec![CellValue::Empty; lead];
    cells.extend(row.iter().map(to_cell));
    cells
}

pub(crate) fn table_from_range(sheet_name: &str, range: &Range<Data>) -> Table {
    let lead = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let mut rows = range.rows();
    let columns = rows
        .next()
        .map(|row| header_names(&row_cells(lead, row)))
        .unwrap_or_default();
    let width = columns.len();
    let records = rows
        .map(|row| {
            let mut cells = row_cells(lead, row);
            cells.resize(width.max(cells.len()), CellValue::Empty);
            cells.truncate(width);
            Record::new(cells)
        })
        .collect();
    Table {
        sheet_name: sheet_name.to_string(),
        columns,
        records,
    }
}

/// Read `sheet` (or the first sheet) from any workbook format calamine opens.
#[instrument(level = "info")]
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("open workbook {:?}", path))?;
    let sheet_names = workbook.sheet_names().to_owned();
    debug!(?sheet_names, "workbook sheets");

    let sheet_name = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(anyhow!(
                    "sheet {:?} not found in {:?} (have {:?})",
                    name,
                    path,
                    sheet_names
                ));
            }
            name.to_string()
        }
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook {:?} has no sheets", path))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("read worksheet range {sheet_name}"))?;
    let table = table_from_range(&sheet_name, &range);
    info!(
        sheet = %sheet_name,
        columns = table.columns.len(),
        rows = table.len(),
        "loaded table"
    );
    Ok(table)
}
