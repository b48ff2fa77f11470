// src/sheet/write.rs

use anyhow::{anyhow, Context, Result};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;
use tracing::{info, instrument, warn};

use super::{CellValue, Table};

const DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

fn xlsx_err(err: XlsxError) -> anyhow::Error {
    anyhow!("xlsx error: {err}")
}

/// Write `table` as the only sheet of a fresh `.xlsx` workbook: header row
/// first, then every record in order.
#[instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let date = Format::new().set_num_format(DATE_FORMAT);
    let worksheet = workbook.add_worksheet();
    // names xlsx cannot hold (over 31 chars, `[]:*?/\`) keep the default `Sheet1`
    if !table.sheet_name.is_empty() {
        if let Err(e) = worksheet.set_name(&table.sheet_name) {
            warn!(sheet = %table.sheet_name, error = %e, "sheet name not allowed in xlsx; using Sheet1");
        }
    }

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .map_err(xlsx_err)?;
    }

    for (idx, record) in table.records.iter().enumerate() {
        let row = idx as u32 + 1;
        for (col, cell) in record.cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                // blank strings are left as empty cells
                CellValue::Empty => {}
                CellValue::Text(s) if s.is_empty() => {}
                CellValue::Text(s) => {
                    worksheet.write_string(row, col, s).map_err(xlsx_err)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(row, col, *n).map_err(xlsx_err)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row, col, *b).map_err(xlsx_err)?;
                }
                CellValue::DateTime(serial) => {
                    worksheet
                        .write_number_with_format(row, col, *serial, &date)
                        .map_err(xlsx_err)?;
                }
            }
        }
    }

    workbook
        .save(path)
        .map_err(xlsx_err)
        .with_context(|| format!("write workbook {:?}", path))?;
    info!(path = %path.display(), "saved workbook");
    Ok(())
}
