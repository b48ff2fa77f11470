// src/process/driver.rs

use anyhow::{bail, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::cas::clean_cas;
use super::summary::RunSummary;
use crate::config::Config;
use crate::fetch::{Lookup, StructureResolver};
use crate::sheet::{CellValue, Record, Table};

#[derive(Clone, Debug, PartialEq)]
pub struct EnrichOptions {
    pub cas_column: String,
    pub smiles_column: String,
    /// Pause after every row that went to the resolver.
    pub interval: Duration,
}

impl From<&Config> for EnrichOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            cas_column: cfg.cas_column.clone(),
            smiles_column: cfg.smiles_column.clone(),
            interval: cfg.request_interval(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enriched {
    pub table: Table,
    pub summary: RunSummary,
}

fn padded(record: &Record, width: usize) -> Record {
    let mut cells = record.cells.clone();
    if cells.len() < width {
        cells.resize(width, CellValue::Empty);
    }
    Record::new(cells)
}

/// Build a copy of `table` with the SMILES column filled in.
///
/// Rows are visited in order. A row is looked up only when its CAS cell passes
/// [`clean_cas`] and its SMILES cell is blank; the result (or `""` on any
/// miss) replaces the SMILES cell. Every other row is carried over unchanged.
/// The only error is a missing CAS column.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub async fn enrich<R: StructureResolver + ?Sized>(
    table: &Table,
    resolver: &R,
    opts: &EnrichOptions,
) -> Result<Enriched> {
    let Some(cas_idx) = table.column_index(&opts.cas_column) else {
        bail!(
            "column {:?} not found in sheet {:?} (columns: {:?})",
            opts.cas_column,
            table.sheet_name,
            table.columns
        );
    };

    let mut columns = table.columns.clone();
    let smiles_idx = match table.column_index(&opts.smiles_column) {
        Some(idx) => idx,
        None => {
            columns.push(opts.smiles_column.clone());
            columns.len() - 1
        }
    };
    let width = columns.len();
    let total = table.len();

    let mut summary = RunSummary::start(total);
    let mut records = Vec::with_capacity(total);

    for (idx, record) in table.records.iter().enumerate() {
        let row = idx + 1;
        let Some(cas) = clean_cas(record.get(cas_idx)) else {
            debug!(row, total, "skipping row without a usable CAS number");
            summary.skipped_invalid += 1;
            records.push(padded(record, width));
            continue;
        };
        if !record.get(smiles_idx).is_blank() {
            debug!(row, total, cas = %cas, "skipping row with SMILES already filled");
            summary.skipped_filled += 1;
            records.push(padded(record, width));
            continue;
        }

        let lookup = resolver.resolve(&cas).await;
        summary.record(&lookup);
        match &lookup {
            Lookup::TransportError(reason) => {
                warn!(row, total, cas = %cas, %reason, "lookup failed")
            }
            _ => info!(row, total, cas = %cas, outcome = lookup.label(), "row processed"),
        }

        let filled = padded(record, width)
            .with_cell(smiles_idx, CellValue::Text(lookup.into_cell_text()));
        records.push(filled);

        sleep(opts.interval).await;
    }

    summary.finish();
    info!(
        resolved = summary.resolved,
        not_found = summary.not_found,
        transport_errors = summary.transport_errors,
        skipped_invalid = summary.skipped_invalid,
        skipped_filled = summary.skipped_filled,
        "enrichment finished"
    );

    Ok(Enriched {
        table: Table {
            sheet_name: table.sheet_name.clone(),
            columns,
            records,
        },
        summary,
    })
}
