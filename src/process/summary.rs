// src/process/summary.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs, path::Path};

use crate::fetch::Lookup;

/// Per-run tallies; every row lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_rows: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub transport_errors: usize,
    pub skipped_invalid: usize,
    pub skipped_filled: usize,
}

impl RunSummary {
    pub fn start(total_rows: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            total_rows,
            resolved: 0,
            not_found: 0,
            transport_errors: 0,
            skipped_invalid: 0,
            skipped_filled: 0,
        }
    }

    pub fn record(&mut self, lookup: &Lookup) {
        match lookup {
            Lookup::Found(_) => self.resolved += 1,
            Lookup::NotFound => self.not_found += 1,
            Lookup::TransportError(_) => self.transport_errors += 1,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Rows that went to PubChem.
    pub fn looked_up(&self) -> usize {
        self.resolved + self.not_found + self.transport_errors
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing run report {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn counts_by_outcome() {
        let mut s = RunSummary::start(4);
        s.record(&Lookup::Found("CCO".into()));
        s.record(&Lookup::NotFound);
        s.record(&Lookup::TransportError("HTTP 503".into()));
        s.skipped_invalid += 1;
        assert_eq!(s.looked_up(), 3);
        assert_eq!(s.looked_up() + s.skipped_invalid + s.skipped_filled, s.total_rows);
    }

    #[test]
    fn report_is_json() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.json");
        let mut s = RunSummary::start(1);
        s.record(&Lookup::Found("CCO".into()));
        s.finish();
        s.write_json(&path)?;

        let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(v["resolved"], 1);
        assert_eq!(v["total_rows"], 1);
        assert!(v["finished_at"].is_string());
        Ok(())
    }
}
