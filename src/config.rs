// src/config.rs

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::fetch::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Everything a run needs, passed into the pipeline at start.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Workbook to read records from.
    pub input: PathBuf,

    /// Workbook to write the enriched table to. Overwritten on every run.
    pub output: PathBuf,

    /// Sheet holding the records. `None` reads the first sheet.
    pub sheet: Option<String>,

    /// Header of the column holding CAS numbers.
    pub cas_column: String,

    /// Header of the column receiving SMILES strings; appended if absent.
    pub smiles_column: String,

    /// Retries per request after the first attempt.
    pub max_retries: u32,

    /// Backoff before the first retry; doubles on every further retry.
    pub retry_backoff_secs: f64,

    /// Per-request timeout.
    pub request_timeout_secs: f64,

    /// Pause after every looked-up record to stay under the PubChem quota.
    pub request_interval_secs: f64,

    /// PUG REST root, without a trailing slash.
    pub base_url: String,

    /// Compound property requested in the second lookup.
    pub smiles_property: String,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("298.15k下的液态热容.xlsx"),
            output: PathBuf::from("yetai_CP.xlsx"),
            sheet: Some("2040".to_string()),
            cas_column: "CAS".to_string(),
            smiles_column: "SMILES".to_string(),
            max_retries: 3,
            retry_backoff_secs: 3.0,
            request_timeout_secs: 15.0,
            request_interval_secs: 1.2,
            base_url: DEFAULT_BASE_URL.to_string(),
            smiles_property: "SMILES".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load a YAML config file. Missing keys fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading config {:?}", path))?;
        let cfg: Config =
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {:?}", path))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cas_column.trim().is_empty() {
            bail!("cas_column must not be empty");
        }
        if self.smiles_column.trim().is_empty() {
            bail!("smiles_column must not be empty");
        }
        if self.cas_column == self.smiles_column {
            bail!(
                "cas_column and smiles_column are both {:?}; results would overwrite the identifiers",
                self.cas_column
            );
        }
        if self.smiles_property.trim().is_empty() {
            bail!("smiles_property must not be empty");
        }
        for (name, secs) in [
            ("retry_backoff_secs", self.retry_backoff_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("request_interval_secs", self.request_interval_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                bail!("{} must be a non-negative number of seconds, got {}", name, secs);
            }
        }
        if self.request_timeout_secs == 0.0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        secs(self.request_timeout_secs)
    }

    pub fn request_interval(&self) -> Duration {
        secs(self.request_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: secs(self.retry_backoff_secs),
            ..RetryPolicy::default()
        }
    }
}

fn secs(s: f64) -> Duration {
    Duration::try_from_secs_f64(s).unwrap_or(Duration::ZERO)
}
