use anyhow::{Context, Result};
use casfill::{
    config::Config,
    fetch::{pubchem::PubChemClient, transport::HttpTransport},
    process::{enrich, EnrichOptions},
    sheet,
};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Fill a SMILES column for every CAS number in a workbook using PubChem"
)]
struct Args {
    /// YAML file with settings; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(short, long)]
    output: Option<PathBuf>,
    #[arg(long, conflicts_with = "first_sheet")]
    sheet: Option<String>,
    /// Read the first sheet instead of a named one.
    #[arg(long)]
    first_sheet: bool,
    #[arg(long)]
    cas_column: Option<String>,
    #[arg(long)]
    smiles_column: Option<String>,
    #[arg(long)]
    interval_secs: Option<f64>,
    /// Write a JSON run summary here.
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(Config, Option<PathBuf>)> {
        let mut cfg = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(v) = self.input {
            cfg.input = v;
        }
        if let Some(v) = self.output {
            cfg.output = v;
        }
        if self.first_sheet {
            cfg.sheet = None;
        } else if let Some(v) = self.sheet {
            cfg.sheet = Some(v);
        }
        if let Some(v) = self.cas_column {
            cfg.cas_column = v;
        }
        if let Some(v) = self.smiles_column {
            cfg.smiles_column = v;
        }
        if let Some(v) = self.interval_secs {
            cfg.request_interval_secs = v;
        }
        cfg.validate()?;
        Ok((cfg, self.report))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) settings ─────────────────────────────────────────────────
    let (cfg, report) = Args::parse().into_config()?;
    info!(
        input = %cfg.input.display(),
        output = %cfg.output.display(),
        sheet = ?cfg.sheet,
        "settings loaded"
    );

    // ─── 3) load the sheet ───────────────────────────────────────────
    let table = tokio::task::spawn_blocking({
        let input = cfg.input.clone();
        let sheet = cfg.sheet.clone();
        move || sheet::read_table(&input, sheet.as_deref())
    })
    .await??;

    // ─── 4) look up SMILES row by row ────────────────────────────────
    let transport = HttpTransport::new(&cfg.user_agent, cfg.request_timeout())?;
    let client = PubChemClient::new(
        transport,
        &cfg.base_url,
        &cfg.smiles_property,
        cfg.retry_policy(),
    )?;
    let start = Instant::now();
    let enriched = enrich(&table, &client, &EnrichOptions::from(&cfg)).await?;
    info!(elapsed = ?start.elapsed(), looked_up = enriched.summary.looked_up(), "lookups done");

    // ─── 5) write results ────────────────────────────────────────────
    let output = cfg.output.clone();
    let out_table = enriched.table;
    tokio::task::spawn_blocking(move || sheet::write_table(&output, &out_table))
        .await?
        .with_context(|| format!("saving results to {:?}", cfg.output))?;

    if let Some(path) = report {
        if let Err(e) = enriched.summary.write_json(&path) {
            error!("report {} failed: {}", path.display(), e);
        } else {
            info!("wrote report {}", path.display());
        }
    }

    info!("done; results saved to {}", cfg.output.display());
    Ok(())
}
