use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{ReportMode, ReportSettings};
use crate::report::ReportRegistry;
use crate::services::DataLoader;
use crate::types::{ReportError, Result};

const USAGE: &str = "Usage: mitra-report <REPORT> <INPUT_JSON> <OUTPUT_XLSX> [MODE]";

/// Mitra delivery analytics spreadsheet generator
#[derive(Parser, Debug)]
#[command(name = "mitra-report")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Report to build: performance, project, fleet, mitra-analysis,
    /// task-analytics, delivery-performance or status-dashboard
    report: String,

    /// Input JSON document
    input: PathBuf,

    /// Output workbook path (.xlsx)
    output: PathBuf,

    /// Cell mode: static (default) or formula
    mode: Option<String>,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Score profile: fleet or performance
    #[arg(long)]
    profile: Option<String>,

    /// Shipment row layout: snake_case or title_case
    #[arg(long)]
    layout: Option<String>,

    /// Row limit for every ranked table except trends
    #[arg(long)]
    top: Option<usize>,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// JSON status line and process exit code of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub json: Value,
    pub exit_code: i32,
}

impl RunOutcome {
    fn failure(err: &ReportError) -> Self {
        let mut json = json!({
            "success": false,
            "error": err.to_string(),
        });
        if let Some(details) = err.details() {
            json["details"] = json!(details);
        }
        Self { json, exit_code: 1 }
    }
}

/// Parse `args`, run the selected report and build the status line.
///
/// `--help` and `--version` print and exit like any clap program.
pub fn run_from<I, T>(args: I) -> RunOutcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            ErrorKind::MissingRequiredArgument
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                return RunOutcome::failure(&ReportError::Usage(USAGE.into()))
            }
            _ => return RunOutcome::failure(&ReportError::Usage(clap_message(&e))),
        },
    };

    init_tracing(cli.verbose);
    cli.run()
}

/// First line of a clap error without the `error: ` prefix
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.trim_start_matches("error: ").trim().to_string()
}

/// stderr subscriber; `RUST_LOG` wins over the default level
fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Already installed when called twice in one process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl Cli {
    pub fn run(self) -> RunOutcome {
        match self.execute() {
            Ok(json) => RunOutcome { json, exit_code: 0 },
            Err(e) => RunOutcome::failure(&e),
        }
    }

    fn settings(&self) -> Result<ReportSettings> {
        let mode = self.mode.as_deref().map(ReportMode::parse).transpose()?;
        let base = match &self.config {
            Some(path) => ReportSettings::from_file(path)?,
            None => ReportSettings::default(),
        };
        base.with_overrides(mode, self.profile.clone(), self.layout.clone(), self.top)
    }

    fn execute(&self) -> Result<Value> {
        let registry = ReportRegistry::new();
        let report = registry.get(&self.report).ok_or_else(|| {
            ReportError::Usage(format!(
                "Unknown report '{}'. Available: {}",
                self.report,
                registry.names().join(", ")
            ))
        })?;

        let settings = self.settings()?;
        let input = DataLoader::load(&self.input)?;
        info!(
            shipments = input.shipments.len(),
            mitras = input.mitras.len(),
            period_type = %input.period_type,
            "loaded input"
        );

        let outcome = report.generate(&input, &settings, &self.output)?;

        let mut json = json!({
            "success": true,
            "output_path": self.output.display().to_string(),
            "message": outcome.message,
        });
        if let Value::Object(map) = &mut json {
            map.extend(outcome.metadata);
        }
        Ok(json)
    }
}
