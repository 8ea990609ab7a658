use std::process::ExitCode;

use mitra_report::cli;

fn main() -> anyhow::Result<ExitCode> {
    let outcome = cli::run_from(std::env::args_os());
    println!("{}", serde_json::to_string(&outcome.json)?);
    Ok(ExitCode::from(outcome.exit_code as u8))
}
