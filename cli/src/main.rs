//! provcheck - provision, inspect and verify declarative VM configurations

use clap::Parser;
use tracing_subscriber::EnvFilter;

use provcheck_cli::cli::Cli;
use provcheck_cli::commands::SuiteFailed;
use provcheck_cli::output::json;

#[tokio::main]
async fn main() {
    // Logs go to stderr so `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("PROVCHECK_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = cli.run().await {
        let suite_failed = e.downcast_ref::<SuiteFailed>().is_some();
        if json_mode
            && !suite_failed
            && let Ok(obj) = json::format_error(&format!("{e:#}"), "ERROR")
        {
            println!("{obj}");
        }
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
