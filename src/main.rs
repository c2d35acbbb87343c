//! `runpilot` 바이너리 진입점.

use runpilot::interface::cli::{Cli, CliAction};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    match Cli::parse_action() {
        CliAction::InspectConfig => match runpilot::inspect_config_pretty_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        },
        CliAction::RunOnce => {
            if let Err(err) = runpilot::run_once().await {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
        CliAction::Watch { interval_secs } => {
            if let Err(err) = runpilot::watch(interval_secs).await {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
    }
}
