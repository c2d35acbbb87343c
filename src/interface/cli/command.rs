//! CLI 명령 파싱 모듈.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "runpilot")]
#[command(about = "Forum compile bot: runs mentioned code snippets and replies with the output")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Process the inbox once and exit
    #[arg(long)]
    once: bool,

    /// Seconds to sleep between inbox cycles (watch mode)
    #[arg(long)]
    interval: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show effective merged config and credential availability
    Config,
}

pub enum CliAction {
    InspectConfig,
    RunOnce,
    Watch { interval_secs: Option<u64> },
}

impl Cli {
    pub fn parse_action() -> CliAction {
        let cli = Cli::parse();

        match cli.command {
            Some(Commands::Config) => CliAction::InspectConfig,
            None if cli.once => CliAction::RunOnce,
            None => CliAction::Watch {
                interval_secs: cli.interval,
            },
        }
    }
}
