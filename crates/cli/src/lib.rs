pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Parley relay operator CLI",
    long_about = "Inspect relay configuration, check readiness, and send a single turn to the conversation service.",
    after_help = "Examples:\n  parley doctor --json\n  parley config\n  parley ask what can you do"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, workspace and upstream credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send one utterance to the conversation service and print the shaped reply")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Text to send, words are joined with spaces")]
        utterance: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { utterance } => commands::ask::run(&utterance.join(" ")),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
