use clap::error::{ContextKind, ErrorKind};
use clap::{CommandFactory, Parser, Subcommand};
use std::process::ExitCode;

use codecrafters::telemetry::DiagnosticsSession;
use codecrafters::ui::{print_error, print_unknown_command};

mod cmd;

#[derive(Parser)]
#[command(name = "codecrafters")]
#[command(version, about = "CLI to interact with CodeCrafters")]
pub struct Cli {
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run tests without committing changes
    Test,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::InvalidSubcommand => {
            let command = err
                .get(ContextKind::InvalidSubcommand)
                .map(|value| value.to_string())
                .unwrap_or_default();
            print_unknown_command(&command);
            return ExitCode::FAILURE;
        }
        Err(err) => err.exit(),
    };

    let Some(command) = &cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    let session = DiagnosticsSession::start(cli.verbose);
    let result = match command {
        Commands::Test => match cmd::current_project_dir() {
            Ok(dir) => cmd::cmd_test(&dir, session.diagnostics())
                .await
                .map(|_| ()),
            Err(err) => Err(err),
        },
    };
    session.finish();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
