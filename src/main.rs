mod commands;

use appctl::log::{err, set_verbose};
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "appctl")]
#[command(about = "Administer the applications served by a running app server instance", long_about = None)]
struct Cli {
    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Restart applications selected by app path prefix or app group name
    RestartApp(commands::restart_app::RestartAppArgs),
    /// List the running instances found in the instance registry
    ListInstances(commands::list_instances::ListInstancesArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set verbose mode
    set_verbose(cli.verbose);

    match cli.command {
        Commands::RestartApp(args) => {
            let outcome = commands::restart_app::execute(args).await;
            outcome.report();
            ExitCode::from(outcome.exit_code())
        }
        Commands::ListInstances(args) => match commands::list_instances::execute(args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                err(&format!("{:#}", e));
                ExitCode::FAILURE
            }
        },
    }
}
