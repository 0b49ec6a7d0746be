use clap::Parser;

use oracle_rs::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = cli::load_and_merge_config(&cli)?;
    cli::init_logger_from_settings(&settings)?;

    let validating = matches!(
        cli.command,
        Some(Commands::Check) | Some(Commands::Serve { dry_run: true, .. })
    );

    if let Err(e) = cli::execute_command(&cli, settings).await {
        tracing::error!(error = %e, "Command failed");
        if validating {
            eprintln!("{}", Cli::get_validation_help());
        }
        return Err(e.into());
    }

    Ok(())
}
