use crate::cli::{Cli, OutputFormat, ReasonArg};
use crate::commands::{load_settings, start_background, Result};
use crate::output::{format_output, OutputData};
use glossa_core::install::{InstallDetails, InstallOutcome, InstallReason};
use owo_colors::OwoColorize;

/// Without an explicit reason, a previous version means an update.
fn details(reason: Option<ReasonArg>, previous_version: Option<String>) -> InstallDetails {
    let reason = match reason {
        Some(ReasonArg::Install) => InstallReason::Install,
        Some(ReasonArg::Update) => InstallReason::Update,
        Some(ReasonArg::BrowserUpdate) => InstallReason::BrowserUpdate,
        None if previous_version.is_some() => InstallReason::Update,
        None => InstallReason::Install,
    };
    InstallDetails {
        reason,
        previous_version,
    }
}

pub async fn run(
    cli: &Cli,
    reason: Option<ReasonArg>,
    previous_version: Option<String>,
) -> Result<()> {
    let settings = load_settings(cli)?;
    let background = start_background(&settings).await?;
    let details = details(reason, previous_version);
    let outcome = background.on_installed(&details).await;
    background.shutdown();
    let outcome = outcome?;

    match cli.output {
        OutputFormat::Pretty => match outcome {
            InstallOutcome::Reset => println!(
                "{} Storage cleared and default configuration written",
                "✓".green().bold()
            ),
            InstallOutcome::Unchanged => {
                println!("{} Stored data kept as is", "✓".green().bold())
            }
        },
        _ => format_output(
            &OutputData::InstallResult {
                details,
                outcome,
            },
            &cli.output,
        )?,
    }
    Ok(())
}
