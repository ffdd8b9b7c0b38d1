use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "glossa_cli=info",
        1 => "glossa_cli=debug,glossa_core=debug",
        _ => "glossa_cli=trace,glossa_core=trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging; GLOSSA_LOG wins over RUST_LOG, which wins over -v.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("GLOSSA_LOG")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!cli.no_color),
        )
        .init();

    let result = match &cli.command {
        None => show_overview(),
        Some(Commands::List) => list::run(&cli).await,
        Some(Commands::Search {
            dict_or_text,
            text,
            all,
        }) => search::run(&cli, dict_or_text, text.as_deref(), *all).await,
        Some(Commands::Config { action }) => config::run(&cli, action.clone()).await,
        Some(Commands::Install {
            reason,
            previous_version,
        }) => install::run(&cli, *reason, previous_version.clone()).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}

fn show_overview() -> commands::Result<()> {
    let registry = glossa_core::build_registry_enabled_only(Default::default());

    println!();
    println!(
        "{}  {}",
        "Glossa".bold().cyan(),
        "- dictionary lookups from the terminal".dimmed()
    );
    println!();
    println!(
        "  {} dictionaries compiled in: {}",
        registry.len().to_string().green().bold(),
        registry.ids().join(", ").cyan()
    );
    println!();
    println!("{}", "Quick Start:".bold().cyan());
    println!(
        "  {}{}",
        "glossa search youdao love".cyan(),
        "      Look a word up in Youdao".dimmed()
    );
    println!(
        "  {}{}",
        "glossa search --all yeet".cyan(),
        "       Ask every selected dictionary".dimmed()
    );
    println!(
        "  {}{}",
        "glossa config show".cyan(),
        "             Show the stored configuration".dimmed()
    );
    println!();
    println!(
        "{} Use {} for full help",
        "Tip:".dimmed(),
        "glossa --help".cyan()
    );
    println!();
    Ok(())
}
