use crate::cli::{Cli, ConfigAction, OutputFormat};
use crate::commands::{load_settings, start_background, Result};
use crate::output::{format_output, format_pretty, OutputData};
use glossa_core::config::{AppConfig, CONFIG_KEY};
use glossa_core::storage::StorageArea;
use glossa_core::Settings;
use owo_colors::OwoColorize;
use serde_json::{json, Map, Value};

pub async fn run(cli: &Cli, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Reset => reset_config(cli).await,
        ConfigAction::Path => show_paths(cli),
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let background = start_background(&settings).await?;

    let stored = background.storage().sync.get(CONFIG_KEY).await?;
    let mut effective = Map::new();
    for id in background.registry().ids() {
        if let Some(config) = background.registry().config_of(&id).await {
            effective.insert(id, config.to_value());
        }
    }
    background.shutdown();

    let info = json!({
        "sync_policy": settings.config_sync,
        "stored": stored.clone().unwrap_or(Value::Null),
        "effective": effective,
    });

    if cli.output != OutputFormat::Pretty {
        return format_output(&OutputData::ConfigInfo(info), &cli.output);
    }

    println!();
    println!("{}", "Stored Configuration".bold().cyan());
    println!("{}", "====================".cyan());
    println!();
    match stored {
        Some(value) => println!("{}", format_pretty(&value)),
        None => println!(
            "{} Run {} to write the defaults.",
            "Nothing stored yet.".yellow(),
            "glossa config reset".cyan()
        ),
    }
    println!();
    println!(
        "{} {}",
        "Dictionaries use:".dimmed(),
        format!("{:?}", settings.config_sync).green()
    );
    for (id, config) in &effective {
        let selected = config["dicts"]["selected"]
            .as_array()
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        println!(
            "  {}  version {}  active {}  selected [{}]",
            id.cyan().bold(),
            config["version"],
            config["active"],
            selected
        );
    }
    Ok(())
}

async fn reset_config(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let background = start_background(&settings).await?;
    let defaults = AppConfig::default_config().to_value();
    background
        .storage()
        .sync
        .set(CONFIG_KEY, defaults.clone())
        .await?;
    background.shutdown();

    match cli.output {
        OutputFormat::Pretty => {
            println!("{} Default configuration written", "✓".green().bold());
        }
        _ => format_output(&OutputData::ConfigInfo(defaults), &cli.output)?,
    }
    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let settings = load_settings(cli)?;
    let data_dir = settings.data_dir();

    let info = json!({
        "settings": settings_path,
        "data_dir": data_dir,
        "settings_exists": settings_path.exists(),
    });

    match cli.output {
        OutputFormat::Pretty => {
            let marker = if settings_path.exists() {
                String::new()
            } else {
                " (missing, defaults apply)".dimmed().to_string()
            };
            println!("Settings: {}{}", settings_path.display().cyan(), marker);
            println!("Data:     {}", data_dir.display().cyan());
            Ok(())
        }
        _ => format_output(&OutputData::ConfigInfo(info), &cli.output),
    }
}
