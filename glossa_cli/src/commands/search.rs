use crate::cli::{Cli, OutputFormat};
use crate::commands::{load_settings, start_background, CommandError, Result};
use crate::output::{format_output, print_search_response, OutputData};
use glossa_core::config::{AppConfig, CONFIG_KEY};
use glossa_core::message::{Envelope, SearchResponse, Sender, MISSING_DICTIONARY};
use glossa_core::service::Background;
use glossa_core::storage::StorageArea;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::warn;

pub async fn run(cli: &Cli, dict_or_text: &str, text: Option<&str>, all: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let background = start_background(&settings).await?;

    let result = if all {
        let text = match text {
            Some(extra) => format!("{} {}", dict_or_text, extra),
            None => dict_or_text.to_string(),
        };
        run_all(cli, &background, &text).await
    } else {
        let text = text.ok_or_else(|| {
            CommandError::InvalidInput(
                "Missing search text. Usage: glossa search <dict> \"<text>\"".to_string(),
            )
        })?;
        run_single(cli, &background, dict_or_text, text).await
    };

    background.shutdown();
    result
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn lookup(background: &Background, dict: &str, text: &str) -> Result<SearchResponse> {
    let reply = background
        .handle_message(Envelope::search_text(dict, text), Sender::default())
        .await
        .ok_or_else(|| CommandError::InvalidInput("lookup produced no reply".to_string()))?;
    Ok(serde_json::from_value(reply)?)
}

async fn run_single(cli: &Cli, background: &Background, dict: &str, text: &str) -> Result<()> {
    let spinner = spinner(format!("Looking up '{}' in {}...", text, dict));
    let response = lookup(background, &dict.to_lowercase(), text).await?;
    spinner.finish_and_clear();

    if let SearchResponse::Failed { error, dict } = &response {
        if error.as_str() == Some(MISSING_DICTIONARY) {
            return Err(CommandError::DictionaryNotFound(dict.clone()));
        }
    }

    if cli.output == OutputFormat::Pretty {
        print_search_response(text, &response);
        return Ok(());
    }
    format_output(
        &OutputData::SearchResult {
            text: text.to_string(),
            response: response.to_value(),
        },
        &cli.output,
    )
}

/// Dictionaries the stored configuration selects, defaulting when nothing is
/// stored yet.
async fn selected_dicts(background: &Background) -> Result<Vec<String>> {
    let stored = background.storage().sync.get(CONFIG_KEY).await?;
    let config = match stored {
        Some(value) => serde_json::from_value::<AppConfig>(value).unwrap_or_else(|e| {
            warn!("stored config unreadable, using defaults: {}", e);
            AppConfig::default()
        }),
        None => AppConfig::default(),
    };
    Ok(config.dicts.selected)
}

async fn run_all(cli: &Cli, background: &Background, text: &str) -> Result<()> {
    let dicts = selected_dicts(background).await?;
    if dicts.is_empty() {
        println!("{}", "No dictionaries selected".yellow());
        return Ok(());
    }

    let spinner = spinner(format!("Looking up '{}' in {}...", text, dicts.join(", ")));
    let router = background.router();
    let mut lookups = JoinSet::new();
    for dict in dicts {
        let router = router.clone();
        let envelope = Envelope::search_text(dict, text);
        lookups.spawn(async move { router.route(envelope, Sender::default()).await });
    }

    // Answers are shown in the order they settle.
    let mut responses: Vec<Value> = Vec::new();
    while let Some(joined) = lookups.join_next().await {
        let reply = match joined {
            Ok(Some(reply)) => reply,
            Ok(None) => continue,
            Err(e) => {
                warn!("lookup task failed: {}", e);
                continue;
            }
        };
        if cli.output == OutputFormat::Pretty {
            spinner.suspend(|| match serde_json::from_value::<SearchResponse>(reply.clone()) {
                Ok(response) => print_search_response(text, &response),
                Err(e) => warn!("unexpected reply shape: {}", e),
            });
        } else {
            responses.push(reply);
        }
    }
    spinner.finish_and_clear();

    if cli.output != OutputFormat::Pretty {
        format_output(
            &OutputData::SearchResults {
                text: text.to_string(),
                responses,
            },
            &cli.output,
        )?;
    }
    Ok(())
}
