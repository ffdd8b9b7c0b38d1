use crate::cli::OutputFormat;
use crate::commands::Result;
use glossa_core::install::{InstallDetails, InstallOutcome};
use glossa_core::message::SearchResponse;
use glossa_core::DictInfo;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

mod pretty;
pub use pretty::format_pretty;

/// Terminal width for formatting (default fallback)
const DEFAULT_WIDTH: usize = 80;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    DictList(Vec<DictInfo>),
    SearchResult {
        text: String,
        response: Value,
    },
    SearchResults {
        text: String,
        responses: Vec<Value>,
    },
    ConfigInfo(Value),
    InstallResult {
        details: InstallDetails,
        outcome: InstallOutcome,
    },
}

pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Truncate to `max_width` characters, adding "..." if truncated
pub fn truncate_text(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        let kept: String = text.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    } else {
        text.chars().take(max_width).collect()
    }
}

pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text => {
            format_text_output(data)?;
        }
        OutputFormat::Pretty => {
            format_pretty_output(data)?;
        }
    }
    Ok(())
}

fn format_text_output(data: &OutputData) -> Result<()> {
    match data {
        OutputData::DictList(dicts) => {
            for dict in dicts {
                println!("{}: {}", dict.id, dict.description);
            }
        }
        OutputData::SearchResult { text, response } => {
            println!("Lookup of '{}':", text);
            println!("{}", serde_json::to_string_pretty(response)?);
        }
        OutputData::SearchResults { text, responses } => {
            println!("Lookup of '{}' in {} dictionaries:", text, responses.len());
            for response in responses {
                println!("{}", serde_json::to_string_pretty(response)?);
            }
        }
        OutputData::ConfigInfo(config) => {
            println!("Configuration:");
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputData::InstallResult { details, outcome } => {
            println!(
                "{:?} from {}: {:?}",
                details.reason,
                details.previous_version.as_deref().unwrap_or("nothing"),
                outcome
            );
        }
    }
    Ok(())
}

fn format_pretty_output(data: &OutputData) -> Result<()> {
    match data {
        OutputData::DictList(dicts) => {
            println!("{}", "Available Dictionaries".cyan().bold());
            println!();
            for dict in dicts {
                println!("  {}  {}", dict.id.green().bold(), dict.description.dimmed());
            }
        }
        OutputData::SearchResult { text, response } => {
            match serde_json::from_value::<SearchResponse>(response.clone()) {
                Ok(response) => print_search_response(text, &response),
                Err(_) => println!("{}", format_pretty(response)),
            }
        }
        OutputData::SearchResults { text, responses } => {
            for response in responses {
                match serde_json::from_value::<SearchResponse>(response.clone()) {
                    Ok(response) => print_search_response(text, &response),
                    Err(_) => println!("{}", format_pretty(response)),
                }
            }
        }
        OutputData::ConfigInfo(config) => {
            println!("{}", "Configuration".cyan().bold());
            println!();
            println!("{}", format_pretty(config));
        }
        OutputData::InstallResult { details, outcome } => {
            println!(
                "{} {:?} {}",
                "Install:".dimmed(),
                details.reason,
                format!("{:?}", outcome).green().bold()
            );
        }
    }
    Ok(())
}

/// Print one dictionary's answer as a card.
pub fn print_search_response(text: &str, response: &SearchResponse) {
    println!(
        "{} {} {} {}",
        "Lookup:".dimmed(),
        text.cyan().bold(),
        "in".dimmed(),
        response.dict().green()
    );
    match response {
        SearchResponse::Found { result, .. } => {
            println!("{}", pretty::format_entry(result, terminal_width()));
        }
        SearchResponse::Failed { error, .. } => {
            let message = match error {
                Value::String(s) => s.clone(),
                Value::Object(map) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
                other => other.to_string(),
            };
            println!("  {} {}", "✗".red().bold(), message.red());
        }
    }
    println!();
}
