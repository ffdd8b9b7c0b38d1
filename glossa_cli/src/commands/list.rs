use crate::cli::{Cli, OutputFormat};
use crate::commands::Result;
use crate::output::{format_output, terminal_width, truncate_text, OutputData};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use glossa_core::{build_registry_enabled_only, ConfigSyncPolicy};
use owo_colors::OwoColorize;

pub async fn run(cli: &Cli) -> Result<()> {
    // Listing needs no stored config, so the sync policy is irrelevant here.
    let registry = build_registry_enabled_only(ConfigSyncPolicy::default());
    let dicts = registry.list_dicts();

    if dicts.is_empty() {
        println!("{}", "No dictionaries compiled in".yellow());
        return Ok(());
    }

    if cli.output != OutputFormat::Pretty {
        return format_output(&OutputData::DictList(dicts), &cli.output);
    }

    let term_width = terminal_width();
    let desc_width = term_width.saturating_sub(20);

    println!("{}", "Available Dictionaries".bold().cyan());
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(term_width as u16)
        .set_header(vec!["Id", "Description"]);

    for dict in &dicts {
        table.add_row(vec![
            dict.id.clone(),
            truncate_text(&dict.description, desc_width.max(30)),
        ]);
    }

    println!("{}", table);
    println!();
    println!(
        "{} Use {} to look a word up",
        "Tip:".green().bold(),
        "glossa search <dict> <text>".cyan()
    );
    Ok(())
}
