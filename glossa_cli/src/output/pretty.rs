//! Pretty formatter for terminal output.
//!
//! Youdao entries and Urban definition lists get dedicated layouts; anything
//! else falls back to an indented key/value view.

use owo_colors::OwoColorize;
use serde_json::{Map, Value};

/// Indent for card content (after number)
const CARD_INDENT: usize = 5;

/// Keys shown in bold
const TITLE_KEYS: &[&str] = &["title", "word", "id"];

/// Keys shown as links
const URL_KEYS: &[&str] = &["url", "permalink"];

pub fn format_pretty(value: &Value) -> String {
    let mut output = String::new();
    format_value(value, &mut output, 0);
    output
}

/// Render a dictionary result for a terminal `width` columns wide.
pub fn format_entry(result: &Value, width: usize) -> String {
    match result {
        Value::Object(obj) if obj.contains_key("title") => format_youdao(obj, width),
        Value::Array(items) if items.iter().all(|i| i.get("definition").is_some()) => {
            format_definitions(items, width)
        }
        other => format_pretty(other),
    }
}

fn wrap(text: &str, width: usize, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let options = textwrap::Options::new(width.saturating_sub(indent).max(20))
        .initial_indent(&pad)
        .subsequent_indent(&pad);
    textwrap::fill(text, options)
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a str {
    obj.get(key).and_then(Value::as_str).unwrap_or("")
}

fn format_youdao(obj: &Map<String, Value>, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("  {}", str_field(obj, "title").bold()));

    if let Some(Value::Array(phonetics)) = obj.get("phonetics") {
        for phonetic in phonetics.iter().filter_map(Value::as_object) {
            let label = str_field(phonetic, "label");
            let ipa = str_field(phonetic, "ipa");
            if label.is_empty() {
                out.push_str(&format!("  {}", ipa.dimmed()));
            } else {
                out.push_str(&format!("  {} {}", label.dimmed(), ipa.dimmed()));
            }
        }
    }
    out.push('\n');

    if let Some(Value::Array(basic)) = obj.get("basic") {
        for line in basic.iter().filter_map(Value::as_str) {
            out.push_str(&wrap(line, width, 4));
            out.push('\n');
        }
    }

    if let Some(Value::Array(phrases)) = obj.get("phrases") {
        out.push('\n');
        out.push_str(&format!("  {}\n", "Phrases".cyan().bold()));
        for phrase in phrases.iter().filter_map(Value::as_object) {
            out.push_str(&format!(
                "    {}  {}\n",
                str_field(phrase, "phrase").green(),
                str_field(phrase, "meaning")
            ));
        }
    }

    if let Some(Value::Array(sentences)) = obj.get("sentences") {
        out.push('\n');
        out.push_str(&format!("  {}\n", "Examples".cyan().bold()));
        for (i, sentence) in sentences.iter().filter_map(Value::as_object).enumerate() {
            out.push_str(&format!(
                "  {:>2}. {}\n",
                i + 1,
                str_field(sentence, "source")
            ));
            out.push_str(&format!(
                "{}{}\n",
                " ".repeat(CARD_INDENT + 1),
                str_field(sentence, "translation").dimmed()
            ));
        }
    }
    out
}

fn format_definitions(items: &[Value], width: usize) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().filter_map(Value::as_object).enumerate() {
        out.push_str(&format!(
            "  {:>2}. {}\n",
            i + 1,
            str_field(item, "word").bold()
        ));
        out.push_str(&wrap(str_field(item, "definition"), width, CARD_INDENT + 1));
        out.push('\n');

        let example = str_field(item, "example");
        if !example.is_empty() {
            out.push_str(&wrap(example, width, CARD_INDENT + 1).italic().to_string());
            out.push('\n');
        }

        let up = item.get("thumbs_up").and_then(Value::as_i64).unwrap_or(0);
        let down = item.get("thumbs_down").and_then(Value::as_i64).unwrap_or(0);
        out.push_str(&format!(
            "{}{} {}",
            " ".repeat(CARD_INDENT + 1),
            format!("▲ {}", up).green(),
            format!("▼ {}", down).red()
        ));
        if let Some(link) = item.get("permalink").and_then(Value::as_str) {
            out.push_str(&format!("  {}", link.blue()));
        }
        out.push_str("\n\n");
    }
    out
}

fn format_value(value: &Value, output: &mut String, depth: usize) {
    match value {
        Value::Object(obj) => format_object(obj, output, depth),
        Value::Array(arr) => {
            let indent = "  ".repeat(depth);
            for item in arr {
                if item.is_object() || item.is_array() {
                    output.push_str(&format!("{}{}\n", indent, "-".dimmed()));
                    format_value(item, output, depth + 1);
                } else {
                    output.push_str(&format!(
                        "{}{} {}\n",
                        indent,
                        "•".dimmed(),
                        format_scalar(item)
                    ));
                }
            }
        }
        _ => output.push_str(&format_scalar(value)),
    }
}

fn format_object(obj: &Map<String, Value>, output: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    for (key, value) in obj {
        match value {
            Value::Object(_) | Value::Array(_) => {
                output.push_str(&format!("{}{}:\n", indent, key.cyan().bold()));
                format_value(value, output, depth + 1);
            }
            _ => {
                let formatted_key = if TITLE_KEYS.contains(&key.as_str()) {
                    key.bold().to_string()
                } else {
                    key.dimmed().to_string()
                };
                let formatted_val = if URL_KEYS.contains(&key.as_str()) {
                    format_scalar(value).blue().to_string()
                } else {
                    format_scalar(value)
                };
                output.push_str(&format!("{}{}: {}\n", indent, formatted_key, formatted_val));
            }
        }
    }
}

fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}
