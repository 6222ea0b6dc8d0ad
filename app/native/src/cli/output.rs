//! CLI output formatting utilities.
//!
//! This module provides utilities for formatting CLI output including:
//! - JSON syntax highlighting
//! - Compact rectangle and status formatting for tables

use colored::Colorize;
use serde_json::Value;

use crate::tiling::Rect;

const INDENT: &str = "  ";

/// Prints JSON with syntax highlighting.
///
/// Colors:
/// - Keys: Cyan
/// - Strings: Green
/// - Numbers: Yellow
/// - Booleans/Null: Magenta
pub fn print_highlighted_json(value: &Value) {
    println!("{}", highlight_json(value));
}

/// Renders a JSON value as pretty-printed, colored text.
#[must_use]
pub fn highlight_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::Null => out.push_str(&"null".magenta().to_string()),
        Value::Bool(flag) => out.push_str(&flag.to_string().magenta().to_string()),
        Value::Number(number) => out.push_str(&number.to_string().yellow().to_string()),
        Value::String(text) => out.push_str(&quoted(text).green().to_string()),
        Value::Array(items) => {
            write_members(out, ('[', ']'), items.iter().map(|item| (None, item)), depth);
        }
        Value::Object(map) => {
            write_members(out, ('{', '}'), map.iter().map(|(key, item)| (Some(key.as_str()), item)), depth);
        }
    }
}

fn write_members<'a>(
    out: &mut String,
    (open, close): (char, char),
    members: impl ExactSizeIterator<Item = (Option<&'a str>, &'a Value)>,
    depth: usize,
) {
    let count = members.len();
    out.push(open);

    if count == 0 {
        out.push(close);
        return;
    }

    out.push('\n');
    for (index, (key, value)) in members.enumerate() {
        out.push_str(&INDENT.repeat(depth + 1));
        if let Some(key) = key {
            out.push_str(&quoted(key).cyan().to_string());
            out.push_str(": ");
        }
        write_value(out, value, depth + 1);
        if index + 1 < count {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&INDENT.repeat(depth));
    out.push(close);
}

/// JSON string literal with escapes applied.
fn quoted(text: &str) -> String { Value::String(text.to_owned()).to_string() }

/// Truncates a string to a maximum number of characters, adding ellipsis if needed.
///
/// Counts characters rather than bytes.
#[must_use]
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut truncated: String = s.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}

/// Formats a boolean as a colored check mark.
#[must_use]
pub fn format_bool(value: bool) -> String {
    if value { "✓".green().to_string() } else { "✗".red().to_string() }
}

/// Formats a frame as `x,y w×h` with whole pixels.
#[must_use]
pub fn format_rect(rect: &Rect) -> String {
    format!("{:.0},{:.0} {:.0}×{:.0}", rect.x, rect.y, rect.width, rect.height)
}
