use colored::Colorize;
use serde_json::Value;

use crate::error::PurinaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Raw,
    Json,
}

impl OutputMode {
    pub fn from_flags(raw: bool, json: bool) -> Self {
        if json {
            OutputMode::Json
        } else if raw {
            OutputMode::Raw
        } else {
            OutputMode::Pretty
        }
    }
}

/// Render an API response for the terminal.
///
/// Pretty mode prints top-level object fields one per line with the key
/// highlighted on a TTY; nested values stay as indented JSON.
pub fn render_value(value: &Value, mode: OutputMode, is_tty: bool) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(value).unwrap_or_default(),
        OutputMode::Raw => value.to_string(),
        OutputMode::Pretty => match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .iter()
                .map(|(key, field)| {
                    let key = if is_tty {
                        key.cyan().bold().to_string()
                    } else {
                        key.clone()
                    };
                    let field = match field {
                        Value::String(s) => s.clone(),
                        other => serde_json::to_string_pretty(other).unwrap_or_default(),
                    };
                    format!("{key}: {field}")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        },
    }
}

pub fn print_value(value: &Value, mode: OutputMode, is_tty: bool) {
    let rendered = render_value(value, mode, is_tty);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
}

pub fn print_error(err: &PurinaError, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&err.to_json()).unwrap_or_default());
    } else if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        eprintln!("{}: {err}", "Error".red().bold());
    } else {
        eprintln!("Error: {err}");
    }
}
