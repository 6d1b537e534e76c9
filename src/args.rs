use crate::error::PurinaError;
use serde_json::{Map, Value};

fn split_pair(arg: &str) -> Result<(&str, &str), PurinaError> {
    // Prefer '=', since values such as timestamps and URLs often contain ':'.
    let pos = arg
        .find('=')
        .or_else(|| arg.find(':'))
        .ok_or_else(|| {
            PurinaError::Configuration(format!(
                "Cannot parse argument '{arg}': expected 'key=value' or 'key:value'"
            ))
        })?;
    let (key, value) = (&arg[..pos], &arg[pos + 1..]);
    if key.is_empty() {
        return Err(PurinaError::Configuration(format!(
            "Empty key in argument '{arg}'"
        )));
    }
    Ok((key, value))
}

/// Parse query parameters. Values are kept as strings.
pub fn parse_params(args: &[String]) -> Result<Vec<(String, String)>, PurinaError> {
    args.iter()
        .map(|arg| {
            let (key, value) = split_pair(arg)?;
            Ok((key.to_string(), strip_quotes(value).to_string()))
        })
        .collect()
}

/// Parse body fields into a JSON object.
///
/// Supports `key=value` and `key:value` formats. Values are auto-coerced:
/// - Quoted strings have quotes stripped
/// - `true`/`false` become booleans
/// - `null` becomes JSON null
/// - Valid numbers become JSON numbers
/// - Everything else stays a string
pub fn parse_fields(args: &[String]) -> Result<Value, PurinaError> {
    let mut map = Map::new();
    for arg in args {
        let (key, raw_value) = split_pair(arg)?;
        map.insert(key.to_string(), coerce_value(raw_value));
    }
    Ok(Value::Object(map))
}

/// Parse a `Name: value` header.
pub fn parse_header(arg: &str) -> Result<(String, String), PurinaError> {
    let (name, value) = arg.split_once(':').ok_or_else(|| {
        PurinaError::Configuration(format!(
            "Cannot parse header '{arg}': expected 'Name: value'"
        ))
    })?;
    let name = name.trim();
    if name.is_empty() {
        return Err(PurinaError::Configuration(format!(
            "Empty header name in '{arg}'"
        )));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse a `--data` argument: inline JSON, or `@path` to read JSON from a file.
pub fn parse_data(arg: &str) -> Result<Value, PurinaError> {
    let (source, text) = match arg.strip_prefix('@') {
        Some(path) => (path.to_string(), std::fs::read_to_string(path)?),
        None => ("--data".to_string(), arg.to_string()),
    };
    serde_json::from_str(&text)
        .map_err(|e| PurinaError::Configuration(format!("Invalid JSON in {source}: {e}")))
}

fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed != strip_quotes(trimmed) {
        return Value::String(strip_quotes(trimmed).to_string());
    }
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::String(trimmed.to_string())
}
