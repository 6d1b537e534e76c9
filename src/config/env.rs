use crate::error::PurinaError;

use super::types::PurinaConfig;

/// Expand environment variable references in a string.
///
/// Supported syntaxes:
/// - `${VAR}` - replaced with env var value; error if unset
/// - `${VAR:-fallback}` - replaced with env var value, or fallback if unset or empty
/// - `$env:VAR` - same as `${VAR}`
pub fn expand_env_vars(input: &str) -> Result<String, PurinaError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            let mut found_close = false;
            for c in chars.by_ref() {
                if c == '}' {
                    found_close = true;
                    break;
                }
                var_expr.push(c);
            }
            if !found_close {
                return Err(env_error(&format!(
                    "Unclosed variable reference: ${{{var_expr}"
                )));
            }

            match var_expr.split_once(":-") {
                Some((var_name, fallback)) => match std::env::var(var_name) {
                    Ok(val) if !val.is_empty() => result.push_str(&val),
                    _ => result.push_str(fallback),
                },
                None => result.push_str(&lookup(&var_expr)?),
            }
            continue;
        }

        let remaining: String = chars.clone().collect();
        if remaining.starts_with("env:") {
            for _ in 0..4 {
                chars.next();
            }
            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' {
                    var_name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                return Err(env_error("Empty variable name in $env: reference"));
            }
            result.push_str(&lookup(&var_name)?);
            continue;
        }

        // Not a recognized pattern, output the '$' literally
        result.push('$');
    }

    Ok(result)
}

fn lookup(var_name: &str) -> Result<String, PurinaError> {
    std::env::var(var_name)
        .map_err(|_| env_error(&format!("Environment variable '{var_name}' is not set")))
}

/// Expand environment variables in every string field of a config file.
pub fn expand_config(config: &mut PurinaConfig) -> Result<(), PurinaError> {
    for field in [
        &mut config.client_id,
        &mut config.client_secret,
        &mut config.endpoint,
    ] {
        if let Some(value) = field {
            *value = expand_env_vars(value)?;
        }
    }
    if let Some(ref mut dir) = config.cache_dir {
        let expanded = expand_env_vars(&dir.to_string_lossy())?;
        *dir = expanded.into();
    }
    Ok(())
}

fn env_error(detail: &str) -> PurinaError {
    PurinaError::ConfigFile {
        path: std::path::PathBuf::from("<env>"),
        detail: detail.to_string(),
    }
}
