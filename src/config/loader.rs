use std::path::{Path, PathBuf};

use crate::error::PurinaError;

use super::env::expand_config;
use super::types::PurinaConfig;

/// Strip JSONC comments (// line comments and /* */ block comments) from input.
pub fn strip_jsonc_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(ch) = chars.next() {
        if escape_next {
            escape_next = false;
            result.push(ch);
            continue;
        }

        if in_string {
            result.push(ch);
            if ch == '\\' {
                escape_next = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            result.push(ch);
            continue;
        }

        if ch != '/' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some(&'/') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    // keep line numbers stable for parse errors
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(ch),
        }
    }

    result
}

/// Discover config files in precedence order (highest first).
///
/// Precedence:
/// 1. `--config` CLI flag
/// 2. `PURINA_CONFIG` env var
/// 3. `./config/purina.json` (project-level)
/// 4. `~/.purina/purina.json` or `~/.purina/purina.jsonc` (home-level)
pub fn discover_config_files(cli_config: Option<&str>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Some(path) = cli_config {
        let p = PathBuf::from(path);
        if p.exists() {
            files.push(p);
        }
    }

    if let Ok(env_path) = std::env::var("PURINA_CONFIG") {
        let p = PathBuf::from(&env_path);
        if p.exists() && !files.contains(&p) {
            files.push(p);
        }
    }

    let project_config = PathBuf::from("./config/purina.json");
    if project_config.exists() && !files.contains(&project_config) {
        files.push(project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_json = home.join(".purina").join("purina.json");
        let home_jsonc = home.join(".purina").join("purina.jsonc");
        if home_json.exists() && !files.contains(&home_json) {
            files.push(home_json);
        } else if home_jsonc.exists() && !files.contains(&home_jsonc) {
            files.push(home_jsonc);
        }
    }

    files
}

fn load_config_file(path: &Path) -> Result<PurinaConfig, PurinaError> {
    let content = std::fs::read_to_string(path).map_err(|e| PurinaError::ConfigFile {
        path: path.to_path_buf(),
        detail: format!("Cannot read file: {e}"),
    })?;

    let stripped = strip_jsonc_comments(&content);
    serde_json::from_str::<PurinaConfig>(&stripped).map_err(|e| PurinaError::ConfigFile {
        path: path.to_path_buf(),
        detail: format!("Invalid JSON: {e}"),
    })
}

/// Load, merge, and expand all configuration files.
///
/// An explicitly requested `--config` path that does not exist is an error;
/// the implicit locations are simply skipped when absent. Fields from
/// higher-precedence files win.
pub fn load_config(cli_config: Option<&str>) -> Result<PurinaConfig, PurinaError> {
    if let Some(path) = cli_config {
        if !Path::new(path).exists() {
            return Err(PurinaError::ConfigFile {
                path: PathBuf::from(path),
                detail: "File not found".to_string(),
            });
        }
    }

    let mut merged = PurinaConfig::default();
    for path in discover_config_files(cli_config) {
        tracing::debug!(path = %path.display(), "loading config file");
        merged.merge(load_config_file(&path)?);
    }

    expand_config(&mut merged)?;
    Ok(merged)
}
