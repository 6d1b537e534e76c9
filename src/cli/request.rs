use std::io::IsTerminal;
use std::time::Duration;

use serde_json::{json, Value};

use crate::args::{parse_data, parse_fields, parse_header, parse_params};
use crate::error::PurinaError;
use crate::transport::{Method, RequestOptions};

use super::connection::{connect, ConnectionOverrides};
use super::output::{print_value, OutputMode};

/// Arguments of a single API call as typed on the command line.
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    pub path: String,
    /// `key=value` pairs: query params for GET/DELETE/OPTIONS, body fields otherwise.
    pub pairs: Vec<String>,
    /// Extra query params for write verbs.
    pub params: Vec<String>,
    pub data: Option<String>,
    pub headers: Vec<String>,
    pub timeout_secs: Option<u64>,
}

fn takes_body(method: Method) -> bool {
    matches!(method, Method::Post | Method::Put | Method::Patch)
}

/// Work out query params, body and options for a call without touching the network.
pub fn build_call(
    method: Method,
    args: &RequestArgs,
) -> Result<(Vec<(String, String)>, Option<Value>, RequestOptions), PurinaError> {
    let mut query = parse_params(&args.params)?;
    let body = if takes_body(method) {
        let mut body = match args.data.as_deref() {
            Some(data) => parse_data(data)?,
            None => json!({}),
        };
        if !args.pairs.is_empty() {
            let fields = parse_fields(&args.pairs)?;
            match (&mut body, fields) {
                (Value::Object(target), Value::Object(extra)) => target.extend(extra),
                _ => {
                    return Err(PurinaError::Configuration(
                        "key=value fields can only be combined with a JSON object in --data"
                            .to_string(),
                    ))
                }
            }
        }
        Some(body)
    } else {
        if args.data.is_some() {
            return Err(PurinaError::Configuration(format!(
                "{method} requests do not take a body"
            )));
        }
        query.extend(parse_params(&args.pairs)?);
        None
    };

    let mut options = RequestOptions::default();
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        options.headers.insert(name, value);
    }
    if let Some(secs) = args.timeout_secs {
        options.timeout = Some(Duration::from_secs(secs));
    }

    Ok((query, body, options))
}

/// Run one API call and print the decoded response.
pub async fn run_request(
    overrides: &ConnectionOverrides,
    method: Method,
    args: &RequestArgs,
    mode: OutputMode,
) -> Result<(), PurinaError> {
    let (query, body, options) = build_call(method, args)?;
    let client = connect(overrides).await?;

    let params: Vec<(&str, &str)> = query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let value = client
        .request(method, &args.path, body.as_ref(), &params, &options)
        .await?;

    print_value(&value, mode, std::io::stdout().is_terminal());
    Ok(())
}

/// Authenticate and print the token in use.
pub async fn run_token(
    overrides: &ConnectionOverrides,
    mode: OutputMode,
) -> Result<(), PurinaError> {
    let client = connect(overrides).await?;
    match mode {
        OutputMode::Json => {
            let out = json!({
                "accessToken": client.access_token(),
                "expiresAt": client.credential().expires_at.to_rfc3339(),
                "cacheKey": client.cache_key(),
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        }
        OutputMode::Raw | OutputMode::Pretty => println!("{}", client.access_token()),
    }
    Ok(())
}
