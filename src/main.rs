use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use purina_client::cli::connection::ConnectionOverrides;
use purina_client::cli::output::{print_error, OutputMode};
use purina_client::cli::request::{run_request, run_token, RequestArgs};
use purina_client::{Method, PurinaError};

#[derive(Parser)]
#[command(name = "purina", version, about = "Call the Purina profiles API with a cached OAuth2 token")]
struct Cli {
    /// Path to a purina.json config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// OAuth2 client ID
    #[arg(long, global = true, env = "PURINA_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long, global = true, env = "PURINA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// API endpoint
    #[arg(long, global = true, env = "PURINA_ENDPOINT")]
    endpoint: Option<String>,

    /// Writable directory for the cached access token
    #[arg(long, global = true, env = "PURINA_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Compact JSON output
    #[arg(long, global = true)]
    raw: bool,

    /// Pretty JSON output, errors included
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate and print the access token
    Token,
    /// GET a resource; key=value pairs become query params
    Get(ReadArgs),
    /// DELETE a resource; key=value pairs become query params
    Delete(ReadArgs),
    /// OPTIONS on a resource; key=value pairs become query params
    Options(ReadArgs),
    /// POST to a resource; key=value pairs become body fields
    Post(WriteArgs),
    /// PUT to a resource; key=value pairs become body fields
    Put(WriteArgs),
    /// PATCH a resource; key=value pairs become body fields
    Patch(WriteArgs),
}

#[derive(Args)]
struct ReadArgs {
    /// Resource path, absolute or relative to /service/api/v2/
    path: String,

    /// Query parameters
    params: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct WriteArgs {
    /// Resource path, absolute or relative to /service/api/v2/
    path: String,

    /// Body fields
    fields: Vec<String>,

    /// JSON body, or @file to read it from a file
    #[arg(long)]
    data: Option<String>,

    /// Query parameter (repeatable)
    #[arg(long = "param")]
    params: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct CommonArgs {
    /// Extra header as 'Name: value' (repeatable)
    #[arg(long = "header", short = 'H')]
    headers: Vec<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

impl ReadArgs {
    fn into_request(self) -> RequestArgs {
        RequestArgs {
            path: self.path,
            pairs: self.params,
            params: Vec::new(),
            data: None,
            headers: self.common.headers,
            timeout_secs: self.common.timeout,
        }
    }
}

impl WriteArgs {
    fn into_request(self) -> RequestArgs {
        RequestArgs {
            path: self.path,
            pairs: self.fields,
            params: self.params,
            data: self.data,
            headers: self.common.headers,
            timeout_secs: self.common.timeout,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PURINA_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(e) = run(cli).await {
        print_error(&e, json_mode);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), PurinaError> {
    let mode = OutputMode::from_flags(cli.raw, cli.json);
    let overrides = ConnectionOverrides {
        config_path: cli.config,
        client_id: cli.client_id,
        client_secret: cli.client_secret,
        endpoint: cli.endpoint,
        cache_dir: cli.cache_dir,
    };

    let (method, args) = match cli.command {
        Commands::Token => return run_token(&overrides, mode).await,
        Commands::Get(a) => (Method::Get, a.into_request()),
        Commands::Delete(a) => (Method::Delete, a.into_request()),
        Commands::Options(a) => (Method::Options, a.into_request()),
        Commands::Post(a) => (Method::Post, a.into_request()),
        Commands::Put(a) => (Method::Put, a.into_request()),
        Commands::Patch(a) => (Method::Patch, a.into_request()),
    };
    run_request(&overrides, method, &args, mode).await
}
