mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use modkit_authn::{
    AuthenticationSession, AuthenticatorRegistry, AuthnError, GatewayConfig, HttpForwarder,
    JsonPath, SimpleBearerAuthenticator,
};
use serde_json::Value;

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// authn-probe - run a gateway authenticator against a described request
#[derive(Parser)]
#[command(name = "authn-probe")]
#[command(about = "authn-probe - run a gateway authenticator against a described request")]
#[command(version)]
struct Cli {
    /// Path to gateway configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Authenticator id
    #[arg(short, long, default_value = "simple_bearer")]
    authenticator: String,

    /// Per-rule authenticator configuration (JSON)
    #[arg(short, long, default_value = "null")]
    rule_config: String,

    /// Method of the inbound request
    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Path and query of the inbound request
    #[arg(short, long, default_value = "/")]
    url: String,

    /// Header of the inbound request, `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate the described request and print the session
    Authenticate,
    /// Validate the authenticator configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.to_string_lossy());
    }

    logging::init(cli.verbose);

    // defaults -> YAML (if provided) -> env (AUTHN__*)
    let config = GatewayConfig::load(cli.config.as_deref())?;
    let rule: Value = serde_json::from_str(&cli.rule_config)
        .context("--rule-config must be a JSON document")?;

    let registry = build_registry(config)?;
    let authenticator = registry.get(&cli.authenticator)?;

    authenticator.validate(&rule)?;

    match cli.command.unwrap_or(Commands::Authenticate) {
        Commands::Check => {
            println!(
                "authenticator '{}' configuration is valid",
                authenticator.id()
            );
            Ok(())
        }
        Commands::Authenticate => {
            let request = inbound_request(&cli.method, &cli.url, &cli.headers)?;
            let mut session = AuthenticationSession::new();

            if let Err(e) = authenticator
                .authenticate(&request, &mut session, &rule)
                .await
            {
                if let AuthnError::Forbidden(ref forbidden) = e {
                    tracing::debug!(debug = forbidden.debug(), "forbidden details");
                }
                return Err(anyhow::Error::new(e).context("authentication failed"));
            }

            println!("{}", serde_json::to_string_pretty(&session)?);
            Ok(())
        }
    }
}

/// Startup wiring: one modifier table and one forwarder shared by all strategies
fn build_registry(config: GatewayConfig) -> Result<AuthenticatorRegistry> {
    let forwarder = HttpForwarder::new(config.forwarder.clone())?;
    let paths = Arc::new(JsonPath::with_default_modifiers());
    let config = Arc::new(config);

    let mut registry = AuthenticatorRegistry::default();
    registry.register(Arc::new(SimpleBearerAuthenticator::new(
        config,
        Arc::new(forwarder),
        paths,
    )))?;

    tracing::info!(authenticators = ?registry.ids(), "authenticators registered");
    Ok(registry)
}

fn inbound_request(method: &str, url: &str, headers: &[String]) -> Result<http::request::Parts> {
    let mut builder = http::Request::builder().method(method).uri(url);

    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header '{header}' must look like 'Name: value'"))?;
        builder = builder.header(name.trim(), value.trim());
    }

    let (parts, ()) = builder
        .body(())
        .context("invalid inbound request")?
        .into_parts();
    Ok(parts)
}
