//! oob-adapter CLI

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;

use oob_adapter::config::{self, AdapterConfig, CliOverrides};
use oob_adapter::http::HttpClient;
use oob_adapter::{FilterType, OobAdapter, ProviderKind, Record, ValidateParams};

/// Confirm out-of-band interactions through DNS/HTTP log services
#[derive(Parser)]
#[command(name = "oob-adapter", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProviderArgs {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Provider (ceye, dnslogcn, alphalog, xray, revsuit)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// API key or token
    #[arg(short, long, global = true)]
    key: Option<String>,

    /// DNS zone recorded by the provider
    #[arg(short, long, global = true)]
    domain: Option<String>,

    /// Provider API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// HTTP recorder base URL (revsuit)
    #[arg(long, global = true)]
    http_url: Option<String>,

    /// Match policy (loose or strict)
    #[arg(long, global = true)]
    match_policy: Option<String>,

    /// Request deadline in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Retries per request
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// HTTP/HTTPS proxy URL
    #[arg(long, global = true)]
    proxy: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported providers
    Providers,

    /// Generate a set of callback addresses
    Domain,

    /// Check whether a token was logged
    Validate {
        /// Token returned by `domain`
        #[arg(short, long)]
        filter: String,

        /// Interaction kind (http, dns, jndi, rmi, ldap)
        #[arg(short = 't', long = "type", default_value = "dns")]
        filter_type: String,

        /// Keep polling for up to this many seconds
        #[arg(short, long, default_value_t = 0)]
        wait: u64,

        /// Print the raw provider response
        #[arg(long)]
        show_body: bool,
    },

    /// Print the provider's current log as records
    Poll {
        /// Interaction kind (http, dns, jndi, rmi, ldap)
        #[arg(short = 't', long = "type", default_value = "dns")]
        filter_type: String,
    },
}

fn print_banner() {
    println!("{}", "  oob-adapter".cyan().bold());
    println!("  {}\n", "─".repeat(35));
}

fn print_records(records: &[Record]) {
    if records.is_empty() {
        println!("  {}", "No records.".yellow());
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Time", "Snippet", "Key"]);
    for record in records {
        builder.push_record([
            record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.snippet.clone(),
            record.unique_key.clone(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");
}

fn load(args: ProviderArgs) -> oob_adapter::Result<AdapterConfig> {
    let mut adapter_config = if let Some(ref path) = args.config {
        config::load_config(path)?
    } else {
        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            config::load_config(default_path)?
        } else {
            AdapterConfig::default()
        }
    };

    config::merge_cli_args(
        &mut adapter_config,
        CliOverrides {
            provider: args.provider,
            key: args.key,
            domain: args.domain,
            api_url: args.api_url,
            http_url: args.http_url,
            match_policy: args.match_policy,
            timeout: args.timeout,
            retries: args.retries,
            proxy: args.proxy,
        },
    )?;

    Ok(adapter_config)
}

async fn connect(adapter_config: &AdapterConfig) -> oob_adapter::Result<OobAdapter> {
    let kind = adapter_config.require_provider()?;
    let transport = Arc::new(HttpClient::new(adapter_config.transport.clone())?);
    OobAdapter::with_provider(kind, adapter_config.connection.clone(), transport).await
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "oob_adapter=debug"
    } else {
        "oob_adapter=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Providers => {
            print_banner();
            println!("  {}\n", "Supported Providers:".bold());
            for kind in ProviderKind::ALL {
                let kinds: Vec<&str> = kind
                    .supported_filter_types()
                    .iter()
                    .map(FilterType::as_str)
                    .collect();
                println!(
                    "    {} {}",
                    format!("{:12}", kind.as_str()).cyan().bold(),
                    kinds.join(", ")
                );
            }
            println!();
        }

        Commands::Domain => {
            let adapter_config = load(cli.provider)?;
            let adapter = connect(&adapter_config).await?;
            let domains = adapter.validation_domains();

            print_banner();
            println!("  {} {}", "Filter:".bold(), domains.filter.green());
            for kind in FilterType::ALL {
                if let Some(address) = domains.address(kind) {
                    println!("  {} {}", format!("{:6}", kind.as_str().to_uppercase()).bold(), address);
                }
            }
        }

        Commands::Validate {
            filter,
            filter_type,
            wait,
            show_body,
        } => {
            let adapter_config = load(cli.provider)?;
            let adapter = connect(&adapter_config).await?;

            let result = match FilterType::from_str(&filter_type) {
                Ok(kind) if wait > 0 => {
                    adapter
                        .wait_for(
                            &ValidateParams::new(filter.as_str(), kind),
                            Duration::from_secs(wait),
                            Duration::from_secs(1),
                        )
                        .await
                }
                _ => adapter.validate_raw(&filter, &filter_type).await,
            };

            if result.is_valid {
                println!(
                    "  {} {} interaction for {}",
                    "HIT:".green().bold(),
                    result.filter_type.to_uppercase(),
                    filter.green()
                );
            } else {
                println!(
                    "  {} no {} interaction for {}",
                    "MISS:".red().bold(),
                    result.filter_type.to_uppercase(),
                    filter
                );
            }
            if show_body {
                println!("\n{}", result.body);
            }
            if !result.is_valid {
                std::process::exit(1);
            }
        }

        Commands::Poll { filter_type } => {
            let kind = FilterType::from_str(&filter_type)?;
            let adapter_config = load(cli.provider)?;
            let adapter = connect(&adapter_config).await?;

            print_banner();
            let records = adapter.poll_records(kind).await;
            print_records(&records);
        }
    }

    Ok(())
}
