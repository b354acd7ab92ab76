//! DomainDetails CLI Application
//!
//! A command-line interface for domain registration lookups using RDAP with a
//! WHOIS fallback. This CLI application provides a user-friendly interface to
//! the domaindetails-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use console::style;
use domaindetails_lib::{
    load_env_config, parse_timeout, ConfigManager, DomainResolver, EnvConfig, FileConfig,
    LookupConfig, LookupResult,
};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Log filter when neither `--verbose` nor `DD_LOG` is given
const DEFAULT_LOG_FILTER: &str = "warn";

/// Log filter for `--verbose`
const VERBOSE_LOG_FILTER: &str = "warn,domaindetails=debug,domaindetails_lib=debug";

/// CLI arguments for domaindetails
#[derive(Parser, Debug)]
#[command(name = "domaindetails")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Domain RDAP and WHOIS lookup tool")]
#[command(
    long_about = "Performs RDAP lookups (preferred) with WHOIS fallback for domain registration\ninformation. Caches IANA bootstrap data locally.\n\nExamples:\n  domaindetails lookup example.com\n  domaindetails rdap google.com --json\n  domaindetails whois github.io --raw"
)]
#[command(styles = STYLES)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Output as JSON
    #[arg(short = 'j', long = "json", global = true, help_heading = "Output Format")]
    pub json: bool,

    /// Include raw response data
    #[arg(short = 'r', long = "raw", global = true, help_heading = "Output Format")]
    pub raw: bool,

    /// Verbose output (debug logs on stderr)
    #[arg(short = 'v', long = "verbose", global = true, help_heading = "Output Format")]
    pub verbose: bool,

    /// Use a specific config file instead of discovery
    #[arg(long = "config", value_name = "FILE", global = true, help_heading = "Configuration")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Look up domain registration info (RDAP preferred, WHOIS fallback)
    Lookup {
        /// Domain name (e.g., example.com)
        domain: String,
    },

    /// Look up a domain over RDAP only
    Rdap {
        /// Domain name (e.g., example.com)
        domain: String,
    },

    /// Look up a domain through the WHOIS API only
    Whois {
        /// Domain name (e.g., example.com)
        domain: String,
    },

    /// Manage the local RDAP bootstrap cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum CacheAction {
    /// Force update the RDAP bootstrap cache
    Update,
    /// Show cache status and statistics
    Info,
    /// Clear the local cache
    Clear,
}

/// Effective settings after merging config files, environment and flags.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub lookup: LookupConfig,
    pub json: bool,
    pub raw: bool,
    pub verbose: bool,
}

type LogHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_override = std::env::var("DD_LOG").ok().filter(|f| !f.trim().is_empty());
    let log_handle = init_logging(log_override.as_deref());

    if let Err(e) = run(args, &log_handle, log_override.is_some()).await {
        eprintln!("{} {}", style("error:").red().bold().for_stderr(), e);
        process::exit(1);
    }
}

/// Install the stderr subscriber; the filter can be raised once settings are known.
fn init_logging(filter_override: Option<&str>) -> LogHandle {
    let filter = EnvFilter::new(filter_override.unwrap_or(DEFAULT_LOG_FILTER));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    handle
}

async fn run(
    args: Args,
    log_handle: &LogHandle,
    log_overridden: bool,
) -> Result<(), Box<dyn Error>> {
    let settings = build_config(&args)?;

    if settings.verbose && !log_overridden {
        log_handle.reload(EnvFilter::new(VERBOSE_LOG_FILTER))?;
    }

    debug!(
        "domaindetails v{} (cache: {})",
        env!("CARGO_PKG_VERSION"),
        settings.lookup.cache_dir.display()
    );

    let resolver = DomainResolver::with_config(settings.lookup.clone())?;

    let (domain, outcome) = match &args.command {
        Command::Cache { action } => {
            return run_cache_command(*action, &resolver, &settings).await;
        }
        Command::Lookup { domain } => {
            let outcome = with_spinner(&settings, domain, resolver.lookup(domain)).await;
            (domain, outcome)
        }
        Command::Rdap { domain } => {
            let outcome = with_spinner(&settings, domain, resolver.lookup_rdap(domain)).await;
            (domain, outcome)
        }
        Command::Whois { domain } => {
            let outcome = with_spinner(&settings, domain, resolver.lookup_whois(domain)).await;
            (domain, outcome)
        }
    };

    let result = outcome?;
    debug!("{} answered via {}", domain, result.method);
    display_result(&result, &settings)
}

/// Run a lookup, with a spinner in text mode on a terminal.
async fn with_spinner<F>(settings: &Settings, domain: &str, lookup: F) -> F::Output
where
    F: std::future::Future,
{
    let spinner = if settings.json {
        None
    } else {
        ui::Spinner::start(format!("Looking up {}...", domain))
    };

    let output = lookup.await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }
    output
}

async fn run_cache_command(
    action: CacheAction,
    resolver: &DomainResolver,
    settings: &Settings,
) -> Result<(), Box<dyn Error>> {
    let cache = resolver.cache();

    match action {
        CacheAction::Update => {
            let meta = cache
                .refresh()
                .await
                .map_err(|e| format!("Failed to update cache: {}", e))?;

            if settings.json {
                println!("{}", serde_json::to_string_pretty(&meta)?);
            } else {
                ui::print_cache_updated(&meta);
            }
        }
        CacheAction::Info => {
            let info = cache
                .inspect()
                .await
                .map_err(|e| format!("Failed to get cache info: {}", e))?;

            if settings.json {
                println!("{}", serde_json::to_string_pretty(&ui::cache_info_json(&info))?);
            } else {
                ui::print_cache_info(&info);
            }
        }
        CacheAction::Clear => {
            cache.clear().await;
            println!("Cache cleared successfully");
        }
    }

    Ok(())
}

/// Display a lookup result in the selected format.
fn display_result(result: &LookupResult, settings: &Settings) -> Result<(), Box<dyn Error>> {
    if settings.json {
        let output = if settings.raw {
            result.clone()
        } else {
            result.clone().without_raw()
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        ui::print_result(result, settings.raw);
    }

    Ok(())
}

/// Resolve settings with precedence CLI > environment > config files > defaults.
fn build_config(args: &Args) -> Result<Settings, Box<dyn Error>> {
    let env_config = load_env_config();
    let config_manager = ConfigManager::new();

    // Step 1: explicit config file (--config, then DD_CONFIG) or discovery
    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => {
            debug!("Using explicit config file: {}", path.display());
            config_manager.load_file(path)?
        }
        None => config_manager.discover_and_load(),
    };

    let settings = merge_file_config(Settings::default(), file_config);

    // Step 2: Apply environment variables (DD_*)
    let settings = apply_environment_config(settings, &env_config);

    // Step 3: Apply CLI arguments (highest precedence)
    Ok(apply_cli_args(settings, args))
}

/// Merge a FileConfig into Settings.
fn merge_file_config(mut settings: Settings, file_config: FileConfig) -> Settings {
    if let Some(defaults) = file_config.defaults {
        if let Some(json) = defaults.json {
            settings.json = json;
        }
        if let Some(raw) = defaults.raw {
            settings.raw = raw;
        }
        if let Some(verbose) = defaults.verbose {
            settings.verbose = verbose;
        }
    }

    if let Some(endpoints) = file_config.endpoints {
        if let Some(url) = endpoints.bootstrap_url {
            settings.lookup.bootstrap_url = url;
        }
        if let Some(url) = endpoints.whois_api_url {
            settings.lookup.whois_api_url = url;
        }
    }

    if let Some(dir) = file_config.cache.and_then(|c| c.dir) {
        settings.lookup.cache_dir = PathBuf::from(dir);
    }

    if let Some(timeouts) = file_config.timeouts {
        if let Some(timeout) = timeouts.rdap.as_deref().and_then(parse_timeout) {
            settings.lookup.rdap_timeout = timeout;
        }
        if let Some(timeout) = timeouts.whois.as_deref().and_then(parse_timeout) {
            settings.lookup.whois_timeout = timeout;
        }
        if let Some(timeout) = timeouts.bootstrap.as_deref().and_then(parse_timeout) {
            settings.lookup.bootstrap_timeout = timeout;
        }
    }

    settings.lookup.include_raw = settings.raw;
    settings
}

/// Apply DD_* environment values on top of file settings.
fn apply_environment_config(mut settings: Settings, env_config: &EnvConfig) -> Settings {
    if let Some(json) = env_config.json {
        settings.json = json;
    }
    if let Some(raw) = env_config.raw {
        settings.raw = raw;
    }
    if let Some(verbose) = env_config.verbose {
        settings.verbose = verbose;
    }
    if let Some(dir) = &env_config.cache_dir {
        settings.lookup.cache_dir = dir.clone();
    }
    if let Some(url) = &env_config.bootstrap_url {
        settings.lookup.bootstrap_url = url.clone();
    }
    if let Some(url) = &env_config.whois_api_url {
        settings.lookup.whois_api_url = url.clone();
    }
    if let Some(timeout) = env_config.rdap_timeout {
        settings.lookup.rdap_timeout = timeout;
    }
    if let Some(timeout) = env_config.whois_timeout {
        settings.lookup.whois_timeout = timeout;
    }

    settings.lookup.include_raw = settings.raw;
    settings
}

/// Apply CLI flags (highest precedence).
///
/// Flags only ever switch options on: an absent flag leaves the environment
/// or file value in place.
fn apply_cli_args(mut settings: Settings, args: &Args) -> Settings {
    if args.json {
        settings.json = true;
    }
    if args.raw {
        settings.raw = true;
    }
    if args.verbose {
        settings.verbose = true;
    }

    settings.lookup.include_raw = settings.raw;
    settings
}
