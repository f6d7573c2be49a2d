//! cloudlens - terminal dashboard for AWS and GCP resources
//!
//! Type a mnemonic (`ec2`, `s3`, `iam:u`) to open a live, auto-refreshing table of that
//! resource; drill in with Enter and come back with Esc.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cloudlens::source::Target;
use cloudlens::{catalog, default_data_dir, AliasStore, Cloud, Config, DataSource, DataSources, FixtureSource, Session};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// cloudlens - browse cloud resources from the terminal
#[derive(Parser)]
#[command(
    name = "cloudlens",
    author,
    version,
    about = "Terminal dashboard for browsing AWS and GCP resources",
    long_about = r#"
cloudlens is a command-driven navigator for cloud resources.

Examples:
  cloudlens                         Start the dashboard on the default cloud (AWS)
  cloudlens --cloud gcp --project p Start on GCP Cloud Storage
  cloudlens aliases list            Show every mnemonic and its resource
  cloudlens aliases reset           Drop user-defined aliases
"#
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Data directory for config, aliases, fixtures and logs
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Cloud provider to start on
    #[arg(short, long, global = true, value_enum, default_value_t = Cloud::Aws)]
    cloud: Cloud,

    /// AWS profile (defaults to $AWS_PROFILE)
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// AWS region (defaults to $AWS_DEFAULT_REGION)
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// GCP project id
    #[arg(long, global = true)]
    project: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive dashboard (default)
    #[command(alias = "tui")]
    Ui,

    /// Inspect or reset the alias table
    #[command(alias = "alias")]
    Aliases(AliasArgs),

    /// Display version and paths
    Info,
}

#[derive(Args)]
struct AliasArgs {
    #[command(subcommand)]
    action: AliasAction,
}

#[derive(Subcommand)]
enum AliasAction {
    /// List built-in and user aliases
    List,

    /// Remove user aliases and reload the built-ins
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

fn init_logging(config: &Config) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_file())
        .with_context(|| format!("cannot open log file {}", config.log_file().display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Offline data: every resource is read from `<data_dir>/fixtures`
fn fixture_sources(config: &Config) -> DataSources {
    let dir = config.fixtures_dir();
    DataSources::new().with_fallback(move |target: &Target<'_>| {
        let source = FixtureSource::open(&dir, target.resource, target.path)?;
        Ok(Arc::new(source) as Arc<dyn DataSource>)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let config = Config::load(&data_dir).context("invalid configuration")?;

    if let Some(Commands::Info) = &cli.command {
        println!("cloudlens - cloud resource dashboard");
        println!("Version: {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Data directory: {}", config.data_dir.display());
        println!("Aliases file:   {}", config.aliases_file().display());
        println!("Fixtures:       {}", config.fixtures_dir().display());
        println!("Log file:       {}", config.log_file().display());
        println!("Refresh rate:   {}s", config.refresh_rate_secs);
        return Ok(());
    }

    config.ensure_data_dir()?;
    init_logging(&config)?;

    let session = Session::new(cli.cloud, cli.profile, cli.region, cli.project);
    tracing::info!("Starting cloudlens for {}", session.label());

    match cli.command {
        None | Some(Commands::Ui) => {
            let shutdown = CancellationToken::new();
            let router = catalog::compose(&config, session, fixture_sources(&config), shutdown)
                .context("failed to initialize the command subsystem")?;
            cloudlens::cli::tui::run(router, &config, None).await?;
        }

        Some(Commands::Aliases(args)) => match args.action {
            AliasAction::List => {
                let store = AliasStore::new(config.aliases_file());
                catalog::register_builtins(&store)?;
                store.ensure().context("failed to load aliases")?;
                for alias in store.list() {
                    println!("{:<12} {:<14} {}", alias.mnemonic, alias.resource, alias.origin);
                }
            }

            AliasAction::Reset { force } => {
                if !force {
                    println!("Remove all user aliases in {}? [y/N]", config.aliases_file().display());
                    let mut input = String::new();
                    std::io::stdin().read_line(&mut input)?;
                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Aborted.");
                        return Ok(());
                    }
                }
                let store = catalog::reset_aliases(&config).context("failed to reset aliases")?;
                println!("Aliases reset, {} built-ins loaded", store.len());
            }
        },

        Some(Commands::Info) => {
            // Handled early, before initialization
            unreachable!()
        }
    }

    Ok(())
}
