use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redtrend::config::Config;
use redtrend::store::RedisStore;
use redtrend::trend::TrendEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "redtrend",
    version,
    about = "Decaying trend rankings on Redis sorted sets",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record activity for a member
    Record {
        /// Collection name
        name: String,

        /// Member identifier
        member: String,

        /// How many occurrences to record
        #[arg(long, default_value = "1")]
        count: f64,
    },

    /// Show the top trending members of a collection
    Top {
        /// Collection name
        name: String,

        /// Maximum number of members
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Include weighted scores
        #[arg(long, default_value = "false")]
        scores: bool,

        /// Print JSON instead of text
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show the current cycle, positions and weights
    Cycles,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => Config::from_env().context("Failed to load config from environment")?,
    };
    config.validate().context("Invalid configuration")?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::debug!(
        cycle_unit = %config.trend.cycle_unit,
        cycles_count = config.trend.cycles_count,
        key_prefix = ?config.trend.key_prefix,
        "Loaded configuration"
    );

    match cli.command {
        Commands::Record {
            name,
            member,
            count,
        } => {
            let engine = connect(&config).await?;
            engine.record_by(&name, &member, count).await?;
            tracing::info!(name = %name, member = %member, count = count, "Recorded");
        }

        Commands::Top {
            name,
            limit,
            scores,
            json,
        } => {
            let engine = connect(&config).await?;
            let ranked = engine.top_with_scores(&name, Some(limit)).await?;
            print_top(&ranked, scores, json)?;
        }

        Commands::Cycles => cycles(&config)?,
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("redtrend=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_new(format!("redtrend={level},warn"))
            .context("Invalid log level")?
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}

async fn connect(config: &Config) -> Result<TrendEngine> {
    let store = RedisStore::new(&config.redis)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.redis.url))?;
    Ok(TrendEngine::new(config.trend.clone(), Arc::new(store))?)
}

fn print_top(ranked: &[(String, f64)], scores: bool, json: bool) -> Result<()> {
    if json {
        let out = if scores {
            serde_json::to_string_pretty(ranked)?
        } else {
            let members: Vec<&str> = ranked.iter().map(|(m, _)| m.as_str()).collect();
            serde_json::to_string_pretty(&members)?
        };
        println!("{out}");
        return Ok(());
    }

    for (rank, (member, score)) in ranked.iter().enumerate() {
        if scores {
            println!("{:>3}. {member} ({score:.2})", rank + 1);
        } else {
            println!("{:>3}. {member}", rank + 1);
        }
    }
    Ok(())
}

fn cycles(config: &Config) -> Result<()> {
    let schedule = config.trend.schedule()?;
    let now = chrono::Local::now().fixed_offset();

    println!("Cycle unit:     {}", schedule.unit());
    println!("Cycles count:   {}", schedule.cycles_count());
    println!("Window:         {}s", schedule.cycle_interval());
    println!("Current cycle:  {}", schedule.cycle_at(&now));
    println!("Expires in:     {}s", schedule.expire_seconds_at(&now));
    println!("Positions:      {:?}", schedule.positions_at(&now));
    println!("Weights:        {:?}", schedule.weights());
    Ok(())
}
