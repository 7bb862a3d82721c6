//! Folio CLI - replay visitor sessions and inspect what the page learned.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_core::{Clock, EvolutionHistory, InteractionData, ManualClock, SystemClock};
use folio_evolution::EvolutionStats;
use folio_page::Document;
use folio_session::{replay, Script, Session, SessionConfig};
use folio_storage::{load_json, AppContext, JsonStorage, Storage, StorageKeys};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Self-evolving portfolio page engine", long_about = None)]
struct Cli {
    /// Storage directory
    #[arg(long, global = true, default_value = ".folio")]
    storage: PathBuf,

    /// Session configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a timed event script as one visit
    Replay {
        /// Script file (JSON)
        script: PathBuf,
        /// Page to start from instead of the default layout
        #[arg(long)]
        page: Option<PathBuf>,
        /// Print the resulting page as JSON
        #[arg(long)]
        dump_page: bool,
    },
    /// Show interaction and evolution statistics
    Stats,
    /// List recorded evolutions, newest last
    History {
        /// Only the newest N entries
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the default page layout as JSON
    Page,
    /// Forget all stored statistics and history
    Reset,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(SessionConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let mut storage = JsonStorage::new(&cli.storage)
        .await
        .with_context(|| format!("failed to open storage at {}", cli.storage.display()))?;
    debug!(root = %storage.root().display(), "storage opened");

    match cli.command {
        Commands::Replay { script, page, dump_page } => {
            let raw = tokio::fs::read_to_string(&script)
                .await
                .with_context(|| format!("failed to read script {}", script.display()))?;
            let script = Script::parse(&raw).context("invalid script")?;
            let page = match page {
                Some(path) => {
                    let raw = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("failed to read page {}", path.display()))?;
                    Document::from_json(&raw).context("invalid page")?
                }
                None => Document::portfolio(),
            };

            let clock = ManualClock::new(SystemClock.now());
            let ctx = AppContext::with_clock(storage, Arc::new(clock.clone()));
            let mut session = Session::start(ctx, config, page).await?;
            let report = replay(&mut session, &clock, &script).await;
            if !report.closed {
                session.shutdown().await;
            }
            info!(events = report.handled, evolutions = report.evolutions.len(), "replay finished");

            println!("Replayed {} events ({} rejected)", report.handled, report.rejected);
            for evolution in &report.evolutions {
                println!(
                    "  +{:>7}ms  {:<20} {}",
                    evolution.at_ms, evolution.rule, evolution.description
                );
            }
            println!("Engagement score: {:.2}", report.engagement_score);

            if dump_page {
                println!("{}", session.page().to_json()?);
            }
        }
        Commands::Stats => {
            let keys = &config.storage_keys;
            let data: InteractionData = load_json(&storage, &keys.interactions)
                .await
                .or_default_logged(&keys.interactions);
            let history: EvolutionHistory =
                load_json(&storage, &keys.history).await.or_default_logged(&keys.history);
            let stats = EvolutionStats::from_history(&history);

            println!("Visits: {}", data.visit_count);
            if let Some(last) = data.last_visit {
                println!("Last visit: {last}");
            }
            println!("Theme preference: {}", data.theme_preference);
            println!("Scroll depth: {:.1}%", data.scroll_depth);
            println!("Engagement score: {:.2}", data.engagement_score());
            println!("Clicks ({})", data.clicks.total());
            for category in folio_core::ClickCategory::ALL {
                println!("  {:<12} {}", category.as_str(), data.clicks.get(category));
            }
            println!("Dwell time ({:.1}s)", data.total_dwell_seconds());
            for section in folio_core::Section::ALL {
                println!(
                    "  {:<12} {:.1}s, {} views",
                    section.as_str(),
                    data.section_time.get(section) as f64 / 1000.0,
                    data.section_views.get(section)
                );
            }
            println!("Evolutions: {} across {} sessions", stats.total, stats.sessions);
            for (rule, rule_stats) in &stats.by_rule {
                let last = rule_stats
                    .last_applied
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                println!("  {:<20} {:>3}  last {}", rule, rule_stats.applications, last);
            }
            println!("Mean engagement at evolution: {:.2}", stats.mean_engagement);
        }
        Commands::History { limit } => {
            let key = &config.storage_keys.history;
            let history: EvolutionHistory = load_json(&storage, key).await.or_default_logged(key);
            let skip = limit.map_or(0, |n| history.len().saturating_sub(n));

            println!("Evolution history ({})", history.len());
            for entry in history.iter().skip(skip) {
                println!(
                    "  {} | {} | {:<20} | {:>6.2} | {}",
                    entry.timestamp.to_rfc3339(),
                    entry.session,
                    entry.rule,
                    entry.engagement_score,
                    entry.description,
                );
            }
        }
        Commands::Page => {
            println!("{}", Document::portfolio().to_json()?);
        }
        Commands::Reset => {
            let StorageKeys { interactions, history } = &config.storage_keys;
            for key in [interactions, history] {
                storage.remove(key).await?;
            }
            println!("Cleared {} and {}", interactions, history);
        }
    }

    Ok(())
}
