use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use crash_radar_lib::core::orchestrator::IndicatorHistory;
use crash_radar_lib::indicators::FormatKind;
use crash_radar_lib::{open_radar, BootstrapConfig, Catalog, PeriodWindow, Radar, Snapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "radar")]
#[command(about = "Macro and valuation crash-risk composite", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the current readings
    Score {
        /// Provider cache JSON
        #[arg(long, env = "RADAR_CACHE", default_value = "data/fred_cache.json")]
        cache: PathBuf,

        /// Manual inputs JSON (LEI, valuations)
        #[arg(long, env = "RADAR_MANUAL")]
        manual: Option<PathBuf>,

        /// Catalog JSON (defaults to the built-in catalog)
        #[arg(long, env = "RADAR_CATALOG")]
        catalog: Option<PathBuf>,

        /// Bootstrap rounds for the uncertainty band
        #[arg(long)]
        bootstrap: Option<usize>,

        /// Seed for the bootstrap
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show an indicator's derived history and change statistics
    History {
        /// Indicator key, or "all" for every provider-backed indicator
        #[arg(short, long)]
        key: String,

        /// Window: 3M, 6M, 12M, 5Y or MAX
        #[arg(short, long, default_value = "12M")]
        period: PeriodWindow,

        /// Provider cache JSON
        #[arg(long, env = "RADAR_CACHE", default_value = "data/fred_cache.json")]
        cache: PathBuf,

        /// Catalog JSON (defaults to the built-in catalog)
        #[arg(long, env = "RADAR_CATALOG")]
        catalog: Option<PathBuf>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in catalog as JSON
    Catalog,
}

fn load_catalog(path: Option<&Path>) -> Result<Arc<Catalog>> {
    let catalog = match path {
        Some(path) => Catalog::load(path).with_context(|| format!("catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };
    Ok(Arc::new(catalog))
}

fn print_snapshot(snap: &Snapshot) {
    println!("Composite stress: {}", FormatKind::Plain0.format(snap.composite.score));
    if let Some(regime) = snap.regime {
        println!("Regime:           {}", regime.label());
    }
    println!("Recession risk:   {}", snap.recession_risk.unwrap_or("--"));
    println!("Valuation risk:   {}", snap.valuation_risk.map(|r| r.label()).unwrap_or("--"));
    println!("Labor stress:     {}", snap.labor_stress.map(|r| r.label()).unwrap_or("--"));
    println!(
        "Blocks:           macro {} / valuation {}",
        FormatKind::Plain1.format(snap.composite.macro_block.score),
        FormatKind::Plain1.format(snap.composite.valuation_block.score)
    );
    if let Some(band) = snap.bootstrap {
        println!("Bootstrap p5-p95: {:.1} - {:.1} ({} rounds)", band.p5, band.p95, band.rounds);
    }
    println!(
        "Inputs:           {}/{} populated, cache {}",
        snap.audit.coverage.used,
        snap.audit.coverage.total,
        snap.audit.freshness.label()
    );

    println!("\n{:<24} | {:>10} | {:>7} | {:<7} | {:<12}", "Indicator", "Value", "Stress", "Verdict", "As of");
    println!("{}", "-".repeat(72));
    for r in &snap.readings {
        println!(
            "{:<24} | {:>10} | {:>7} | {:<7} | {:<12}",
            r.key,
            r.display,
            FormatKind::Plain0.format(r.stress),
            r.verdict.map(|v| v.label()).unwrap_or("--"),
            r.as_of.as_deref().unwrap_or("-")
        );
    }

    if !snap.contributions.is_empty() {
        println!("\nTop contributions:");
        for c in snap.contributions.iter().take(5) {
            println!("  {:<24} {:>5.1} pts ({:.0}%)", c.label, c.points, c.share_pct);
        }
    }
    println!("\n{}", snap.alert.message);
}

fn print_history(history: &IndicatorHistory, full: bool) {
    let stats = history.stats;
    let change = |v: Option<f64>| FormatKind::Pct1.format(v);
    println!(
        "{:<24} | {:>10} | {:>8} | {:>8} | {:>8}",
        history.key,
        FormatKind::Plain2.format(stats.map(|s| s.current)),
        change(stats.and_then(|s| s.change_pct.m3)),
        change(stats.and_then(|s| s.change_pct.m6)),
        change(stats.and_then(|s| s.change_pct.m12)),
    );
    if full {
        println!("\n{} ({} points, {})", history.label, history.series.len(), history.window);
        for dp in &history.series {
            println!("  {}  {:.3}", dp.date, dp.value);
        }
    }
}

fn history_header() {
    println!("{:<24} | {:>10} | {:>8} | {:>8} | {:>8}", "Indicator", "Current", "3M", "6M", "12M");
    println!("{}", "-".repeat(70));
}

async fn all_histories(radar: Arc<Radar>, window: PeriodWindow) -> Result<Vec<IndicatorHistory>> {
    let handles: Vec<_> = radar
        .history_keys()
        .into_iter()
        .map(|key| {
            let radar = Arc::clone(&radar);
            tokio::task::spawn_blocking(move || radar.indicator_history(&key, window))
        })
        .collect();

    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Some(history) = handle.await.context("history task panicked")? {
            out.push(history);
        }
    }
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score { cache, manual, catalog, bootstrap, seed, json } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let radar = open_radar(catalog, &cache, manual.as_deref()).await?;
            let snap = radar.snapshot(bootstrap.map(|rounds| BootstrapConfig { rounds, seed }));

            if json {
                println!("{}", serde_json::to_string_pretty(&snap)?);
            } else {
                print_snapshot(&snap);
            }
        }
        Commands::History { key, period, cache, catalog, json } => {
            let catalog = load_catalog(catalog.as_deref())?;
            let radar = Arc::new(open_radar(catalog, &cache, None).await?);

            let histories = if key.eq_ignore_ascii_case("all") {
                all_histories(Arc::clone(&radar), period).await?
            } else {
                let history = radar
                    .indicator_history(&key, period)
                    .ok_or_else(|| anyhow!("'{}' is not a provider-backed indicator in the catalog", key))?;
                vec![history]
            };
            info!(count = histories.len(), window = %period, "history computed");

            if json {
                println!("{}", serde_json::to_string_pretty(&histories)?);
            } else {
                let full = histories.len() == 1;
                history_header();
                for history in &histories {
                    if history.stats.is_none() {
                        warn!(key = %history.key, "insufficient history");
                    }
                    print_history(history, full);
                }
            }
        }
        Commands::Catalog => {
            println!("{}", serde_json::to_string_pretty(&Catalog::builtin())?);
        }
    }
    Ok(())
}
