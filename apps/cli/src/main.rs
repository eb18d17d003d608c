#![deny(warnings)]

//! Headless CLI for running a bot session against the simulated page.
//!
//! Wiring a real browser means implementing `bot_runtime::PageAutomation`
//! over a webdriver; the CLI itself only needs the seam.

use anyhow::{Context, Result};
use bot_advisor::{Advisor, AdvisorConfig};
use bot_runtime::{format_elapsed, PageSelectors, RuntimeOptions, Session, SimulatedPage};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

/// Full bot configuration; every section falls back to its defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BotConfig {
    advisor: AdvisorConfig,
    selectors: PageSelectors,
    runtime: RuntimeOptions,
}

struct Args {
    runtime_secs: Option<u64>,
    port: u16,
    game_dir: Option<String>,
    seed: u64,
    config: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        runtime_secs: None,
        port: 8000,
        game_dir: None,
        seed: 42,
        config: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--runtime" => args.runtime_secs = it.next().and_then(|s| s.parse().ok()),
            "--port" => {
                if let Some(p) = it.next().and_then(|s| s.parse().ok()) {
                    args.port = p;
                }
            }
            "--game-dir" => args.game_dir = it.next(),
            "--seed" => {
                if let Some(s) = it.next().and_then(|s| s.parse().ok()) {
                    args.seed = s;
                }
            }
            "--config" => args.config = it.next(),
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&str>) -> Result<BotConfig> {
    let Some(path) = path else {
        return Ok(BotConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(secs) = args.runtime_secs {
        config.runtime.runtime_secs = secs;
    }

    let rule = "=".repeat(60);
    println!("{rule}");
    println!(
        "clicker-bot v{} ({}) | started {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA"),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    );
    println!(
        "runtime: {} | clicks per tick: {} | seed: {}",
        if config.runtime.runtime_secs == 0 {
            "unlimited".to_string()
        } else {
            format!("{}s", config.runtime.runtime_secs)
        },
        config.runtime.click_batch,
        args.seed,
    );
    println!("{rule}");

    if let Some(dir) = &args.game_dir {
        let addr = format!("127.0.0.1:{}", args.port)
            .parse()
            .context("bad host address")?;
        let server = bot_server::spawn(addr, dir)
            .with_context(|| format!("hosting game assets from {dir}"))?;
        info!(url = %server.url(), "game assets hosted");
    }

    let page = SimulatedPage::new(args.seed);
    let session = Session::new(
        page,
        Advisor::new(config.advisor),
        config.selectors,
        config.runtime,
    );
    info!("starting session");
    let summary = session.run().context("session ended abnormally")?;

    println!("{rule}");
    println!("SESSION COMPLETE");
    println!("{rule}");
    println!("time played:     {}", format_elapsed(summary.elapsed_secs));
    println!("stock:           {:.0}", summary.stock);
    println!("rate:            {:.1}/s", summary.rate);
    println!("buildings:       {}", summary.stats.buildings_bought);
    println!("upgrades:        {}", summary.stats.upgrades_bought);
    println!("golden events:   {}", summary.stats.golden_popped);
    println!("manual clicks:   {}", summary.stats.clicks);
    println!(
        "last purchase:   {}",
        summary.stats.last_purchase.as_deref().unwrap_or("nothing")
    );
    println!("{rule}");

    Ok(())
}
