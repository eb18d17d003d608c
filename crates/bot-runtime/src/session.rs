//! The synchronous decision loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bot_advisor::Advisor;
use bot_core::{validate_snapshot, GameSnapshot, PageError, PurchaseDecision, TickStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::page::{ElementHandle, PageAutomation};
use crate::reader::{PageSelectors, SnapshotReader};

/// Loop pacing and stop conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuntimeOptions {
    /// Wall-clock limit in seconds; 0 runs until stopped.
    pub runtime_secs: u64,
    /// Tick-count limit for headless runs; 0 means no limit.
    pub max_ticks: u64,
    /// Clicks issued on the main clickable per tick.
    pub click_batch: u32,
    /// Minimum seconds between purchase evaluations.
    pub buy_interval_secs: f64,
    /// Seconds between status lines.
    pub status_interval_secs: u64,
    /// Sleep between ticks, in milliseconds.
    pub tick_delay_ms: u64,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            runtime_secs: 3600,
            max_ticks: 0,
            click_batch: 15,
            buy_interval_secs: 0.3,
            status_interval_secs: 10,
            tick_delay_ms: 50,
        }
    }
}

/// Final numbers reported when the loop ends.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub elapsed_secs: u64,
    /// Stock at the last valid snapshot.
    pub stock: f64,
    /// Production rate at the last valid snapshot.
    pub rate: f64,
    pub stats: TickStats,
}

/// One bot session against a page.
///
/// Owns the page for the duration of the run. Each tick: click, pop
/// shimmers, capture a snapshot, decide, execute. A rejected purchase is a
/// no-op for the tick; only a lost session ends the loop early.
pub struct Session<P: PageAutomation> {
    page: P,
    advisor: Advisor,
    reader: SnapshotReader,
    opts: RuntimeOptions,
    stop: Arc<AtomicBool>,
    stats: TickStats,
}

impl<P: PageAutomation> Session<P> {
    pub fn new(page: P, advisor: Advisor, selectors: PageSelectors, opts: RuntimeOptions) -> Self {
        Self {
            page,
            advisor,
            reader: SnapshotReader::new(selectors),
            opts,
            stop: Arc::new(AtomicBool::new(false)),
            stats: TickStats::default(),
        }
    }

    /// Flag that ends the loop after its current tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run ticks until a stop condition fires or the session is lost.
    pub fn run(mut self) -> Result<SessionSummary, PageError> {
        let start = Instant::now();
        let big = ElementHandle::new(self.reader.selectors().big_clickable.clone());
        let shimmer_selector = self.reader.selectors().shimmers.clone();
        let mut last_buy: Option<Instant> = None;
        let mut last_status = start;
        let mut last_saving_log: Option<Instant> = None;
        let mut last_stock = 0.0;
        let mut last_rate = 0.0;

        loop {
            if self.stop.load(Ordering::Relaxed) {
                info!("stop requested, ending after current tick");
                break;
            }
            if self.opts.runtime_secs > 0 && start.elapsed().as_secs() >= self.opts.runtime_secs {
                break;
            }
            if self.opts.max_ticks > 0 && self.stats.ticks >= self.opts.max_ticks {
                break;
            }

            self.click_main(&big)?;
            self.pop_shimmers(&shimmer_selector)?;

            let snapshot = self.reader.capture(&self.page)?;
            match validate_snapshot(&snapshot) {
                Err(e) => warn!(error = %e, "snapshot failed validation, tick skipped"),
                Ok(()) => {
                    last_stock = snapshot.stock;
                    last_rate = snapshot.rate;
                    let due = last_buy
                        .map_or(true, |t| t.elapsed().as_secs_f64() >= self.opts.buy_interval_secs);
                    if due {
                        last_buy = Some(Instant::now());
                        let decision = self.advisor.decide(&snapshot);
                        self.execute(&snapshot, &decision, &mut last_saving_log)?;
                    }
                }
            }

            if last_status.elapsed().as_secs() >= self.opts.status_interval_secs {
                last_status = Instant::now();
                info!(
                    "[{}] stock: {:.0} | rate: {:.1} | buildings: {} | upgrades: {} | last: {}",
                    format_elapsed(start.elapsed().as_secs()),
                    last_stock,
                    last_rate,
                    self.stats.buildings_bought,
                    self.stats.upgrades_bought,
                    self.stats.last_purchase.as_deref().unwrap_or("nothing yet"),
                );
            }

            self.stats.ticks += 1;
            if self.opts.tick_delay_ms > 0 {
                std::thread::sleep(Duration::from_millis(self.opts.tick_delay_ms));
            }
        }

        Ok(SessionSummary {
            elapsed_secs: start.elapsed().as_secs(),
            stock: last_stock,
            rate: last_rate,
            stats: self.stats,
        })
    }

    fn click_main(&mut self, big: &ElementHandle) -> Result<(), PageError> {
        for _ in 0..self.opts.click_batch {
            match self.page.click(big) {
                Ok(true) => self.stats.clicks += 1,
                Ok(false) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    debug!(error = %e, "main clickable unavailable this tick");
                    break;
                }
            }
        }
        Ok(())
    }

    fn pop_shimmers(&mut self, selector: &str) -> Result<(), PageError> {
        let handles = match self.page.find_all(selector) {
            Ok(handles) => handles,
            Err(e) if e.is_fatal() => return Err(e),
            Err(_) => return Ok(()),
        };
        for handle in handles {
            match self.page.click(&handle) {
                Ok(true) => {
                    self.stats.golden_popped += 1;
                    info!("golden event popped");
                }
                Ok(false) => {}
                Err(e) if e.is_fatal() => return Err(e),
                // Shimmers expire on their own; a stale one is no loss.
                Err(_) => {}
            }
        }
        Ok(())
    }

    fn execute(
        &mut self,
        snapshot: &GameSnapshot,
        decision: &PurchaseDecision,
        last_saving_log: &mut Option<Instant>,
    ) -> Result<(), PageError> {
        if let Some(u) = &decision.upgrade {
            let handle = ElementHandle::new(format!("upgrade{}", u.id.0));
            match self.page.click(&handle) {
                Ok(true) => {
                    self.stats.upgrades_bought += 1;
                    let line = format!("{} {} ({:.0})", u.category.tag(), u.name, u.price);
                    info!("bought upgrade {line}");
                    self.stats.last_purchase = Some(line);
                }
                Ok(false) => debug!(name = %u.name, "upgrade purchase did not register"),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(name = %u.name, error = %e, "upgrade lookup failed, skipped"),
            }
        }

        if let Some(b) = &decision.building {
            let handle = ElementHandle::new(format!("product{}", b.id.0));
            match self.page.click(&handle) {
                Ok(true) => {
                    self.stats.buildings_bought += 1;
                    let line = format!(
                        "{} ({:.0}, payback: {:.0}s)",
                        b.name, b.price, b.payback_secs
                    );
                    info!("bought building {line}");
                    self.stats.last_purchase = Some(line);
                }
                Ok(false) => debug!(name = %b.name, "building purchase did not register"),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!(name = %b.name, error = %e, "building lookup failed, skipped"),
            }
        } else if let Some(first) = snapshot.lowest_tier() {
            // Bootstrap progress, throttled so it does not flood the log.
            if first.owned == 0 && first.price > snapshot.stock {
                let due = last_saving_log.map_or(true, |t| t.elapsed().as_secs() >= 5);
                if due {
                    *last_saving_log = Some(Instant::now());
                    info!(
                        "saving for first {}: {:.0}/{:.0}",
                        first.name, snapshot.stock, first.price
                    );
                }
            }
        }
        Ok(())
    }
}

/// Elapsed seconds as `5m30s`, or `1h05m` past the first hour.
pub fn format_elapsed(secs: u64) -> String {
    let (mins, secs) = (secs / 60, secs % 60);
    let (hours, mins) = (mins / 60, mins % 60);
    if hours > 0 {
        format!("{hours}h{mins:02}m")
    } else {
        format!("{mins}m{secs:02}s")
    }
}
