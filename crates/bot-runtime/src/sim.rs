//! Deterministic in-memory page used for headless runs and tests.
//!
//! `SimulatedPage` models just enough of the game to exercise the loop: a
//! clickable that earns stock, a progressive building catalog with 15%
//! price growth, unlockable upgrades, and seeded golden-event shimmers.
//! Time advances by a fixed step on every stock read, so a run with the
//! same seed and options is reproducible.

use std::cell::RefCell;

use bot_core::PageError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::page::{ElementHandle, PageAutomation};
use crate::reader::PageSelectors;

/// Price multiplier applied after each building purchase.
const PRICE_GROWTH: f64 = 1.15;

/// Flat bonus added on top of one minute of production when a shimmer pops.
const SHIMMER_FLAT_BONUS: f64 = 13.0;

#[derive(Clone, Debug)]
enum UpgradeEffect {
    /// Multiply manual click power.
    ClickMul(f64),
    /// Multiply all passive production.
    ProductionMul(f64),
    /// Raise the per-read chance of a shimmer appearing.
    ShimmerChance(f64),
}

#[derive(Clone, Debug)]
struct SimBuilding {
    name: String,
    price: f64,
    owned: u32,
    base_rate: f64,
}

#[derive(Clone, Debug)]
struct SimUpgrade {
    name: String,
    desc: String,
    price: f64,
    /// Becomes visible once total earnings reach this threshold.
    unlock_at: f64,
    bought: bool,
    effect: UpgradeEffect,
}

#[derive(Debug)]
struct SimState {
    stock: f64,
    total_earned: f64,
    click_power: f64,
    production_mul: f64,
    shimmer_chance: f64,
    shimmer: bool,
    buildings: Vec<SimBuilding>,
    upgrades: Vec<SimUpgrade>,
    rng: ChaCha8Rng,
    alive: bool,
}

impl SimState {
    fn rate(&self) -> f64 {
        self.production_mul
            * self
                .buildings
                .iter()
                .map(|b| f64::from(b.owned) * b.base_rate)
                .sum::<f64>()
    }

    fn unit_rate(&self, b: &SimBuilding) -> f64 {
        b.base_rate * self.production_mul
    }

    fn building_visible(&self, index: usize) -> bool {
        index == 0
            || self
                .buildings
                .get(index - 1)
                .is_some_and(|prev| prev.owned > 0)
    }

    fn upgrade_visible(&self, index: usize) -> bool {
        self.upgrades
            .get(index)
            .is_some_and(|u| !u.bought && self.total_earned >= u.unlock_at)
    }

    fn earn(&mut self, amount: f64) {
        self.stock += amount;
        self.total_earned += amount;
    }

    /// One fixed time step: passive income plus a chance of a shimmer.
    fn advance(&mut self, dt_secs: f64) {
        let gained = self.rate() * dt_secs;
        self.earn(gained);
        if !self.shimmer && self.rng.gen_bool(self.shimmer_chance) {
            self.shimmer = true;
        }
    }
}

/// In-memory [`PageAutomation`] implementation.
pub struct SimulatedPage {
    selectors: PageSelectors,
    dt_secs: f64,
    state: RefCell<SimState>,
}

impl SimulatedPage {
    /// Fresh game with the default catalog and selectors.
    pub fn new(seed: u64) -> Self {
        let building = |name: &str, price: f64, base_rate: f64| SimBuilding {
            name: name.to_string(),
            price,
            owned: 0,
            base_rate,
        };
        let upgrade = |name: &str, desc: &str, price: f64, unlock_at: f64, effect| SimUpgrade {
            name: name.to_string(),
            desc: desc.to_string(),
            price,
            unlock_at,
            bought: false,
            effect,
        };
        let state = SimState {
            stock: 0.0,
            total_earned: 0.0,
            click_power: 1.0,
            production_mul: 1.0,
            shimmer_chance: 0.002,
            shimmer: false,
            buildings: vec![
                building("Cursor", 15.0, 0.1),
                building("Grandma", 100.0, 1.0),
                building("Farm", 1_100.0, 8.0),
                building("Mine", 12_000.0, 47.0),
                building("Factory", 130_000.0, 260.0),
            ],
            upgrades: vec![
                upgrade(
                    "Reinforced index finger",
                    "the mouse and cursors are twice as efficient",
                    100.0,
                    50.0,
                    UpgradeEffect::ClickMul(2.0),
                ),
                upgrade(
                    "Forwards from grandma",
                    "grandmas are twice as efficient",
                    1_000.0,
                    500.0,
                    UpgradeEffect::ProductionMul(1.5),
                ),
                upgrade(
                    "Lucky day",
                    "golden cookies appear twice as often",
                    7_777.0,
                    3_000.0,
                    UpgradeEffect::ShimmerChance(0.004),
                ),
                upgrade(
                    "Plastic mouse",
                    "clicking gains +1% of your cookie production",
                    50_000.0,
                    20_000.0,
                    UpgradeEffect::ClickMul(1.5),
                ),
            ],
            rng: ChaCha8Rng::seed_from_u64(seed),
            alive: true,
        };
        Self {
            selectors: PageSelectors::default(),
            dt_secs: 0.1,
            state: RefCell::new(state),
        }
    }

    /// Override the time step applied per stock read.
    pub fn with_dt(mut self, dt_secs: f64) -> Self {
        self.dt_secs = dt_secs;
        self
    }

    /// Start with some stock already banked.
    pub fn with_stock(self, stock: f64) -> Self {
        {
            let mut s = self.state.borrow_mut();
            s.stock = stock;
            s.total_earned = stock;
        }
        self
    }

    /// Drop the session; every later call fails with `SessionLost`.
    pub fn kill_session(&mut self) {
        self.state.get_mut().alive = false;
    }

    pub fn stock(&self) -> f64 {
        self.state.borrow().stock
    }

    pub fn rate(&self) -> f64 {
        self.state.borrow().rate()
    }

    pub fn buildings_owned(&self) -> u32 {
        self.state.borrow().buildings.iter().map(|b| b.owned).sum()
    }

    fn check_alive(&self) -> Result<(), PageError> {
        if self.state.borrow().alive {
            Ok(())
        } else {
            Err(PageError::SessionLost("simulated page closed".to_string()))
        }
    }

    fn child_text(&self, dom_id: &str, child: &str) -> Result<String, PageError> {
        let state = self.state.borrow();
        let missing = || PageError::NotFound(format!("#{dom_id} {child}"));

        if let Some(index) = dom_id.strip_prefix("product") {
            let index: usize = index.parse().map_err(|_| missing())?;
            if !state.building_visible(index) {
                return Err(missing());
            }
            let b = state.buildings.get(index).ok_or_else(missing)?;
            return if child == self.selectors.title_child {
                Ok(b.name.clone())
            } else if child == self.selectors.price_child {
                Ok(format!("{:.3}", b.price))
            } else if child == self.selectors.owned_child {
                Ok(b.owned.to_string())
            } else if child == self.selectors.rate_child {
                Ok(format!("{:.3}", state.unit_rate(b)))
            } else {
                Err(missing())
            };
        }

        if let Some(index) = dom_id.strip_prefix("upgrade") {
            let index: usize = index.parse().map_err(|_| missing())?;
            if !state.upgrade_visible(index) {
                return Err(missing());
            }
            let u = state.upgrades.get(index).ok_or_else(missing)?;
            return if child == self.selectors.title_child {
                Ok(u.name.clone())
            } else if child == self.selectors.price_child {
                Ok(format!("{:.3}", u.price))
            } else if child == self.selectors.desc_child {
                Ok(u.desc.clone())
            } else if child == self.selectors.tie_child {
                // Grandma-tied upgrade mirrors the game's buildingTie field.
                Ok(match &u.effect {
                    UpgradeEffect::ProductionMul(_) => "Grandma".to_string(),
                    _ => String::new(),
                })
            } else {
                Err(missing())
            };
        }

        Err(missing())
    }
}

impl PageAutomation for SimulatedPage {
    fn read_text(&self, selector: &str) -> Result<String, PageError> {
        self.check_alive()?;
        if selector == self.selectors.stock {
            let mut state = self.state.borrow_mut();
            state.advance(self.dt_secs);
            return Ok(format!("{:.1} cookies", state.stock));
        }
        if selector == self.selectors.rate {
            return Ok(format!("per second: {:.1}", self.state.borrow().rate()));
        }
        if let Some(scoped) = selector.strip_prefix('#') {
            if let Some((dom_id, child)) = scoped.split_once(' ') {
                return self.child_text(dom_id, child);
            }
        }
        Err(PageError::NotFound(selector.to_string()))
    }

    fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        self.check_alive()?;
        let state = self.state.borrow();
        if selector == self.selectors.buildings {
            let handles = (0..state.buildings.len())
                .filter(|&i| state.building_visible(i))
                .map(|i| ElementHandle::new(format!("product{i}")))
                .collect();
            return Ok(handles);
        }
        if selector == self.selectors.upgrades {
            let handles = (0..state.upgrades.len())
                .filter(|&i| state.upgrade_visible(i))
                .map(|i| ElementHandle::new(format!("upgrade{i}")))
                .collect();
            return Ok(handles);
        }
        if selector == self.selectors.shimmers {
            return Ok(if state.shimmer {
                vec![ElementHandle::new("shimmer0")]
            } else {
                vec![]
            });
        }
        Err(PageError::NotFound(selector.to_string()))
    }

    fn click(&mut self, handle: &ElementHandle) -> Result<bool, PageError> {
        self.check_alive()?;
        let big_clickable = self.selectors.big_clickable.clone();
        let state = self.state.get_mut();
        let dom_id = handle.dom_id();

        if dom_id == big_clickable {
            let power = state.click_power;
            state.earn(power);
            return Ok(true);
        }
        if dom_id == "shimmer0" {
            if !state.shimmer {
                return Err(PageError::Stale(handle.selector()));
            }
            state.shimmer = false;
            let bonus = state.rate() * 60.0 + SHIMMER_FLAT_BONUS;
            state.earn(bonus);
            return Ok(true);
        }
        if let Some(index) = dom_id.strip_prefix("product") {
            let index: usize = index
                .parse()
                .map_err(|_| PageError::Stale(handle.selector()))?;
            if !state.building_visible(index) || index >= state.buildings.len() {
                return Err(PageError::Stale(handle.selector()));
            }
            let price = state.buildings[index].price;
            if state.stock < price {
                return Ok(false);
            }
            state.stock -= price;
            let b = &mut state.buildings[index];
            b.owned += 1;
            b.price *= PRICE_GROWTH;
            return Ok(true);
        }
        if let Some(index) = dom_id.strip_prefix("upgrade") {
            let index: usize = index
                .parse()
                .map_err(|_| PageError::Stale(handle.selector()))?;
            if !state.upgrade_visible(index) {
                return Err(PageError::Stale(handle.selector()));
            }
            let price = state.upgrades[index].price;
            if state.stock < price {
                return Ok(false);
            }
            state.stock -= price;
            state.upgrades[index].bought = true;
            match state.upgrades[index].effect.clone() {
                UpgradeEffect::ClickMul(m) => state.click_power *= m,
                UpgradeEffect::ProductionMul(m) => state.production_mul *= m,
                UpgradeEffect::ShimmerChance(c) => state.shimmer_chance = c,
            }
            return Ok(true);
        }
        Err(PageError::Stale(handle.selector()))
    }

    fn is_affordable(&self, handle: &ElementHandle) -> Result<bool, PageError> {
        self.check_alive()?;
        let state = self.state.borrow();
        let dom_id = handle.dom_id();
        if let Some(index) = dom_id.strip_prefix("product") {
            let index: usize = index
                .parse()
                .map_err(|_| PageError::Stale(handle.selector()))?;
            if !state.building_visible(index) || index >= state.buildings.len() {
                return Err(PageError::NotFound(handle.selector()));
            }
            return Ok(state.stock >= state.buildings[index].price);
        }
        if let Some(index) = dom_id.strip_prefix("upgrade") {
            let index: usize = index
                .parse()
                .map_err(|_| PageError::Stale(handle.selector()))?;
            if !state.upgrade_visible(index) {
                return Err(PageError::NotFound(handle.selector()));
            }
            return Ok(state.stock >= state.upgrades[index].price);
        }
        Err(PageError::NotFound(handle.selector()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::SnapshotReader;
    use bot_core::validate_snapshot;

    #[test]
    fn capture_sees_only_the_lowest_tier_at_start() {
        let page = SimulatedPage::new(1).with_stock(20.0);
        let reader = SnapshotReader::default();
        let snap = reader.capture(&page).unwrap();
        validate_snapshot(&snap).unwrap();
        assert_eq!(snap.buildings.len(), 1);
        let first = snap.lowest_tier().unwrap();
        assert_eq!(first.name, "Cursor");
        assert_eq!(first.owned, 0);
        assert!(first.can_buy);
        assert!((first.price - 15.0).abs() < 1e-9);
    }

    #[test]
    fn buying_a_building_raises_price_and_rate() {
        let mut page = SimulatedPage::new(1).with_stock(20.0);
        let cursor = ElementHandle::new("product0");
        assert_eq!(page.click(&cursor), Ok(true));
        assert!((page.rate() - 0.1).abs() < 1e-9);
        assert_eq!(page.buildings_owned(), 1);
        // Next unit costs 15 * 1.15.
        let reader = SnapshotReader::default();
        let snap = reader.capture(&page).unwrap();
        assert!((snap.lowest_tier().unwrap().price - 17.25).abs() < 1e-6);
    }

    #[test]
    fn click_without_stock_does_not_register() {
        let mut page = SimulatedPage::new(1);
        let cursor = ElementHandle::new("product0");
        assert_eq!(page.click(&cursor), Ok(false));
        assert_eq!(page.buildings_owned(), 0);
    }

    #[test]
    fn stock_accrues_on_reads_once_production_exists() {
        let mut page = SimulatedPage::new(1).with_stock(20.0).with_dt(1.0);
        page.click(&ElementHandle::new("product0")).unwrap();
        let before = page.stock();
        let reader = SnapshotReader::default();
        let snap = reader.capture(&page).unwrap();
        assert!(snap.stock > before);
    }

    #[test]
    fn upgrades_unlock_with_earnings() {
        let page = SimulatedPage::new(1).with_stock(120.0);
        let reader = SnapshotReader::default();
        let snap = reader.capture(&page).unwrap();
        assert_eq!(snap.upgrades.len(), 1);
        assert_eq!(snap.upgrades[0].name, "Reinforced index finger");
        assert!(snap.upgrades[0].can_buy);
    }

    #[test]
    fn production_upgrade_carries_building_tie() {
        let mut page = SimulatedPage::new(1).with_stock(1_200.0);
        // Make grandma visible so the catalog grows, then capture.
        page.click(&ElementHandle::new("product0")).unwrap();
        let reader = SnapshotReader::default();
        let snap = reader.capture(&page).unwrap();
        let tied = snap
            .upgrades
            .iter()
            .find(|u| u.name == "Forwards from grandma")
            .unwrap();
        assert_eq!(tied.building_tie.as_deref(), Some("Grandma"));
    }

    #[test]
    fn killed_session_is_fatal_everywhere() {
        let mut page = SimulatedPage::new(1);
        page.kill_session();
        let err = page.read_text("#cookies").unwrap_err();
        assert!(err.is_fatal());
        let err = page.find_all("#products .product").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed: u64| {
            let mut page = SimulatedPage::new(seed).with_stock(20.0).with_dt(0.5);
            page.click(&ElementHandle::new("product0")).unwrap();
            for _ in 0..200 {
                let _ = page.read_text("#cookies");
            }
            page.stock()
        };
        assert_eq!(run(7), run(7));
    }
}
