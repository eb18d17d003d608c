//! Snapshot capture: turns page reads into a validated [`GameSnapshot`].

use bot_core::{Building, BuildingId, GameSnapshot, PageError, Upgrade, UpgradeId};
use bot_parse::parse_quantity;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::page::{ElementHandle, PageAutomation};

/// Selectors addressing the game's DOM. The defaults match the stock page
/// layout; a reskinned game can override them through the config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageSelectors {
    /// Element showing the current stock.
    pub stock: String,
    /// Element showing the current production rate.
    pub rate: String,
    /// DOM id of the main clickable.
    pub big_clickable: String,
    /// Golden-event shimmers.
    pub shimmers: String,
    /// Visible building entries, affordable or not; the bootstrap rule
    /// needs to see the lowest tier even while saving for it.
    pub buildings: String,
    /// Visible upgrade entries.
    pub upgrades: String,
    pub title_child: String,
    pub price_child: String,
    /// Per-unit production contribution of a building.
    pub rate_child: String,
    pub owned_child: String,
    pub desc_child: String,
    /// Name of the building an upgrade is tied to, when the game exposes it.
    pub tie_child: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            stock: "#cookies".to_string(),
            rate: "#cookiesPerSecond".to_string(),
            big_clickable: "bigCookie".to_string(),
            shimmers: ".shimmer".to_string(),
            buildings: "#products .product".to_string(),
            upgrades: "#upgrades .upgrade".to_string(),
            title_child: ".title".to_string(),
            price_child: ".price".to_string(),
            rate_child: ".rate".to_string(),
            owned_child: ".owned".to_string(),
            desc_child: ".desc".to_string(),
            tie_child: ".tie".to_string(),
        }
    }
}

/// Reads a fresh [`GameSnapshot`] off the page each tick.
///
/// Per-item lookup failures are recoverable: the affected entry is skipped
/// for this capture and the next tick re-reads everything. Only
/// [`PageError::SessionLost`] propagates.
#[derive(Clone, Debug, Default)]
pub struct SnapshotReader {
    selectors: PageSelectors,
}

impl SnapshotReader {
    pub fn new(selectors: PageSelectors) -> Self {
        Self { selectors }
    }

    pub fn selectors(&self) -> &PageSelectors {
        &self.selectors
    }

    /// Capture the current game state.
    pub fn capture<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
    ) -> Result<GameSnapshot, PageError> {
        let stock = self.read_quantity(page, &self.selectors.stock)?;
        let rate = self.read_quantity(page, &self.selectors.rate)?;
        let buildings = self.capture_buildings(page)?;
        let upgrades = self.capture_upgrades(page)?;
        Ok(GameSnapshot {
            stock,
            rate,
            upgrades,
            buildings,
        })
    }

    fn capture_buildings<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
    ) -> Result<Vec<Building>, PageError> {
        let handles = self.query(page, &self.selectors.buildings)?;
        let mut out = Vec::with_capacity(handles.len());
        for handle in &handles {
            let Some(id) = trailing_digits(handle.dom_id()) else {
                debug!(dom_id = handle.dom_id(), "building without numeric id, skipped");
                continue;
            };
            let price =
                self.read_quantity(page, &handle.child_selector(&self.selectors.price_child))?;
            if price <= 0.0 {
                continue;
            }
            let Some(name) = self.read_optional(page, &handle.child_selector(&self.selectors.title_child))?
            else {
                continue;
            };
            let owned =
                self.read_quantity(page, &handle.child_selector(&self.selectors.owned_child))?;
            let unit_rate =
                self.read_quantity(page, &handle.child_selector(&self.selectors.rate_child))?;
            out.push(Building {
                id: BuildingId(id),
                name,
                price,
                owned: owned as u32,
                unit_rate,
                can_buy: self.affordable(page, handle)?,
            });
        }
        Ok(out)
    }

    fn capture_upgrades<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
    ) -> Result<Vec<Upgrade>, PageError> {
        let handles = self.query(page, &self.selectors.upgrades)?;
        let mut out = Vec::with_capacity(handles.len());
        for handle in &handles {
            let Some(id) = trailing_digits(handle.dom_id()) else {
                debug!(dom_id = handle.dom_id(), "upgrade without numeric id, skipped");
                continue;
            };
            let price =
                self.read_quantity(page, &handle.child_selector(&self.selectors.price_child))?;
            if price <= 0.0 {
                continue;
            }
            let Some(name) = self.read_optional(page, &handle.child_selector(&self.selectors.title_child))?
            else {
                continue;
            };
            let desc = self
                .read_optional(page, &handle.child_selector(&self.selectors.desc_child))?
                .unwrap_or_default();
            let building_tie =
                self.read_optional(page, &handle.child_selector(&self.selectors.tie_child))?;
            out.push(Upgrade {
                id: UpgradeId(id),
                name,
                desc,
                price,
                can_buy: self.affordable(page, handle)?,
                building_tie,
            });
        }
        Ok(out)
    }

    /// Text read parsed as a quantity; missing elements read as zero.
    fn read_quantity<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
        selector: &str,
    ) -> Result<f64, PageError> {
        match page.read_text(selector) {
            Ok(text) => Ok(parse_quantity(&text)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(selector, error = %e, "quantity read failed, using 0");
                Ok(0.0)
            }
        }
    }

    /// Text read where absence or blank content means "skip this item".
    fn read_optional<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
        selector: &str,
    ) -> Result<Option<String>, PageError> {
        match page.read_text(selector) {
            Ok(text) => Ok(Some(text.trim().to_string()).filter(|t| !t.is_empty())),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(selector, error = %e, "text read failed, item skipped");
                Ok(None)
            }
        }
    }

    fn query<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, PageError> {
        match page.find_all(selector) {
            Ok(handles) => Ok(handles),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                debug!(selector, error = %e, "query failed, treating as empty");
                Ok(vec![])
            }
        }
    }

    fn affordable<P: PageAutomation + ?Sized>(
        &self,
        page: &P,
        handle: &ElementHandle,
    ) -> Result<bool, PageError> {
        match page.is_affordable(handle) {
            Ok(flag) => Ok(flag),
            Err(e) if e.is_fatal() => Err(e),
            Err(_) => Ok(false),
        }
    }
}

/// Numeric suffix of a DOM id like `product3` or `upgrade12`.
fn trailing_digits(dom_id: &str) -> Option<u32> {
    let digits: String = dom_id
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
