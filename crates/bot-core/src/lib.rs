#![deny(warnings)]

//! Core domain models and invariants for the clicker bot.
//!
//! This crate defines the snapshot and decision types shared across the
//! workspace, the page-error taxonomy, and validation helpers that guarantee
//! basic invariants before a snapshot reaches the advisor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of an upgrade in the store, as exposed by the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpgradeId(pub u32);

/// Stable identifier of a building (product slot) on the page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Semantic category of an upgrade, derived from keyword matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeCategory {
    /// Boosts manual click power.
    Click,
    /// Improves golden-event frequency or payouts.
    Golden,
    /// Multiplies passive production.
    Production,
    /// Anything the keyword sets do not recognize.
    Other,
}

impl UpgradeCategory {
    /// Short tag used in purchase log lines.
    pub fn tag(self) -> &'static str {
        match self {
            UpgradeCategory::Click => "[CLICK]",
            UpgradeCategory::Golden => "[GOLD]",
            UpgradeCategory::Production => "[PROD]",
            UpgradeCategory::Other => "[OTHER]",
        }
    }
}

/// A purchasable upgrade as read from the store panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    /// Store identifier.
    pub id: UpgradeId,
    /// Display name.
    pub name: String,
    /// Display description (may be empty).
    pub desc: String,
    /// Price in resource units.
    pub price: f64,
    /// UI-level enabled flag maintained by the game itself.
    pub can_buy: bool,
    /// Name of the building this upgrade is tied to, when the game says so.
    pub building_tie: Option<String>,
}

/// A purchasable building as read from the product list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Product slot identifier; slot 0 is the lowest tier.
    pub id: BuildingId,
    /// Display name.
    pub name: String,
    /// Price of the next unit.
    pub price: f64,
    /// Units currently owned.
    pub owned: u32,
    /// Estimated production contribution of one more unit, per second.
    pub unit_rate: f64,
    /// UI-level enabled flag.
    pub can_buy: bool,
}

/// One immutable read of game state, consumed by a single decision tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Current accumulated resource count.
    pub stock: f64,
    /// Current production rate, resource per second.
    pub rate: f64,
    /// Visible upgrades in store order.
    pub upgrades: Vec<Upgrade>,
    /// Visible buildings in catalog order (lowest tier first).
    pub buildings: Vec<Building>,
}

impl GameSnapshot {
    /// The lowest-tier building, if any is visible.
    pub fn lowest_tier(&self) -> Option<&Building> {
        self.buildings.first()
    }
}

/// An upgrade the advisor selected this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeChoice {
    pub id: UpgradeId,
    pub name: String,
    pub price: f64,
    pub category: UpgradeCategory,
    /// Priority score at selection time; lower is better.
    pub score: f64,
}

/// A building the advisor selected this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingChoice {
    pub id: BuildingId,
    pub name: String,
    pub price: f64,
    /// Price divided by unit production contribution, in seconds.
    pub payback_secs: f64,
}

/// At most one upgrade and one building chosen for the current tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDecision {
    pub upgrade: Option<UpgradeChoice>,
    pub building: Option<BuildingChoice>,
}

impl PurchaseDecision {
    /// True when the tick should buy nothing.
    pub fn is_noop(&self) -> bool {
        self.upgrade.is_none() && self.building.is_none()
    }
}

/// Failures raised by the page-automation collaborator.
///
/// `NotFound` and `Stale` are recoverable: the affected item (or the whole
/// tick) is skipped and the next tick re-reads from a fresh snapshot.
/// `SessionLost` is the only fatal variant and ends the loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    /// Expected page element is absent.
    #[error("element not found: {0}")]
    NotFound(String),
    /// A previously obtained handle no longer resolves.
    #[error("stale element reference: {0}")]
    Stale(String),
    /// The underlying page session is gone; no further reads can succeed.
    #[error("session lost: {0}")]
    SessionLost(String),
}

impl PageError {
    /// Whether this error should end the decision loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PageError::SessionLost(_))
    }
}

/// Counters threaded through the decision loop, one instance per session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickStats {
    /// Completed decision ticks.
    pub ticks: u64,
    /// Manual clicks issued on the main clickable.
    pub clicks: u64,
    /// Golden-event shimmers popped.
    pub golden_popped: u64,
    /// Upgrades bought this session.
    pub upgrades_bought: u64,
    /// Buildings bought this session.
    pub buildings_bought: u64,
    /// Human-readable description of the most recent purchase.
    pub last_purchase: Option<String>,
}

/// Validation errors for snapshot invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Stock and rate must be finite and non-negative.
    #[error("non-finite or negative quantity: {0}")]
    InvalidQuantity(f64),
    /// Prices must be finite and non-negative.
    #[error("invalid price {price} on {item}")]
    InvalidPrice { item: String, price: f64 },
    /// Per-unit rates must be finite and non-negative.
    #[error("invalid unit rate {rate} on {item}")]
    InvalidRate { item: String, rate: f64 },
    /// Catalog identifiers must be unique within a snapshot.
    #[error("duplicate catalog id: {0}")]
    DuplicateId(u32),
}

fn valid_quantity(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// Validate a single upgrade entry.
pub fn validate_upgrade(u: &Upgrade) -> Result<(), ValidationError> {
    if !valid_quantity(u.price) {
        return Err(ValidationError::InvalidPrice {
            item: u.name.clone(),
            price: u.price,
        });
    }
    Ok(())
}

/// Validate a single building entry.
pub fn validate_building(b: &Building) -> Result<(), ValidationError> {
    if !valid_quantity(b.price) {
        return Err(ValidationError::InvalidPrice {
            item: b.name.clone(),
            price: b.price,
        });
    }
    if !valid_quantity(b.unit_rate) {
        return Err(ValidationError::InvalidRate {
            item: b.name.clone(),
            rate: b.unit_rate,
        });
    }
    Ok(())
}

/// Validate a whole snapshot, including id uniqueness per catalog.
pub fn validate_snapshot(s: &GameSnapshot) -> Result<(), ValidationError> {
    if !valid_quantity(s.stock) {
        return Err(ValidationError::InvalidQuantity(s.stock));
    }
    if !valid_quantity(s.rate) {
        return Err(ValidationError::InvalidQuantity(s.rate));
    }
    let mut upgrade_ids = std::collections::BTreeSet::new();
    for u in &s.upgrades {
        validate_upgrade(u)?;
        if !upgrade_ids.insert(u.id) {
            return Err(ValidationError::DuplicateId(u.id.0));
        }
    }
    let mut building_ids = std::collections::BTreeSet::new();
    for b in &s.buildings {
        validate_building(b)?;
        if !building_ids.insert(b.id) {
            return Err(ValidationError::DuplicateId(b.id.0));
        }
    }
    Ok(())
}
