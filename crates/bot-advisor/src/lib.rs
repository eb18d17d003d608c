#![deny(warnings)]

//! Purchase heuristics: upgrade prioritization and building payback analysis.
//!
//! The advisor is pure: `decide` reads one [`GameSnapshot`] and returns at
//! most one upgrade and one building to buy this tick. Executing the
//! purchases (and coping with click failures) is the runtime's job, so the
//! same snapshot always yields the same decision.
//!
//! All keyword sets, score weights, and payback thresholds live in
//! [`AdvisorConfig`] rather than inline constants; the defaults carry the
//! tuning observed to work in practice.

use bot_core::{
    Building, BuildingChoice, GameSnapshot, PurchaseDecision, Upgrade, UpgradeCategory,
    UpgradeChoice,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tunable parameters of the purchase heuristic.
///
/// Scores are "lower is better". Bonuses subtract from a category's base
/// score, penalties add to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Keywords marking click-power upgrades; checked first.
    pub click_keywords: Vec<String>,
    /// Keywords marking golden-event upgrades; checked second.
    pub golden_keywords: Vec<String>,
    /// Building names; an upgrade mentioning one counts as production.
    pub building_names: Vec<String>,
    /// Score bonus for an upgrade that is affordable right now.
    pub affordable_bonus: f64,
    /// Fraction of the production rate assumed to be contributed by one
    /// upgrade when estimating its payback.
    pub payback_fraction: f64,
    /// Estimated payback below this many seconds earns `fast_payback_bonus`.
    pub fast_payback_secs: f64,
    pub fast_payback_bonus: f64,
    /// Estimated payback above this many seconds costs `slow_payback_penalty`.
    pub slow_payback_secs: f64,
    pub slow_payback_penalty: f64,
    /// Time-to-afford below this earns `quick_afford_bonus`.
    pub quick_afford_secs: f64,
    pub quick_afford_bonus: f64,
    /// Time-to-afford above this costs `slow_afford_penalty`.
    pub slow_afford_secs: f64,
    pub slow_afford_penalty: f64,
    /// Ceiling on building payback time; no building above it is bought.
    pub max_payback_secs: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        let strings = |words: &[&str]| words.iter().map(|w| w.to_string()).collect();
        Self {
            click_keywords: strings(&[
                "cursor",
                "click",
                "finger",
                "mouse",
                "hand",
                "carpal",
                "ambidextrous",
                "thousand",
                "million",
                "billion",
                "trillion",
            ]),
            golden_keywords: strings(&["golden", "lucky", "fortune", "chain"]),
            building_names: strings(&[
                "cursor",
                "grandma",
                "farm",
                "mine",
                "factory",
                "bank",
                "temple",
                "wizard",
                "shipment",
                "alchemy",
                "portal",
                "time machine",
                "antimatter",
                "prism",
                "chancemaker",
                "fractal",
            ]),
            affordable_bonus: 0.5,
            payback_fraction: 0.1,
            fast_payback_secs: 60.0,
            fast_payback_bonus: 1.0,
            slow_payback_secs: 300.0,
            slow_payback_penalty: 1.0,
            quick_afford_secs: 30.0,
            quick_afford_bonus: 0.3,
            slow_afford_secs: 120.0,
            slow_afford_penalty: 0.5,
            max_payback_secs: 300.0,
        }
    }
}

/// Base score by category; lower categories are bought first.
fn base_score(category: UpgradeCategory) -> f64 {
    match category {
        UpgradeCategory::Click => 1.0,
        UpgradeCategory::Golden => 2.0,
        UpgradeCategory::Production => 3.0,
        UpgradeCategory::Other => 4.0,
    }
}

/// Greedy purchase advisor over immutable snapshots.
#[derive(Clone, Debug, Default)]
pub struct Advisor {
    config: AdvisorConfig,
}

impl Advisor {
    pub fn new(config: AdvisorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Classify an upgrade by ordered keyword precedence.
    ///
    /// Click-power keywords win over golden-event keywords, which win over
    /// production markers (explicit building tie, a building name in the
    /// text, or production phrasing in the description).
    pub fn classify(&self, upgrade: &Upgrade) -> UpgradeCategory {
        let name = upgrade.name.to_lowercase();
        let desc = upgrade.desc.to_lowercase();
        let mentions = |keyword: &str| name.contains(keyword) || desc.contains(keyword);

        if self.config.click_keywords.iter().any(|k| mentions(k)) {
            return UpgradeCategory::Click;
        }
        if self.config.golden_keywords.iter().any(|k| mentions(k)) {
            return UpgradeCategory::Golden;
        }
        if upgrade.building_tie.as_deref().is_some_and(|t| !t.is_empty()) {
            return UpgradeCategory::Production;
        }
        if self.config.building_names.iter().any(|k| mentions(k)) {
            return UpgradeCategory::Production;
        }
        if desc.contains("cookie")
            && (desc.contains("production") || desc.contains("twice") || desc.contains("double"))
        {
            return UpgradeCategory::Production;
        }
        UpgradeCategory::Other
    }

    /// Priority score for one upgrade; lower is better.
    pub fn upgrade_score(&self, upgrade: &Upgrade, stock: f64, rate: f64) -> f64 {
        let cfg = &self.config;
        let mut score = base_score(self.classify(upgrade));
        if upgrade.price <= stock {
            score -= cfg.affordable_bonus;
        }
        if rate > 0.0 {
            let estimated_payback = upgrade.price / (rate * cfg.payback_fraction);
            if estimated_payback < cfg.fast_payback_secs {
                score -= cfg.fast_payback_bonus;
            } else if estimated_payback > cfg.slow_payback_secs {
                score += cfg.slow_payback_penalty;
            }
            let time_to_afford = upgrade.price / rate;
            if time_to_afford < cfg.quick_afford_secs {
                score -= cfg.quick_afford_bonus;
            } else if time_to_afford > cfg.slow_afford_secs {
                score += cfg.slow_afford_penalty;
            }
        }
        score
    }

    /// Pick at most one upgrade and one building for this tick.
    ///
    /// While the bootstrap rule is active every other purchase is
    /// suppressed, so nothing can drain the stock being saved for the
    /// first lowest-tier building.
    pub fn decide(&self, snapshot: &GameSnapshot) -> PurchaseDecision {
        let bootstrapping = snapshot.lowest_tier().is_some_and(|b| b.owned == 0);
        let decision = PurchaseDecision {
            upgrade: if bootstrapping {
                None
            } else {
                self.select_upgrade(snapshot)
            },
            building: self.select_building(snapshot),
        };
        debug!(
            upgrade = decision.upgrade.as_ref().map(|u| u.name.as_str()),
            building = decision.building.as_ref().map(|b| b.name.as_str()),
            "tick decision"
        );
        decision
    }

    fn select_upgrade(&self, snapshot: &GameSnapshot) -> Option<UpgradeChoice> {
        snapshot
            .upgrades
            .iter()
            .filter(|u| u.can_buy && u.price <= snapshot.stock)
            .map(|u| {
                let score = self.upgrade_score(u, snapshot.stock, snapshot.rate);
                (score, u)
            })
            .min_by(|(sa, ua), (sb, ub)| {
                sa.total_cmp(sb).then(ua.price.total_cmp(&ub.price))
            })
            .map(|(score, u)| UpgradeChoice {
                id: u.id,
                name: u.name.clone(),
                price: u.price,
                category: self.classify(u),
                score,
            })
    }

    fn select_building(&self, snapshot: &GameSnapshot) -> Option<BuildingChoice> {
        let first = snapshot.lowest_tier()?;

        // Bootstrap: until the first unit of the lowest tier exists there is
        // no baseline production, so relative-value scoring is meaningless.
        // Save for that one building and buy nothing else.
        if first.owned == 0 {
            if first.can_buy && first.price <= snapshot.stock {
                return Some(choice_for(first));
            }
            return None;
        }

        let best = snapshot
            .buildings
            .iter()
            .filter(|b| b.can_buy && b.price <= snapshot.stock && b.unit_rate > 0.0)
            .min_by(|a, b| {
                payback(a)
                    .total_cmp(&payback(b))
                    .then(a.price.total_cmp(&b.price))
            })?;
        if payback(best) < self.config.max_payback_secs {
            Some(choice_for(best))
        } else {
            None
        }
    }
}

fn payback(b: &Building) -> f64 {
    b.price / b.unit_rate
}

fn choice_for(b: &Building) -> BuildingChoice {
    BuildingChoice {
        id: b.id,
        name: b.name.clone(),
        price: b.price,
        payback_secs: if b.unit_rate > 0.0 { payback(b) } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bot_core::{BuildingId, UpgradeId};
    use proptest::prelude::*;

    fn upgrade(id: u32, name: &str, desc: &str, price: f64) -> Upgrade {
        Upgrade {
            id: UpgradeId(id),
            name: name.to_string(),
            desc: desc.to_string(),
            price,
            can_buy: true,
            building_tie: None,
        }
    }

    fn building(id: u32, price: f64, owned: u32, unit_rate: f64) -> Building {
        Building {
            id: BuildingId(id),
            name: format!("Building {id}"),
            price,
            owned,
            unit_rate,
            can_buy: true,
        }
    }

    fn snapshot(stock: f64, rate: f64, buildings: Vec<Building>) -> GameSnapshot {
        GameSnapshot {
            stock,
            rate,
            upgrades: vec![],
            buildings,
        }
    }

    #[test]
    fn classification_precedence() {
        let advisor = Advisor::default();
        let click = upgrade(0, "Thousand fingers", "The mouse and cursors gain...", 1.0);
        assert_eq!(advisor.classify(&click), UpgradeCategory::Click);

        // "golden" loses to a click keyword in the same text.
        let both = upgrade(1, "Golden click", "", 1.0);
        assert_eq!(advisor.classify(&both), UpgradeCategory::Click);

        let golden = upgrade(2, "Lucky day", "Golden cookies appear more often", 1.0);
        assert_eq!(advisor.classify(&golden), UpgradeCategory::Golden);

        let mut tied = upgrade(3, "Steel-plated rolling pins", "", 1.0);
        tied.building_tie = Some("Grandma".to_string());
        assert_eq!(advisor.classify(&tied), UpgradeCategory::Production);

        let named = upgrade(4, "Cheap hoes", "Farms are twice as efficient", 1.0);
        assert_eq!(advisor.classify(&named), UpgradeCategory::Production);

        let phrased = upgrade(5, "Kitten helpers", "cookie production doubled", 1.0);
        assert_eq!(advisor.classify(&phrased), UpgradeCategory::Production);

        let other = upgrade(6, "Heavenly key", "Unlocks something odd", 1.0);
        assert_eq!(advisor.classify(&other), UpgradeCategory::Other);
    }

    #[test]
    fn picks_best_category_then_cheapest() {
        let advisor = Advisor::default();
        let mut snap = snapshot(1000.0, 0.0, vec![building(0, 15.0, 1, 0.1)]);
        snap.upgrades = vec![
            upgrade(0, "Heavenly key", "odd", 100.0),
            upgrade(1, "Plastic mouse", "clicking gains +1% of your CpS", 200.0),
            upgrade(2, "Iron mouse", "clicking gains +1% of your CpS", 150.0),
        ];
        let decision = advisor.decide(&snap);
        let chosen = decision.upgrade.unwrap();
        // Both mouse upgrades tie on score; the cheaper one wins.
        assert_eq!(chosen.id, UpgradeId(2));
        assert_eq!(chosen.category, UpgradeCategory::Click);
    }

    #[test]
    fn unaffordable_upgrades_are_ignored() {
        let advisor = Advisor::default();
        let mut snap = snapshot(10.0, 1.0, vec![building(0, 15.0, 1, 0.1)]);
        snap.upgrades = vec![upgrade(0, "Plastic mouse", "click", 100.0)];
        assert!(advisor.decide(&snap).upgrade.is_none());
    }

    #[test]
    fn bootstrap_buys_lowest_tier_when_affordable() {
        let advisor = Advisor::default();
        // A far better candidate exists, but the bootstrap rule wins.
        let snap = snapshot(
            100.0,
            0.0,
            vec![building(0, 15.0, 0, 0.1), building(1, 50.0, 0, 10.0)],
        );
        let decision = advisor.decide(&snap);
        assert_eq!(decision.building.unwrap().id, BuildingId(0));
    }

    #[test]
    fn bootstrap_suppresses_upgrade_purchases() {
        let advisor = Advisor::default();
        // An affordable upgrade must not drain the stock saved for the
        // first lowest-tier building.
        let mut snap = snapshot(100.0, 0.0, vec![building(0, 15.0, 0, 0.1)]);
        snap.upgrades = vec![upgrade(0, "Plastic mouse", "click", 100.0)];
        let decision = advisor.decide(&snap);
        assert!(decision.upgrade.is_none());
        assert_eq!(decision.building.unwrap().id, BuildingId(0));

        // Once one unit is owned the same upgrade is fair game again.
        snap.buildings[0].owned = 1;
        assert!(advisor.decide(&snap).upgrade.is_some());
    }

    #[test]
    fn bootstrap_saves_when_not_affordable() {
        let advisor = Advisor::default();
        let snap = snapshot(
            10.0,
            0.0,
            vec![building(0, 15.0, 0, 0.1), building(1, 5.0, 0, 10.0)],
        );
        assert!(advisor.decide(&snap).building.is_none());
    }

    #[test]
    fn selects_lowest_payback_building() {
        let advisor = Advisor::default();
        let snap = snapshot(
            50.0,
            1.0,
            vec![building(0, 10.0, 1, 0.1), building(1, 40.0, 0, 5.0)],
        );
        let decision = advisor.decide(&snap);
        let chosen = decision.building.unwrap();
        // Payback 8s beats 100s.
        assert_eq!(chosen.id, BuildingId(1));
        assert!((chosen.payback_secs - 8.0).abs() < 1e-9);
    }

    #[test]
    fn payback_ceiling_blocks_poor_buildings() {
        let advisor = Advisor::default();
        // Only option pays back in 1000s, over the 300s ceiling.
        let snap = snapshot(
            2000.0,
            1.0,
            vec![building(0, 1000.0, 3, 1.0)],
        );
        assert!(advisor.decide(&snap).building.is_none());
    }

    #[test]
    fn decide_is_idempotent() {
        let advisor = Advisor::default();
        let mut snap = snapshot(
            500.0,
            3.0,
            vec![building(0, 15.0, 2, 0.1), building(1, 100.0, 1, 1.0)],
        );
        snap.upgrades = vec![
            upgrade(0, "Lucky day", "golden cookies stay longer", 77.0),
            upgrade(1, "Plastic mouse", "click", 50.0),
        ];
        assert_eq!(advisor.decide(&snap), advisor.decide(&snap));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let cfg = AdvisorConfig::default();
        let text = serde_json::to_string(&cfg).unwrap();
        let back: AdvisorConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }

    proptest! {
        #[test]
        fn chosen_prices_never_exceed_stock(
            stock in 0.0f64..1e9,
            rate in 0.0f64..1e6,
            prices in proptest::collection::vec(0.1f64..1e9, 1..8),
            owned in 0u32..3,
        ) {
            let buildings = prices
                .iter()
                .enumerate()
                .map(|(i, &p)| building(i as u32, p, owned, 0.5))
                .collect();
            let mut snap = snapshot(stock, rate, buildings);
            snap.upgrades = prices
                .iter()
                .enumerate()
                .map(|(i, &p)| upgrade(i as u32, "Plastic mouse", "click", p))
                .collect();
            let decision = Advisor::default().decide(&snap);
            if let Some(u) = decision.upgrade {
                prop_assert!(u.price <= stock);
            }
            if let Some(b) = decision.building {
                prop_assert!(b.price <= stock);
            }
        }
    }
}
