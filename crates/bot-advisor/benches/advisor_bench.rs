use bot_core::{Building, BuildingId, GameSnapshot, Upgrade, UpgradeId};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn build_snapshot(n_upgrades: u32, n_buildings: u32) -> GameSnapshot {
    let upgrades = (0..n_upgrades)
        .map(|i| Upgrade {
            id: UpgradeId(i),
            name: format!("Upgrade {i}"),
            desc: if i % 3 == 0 {
                "clicking gains +1% of your CpS".to_string()
            } else {
                "cookie production doubled".to_string()
            },
            price: 100.0 * 1.15f64.powi(i as i32),
            can_buy: i % 2 == 0,
            building_tie: None,
        })
        .collect();
    let buildings = (0..n_buildings)
        .map(|i| Building {
            id: BuildingId(i),
            name: format!("Building {i}"),
            price: 15.0 * 10f64.powi(i as i32 / 2),
            owned: 4,
            unit_rate: 0.1 * 8f64.powi(i as i32 / 2),
            can_buy: true,
        })
        .collect();
    GameSnapshot {
        stock: 1e9,
        rate: 4200.0,
        upgrades,
        buildings,
    }
}

fn bench_decide(c: &mut Criterion) {
    let advisor = bot_advisor::Advisor::default();
    let snapshot = build_snapshot(150, 19);
    c.bench_function("decide 150 upgrades x 19 buildings", |b| {
        b.iter(|| black_box(advisor.decide(black_box(&snapshot))))
    });
}

criterion_group!(benches, bench_decide);
criterion_main!(benches);
