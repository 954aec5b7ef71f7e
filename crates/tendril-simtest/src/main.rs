//! Tendril Headless Garden Harness
//!
//! Validates the pure garden logic end to end without a database: geometry,
//! catalog, soil packing, the plant lifecycle, and a multi-day scenario with
//! simulated players.
//!
//! Usage:
//!   cargo run -p tendril-simtest
//!   cargo run -p tendril-simtest -- --verbose
//!   cargo run -p tendril-simtest -- --config scenario.json --seed 7 --save garden.bin

mod persistence;
mod scenario;
mod store;

use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use tendril_logic::constants::{geo::EARTH_RADIUS_M, seeds as seed_consts, temperament};
use tendril_logic::garden::closest_plants;
use tendril_logic::geometry::{Circle, Coordinates};
use tendril_logic::leveling::xp_required_for_level;
use tendril_logic::plant::{Plant, PlantState};
use tendril_logic::seeds::{catalog, group_seeds, random_grant_size, Seed};
use tendril_logic::soil::{allocate_soil, Soil, SoilMeta, SoilSize, SoilType};
use tendril_logic::temperament::Temperament;
use tendril_logic::GardenError;

use persistence::{load_garden, save_garden};
use scenario::{offset, run_scenario, validate_scenario, CareStyle, ScenarioConfig, ScenarioOutcome};
use store::GardenStore;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn load_config(args: &[String]) -> anyhow::Result<ScenarioConfig> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading scenario file {}", path))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing scenario file {}", path))?
        }
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = arg_value(args, "--seed") {
        config.seed = seed
            .parse()
            .with_context(|| format!("invalid --seed value {:?}", seed))?;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tendril=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let config = load_config(&args)?;

    let errors = validate_scenario(&config);
    if !errors.is_empty() {
        for e in &errors {
            error!("invalid scenario: {}", e);
        }
        bail!("scenario has {} invalid setting(s)", errors.len());
    }

    println!("=== Tendril Garden Harness (seed {}) ===\n", config.seed);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut results = Vec::new();

    // 1. Geometry
    results.extend(validate_geometry(verbose));

    // 2. Catalog, seeds, traits, levels
    results.extend(validate_catalog(&mut rng, verbose));

    // 3. Soil packing
    results.extend(validate_soil_allocation(&mut rng, &config, verbose));

    // 4. Plant lifecycle scenarios
    results.extend(validate_lifecycle(&mut rng, config.start));

    // 5. Multi-day scenario
    let mut store = GardenStore::default();
    let outcome = run_scenario(&config, &mut rng, &mut store);
    results.extend(validate_scenario_run(&config, &outcome, &store, verbose));

    // 6. Snapshot
    results.extend(validate_snapshot(&store, config.end()));

    if let Some(path) = arg_value(&args, "--save") {
        let file = File::create(path).with_context(|| format!("creating {}", path))?;
        save_garden(BufWriter::new(file), &store, config.end())
            .with_context(|| format!("writing snapshot to {}", path))?;
        info!("snapshot written to {}", path);
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n  garden: {}", store.stats());
    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── 1. Geometry ─────────────────────────────────────────────────────────

fn validate_geometry(verbose: bool) -> Vec<TestResult> {
    println!("--- Geometry ---");
    let mut results = Vec::new();

    let a = Coordinates::new(0.0, 0.0);
    let b = Coordinates::new(1.0, 0.0);
    let one_degree = a.distance_m(&b);
    let expected = EARTH_RADIUS_M * 1f64.to_radians();
    results.push(TestResult::new(
        "one_degree_latitude",
        (one_degree - expected).abs() < 1.0,
        format!("{:.1}m (expected {:.1}m)", one_degree, expected),
    ));

    let paris = Coordinates::new(48.8566, 2.3522);
    let london = Coordinates::new(51.5074, -0.1278);
    let there = paris.distance_m(&london);
    let back = london.distance_m(&paris);
    results.push(TestResult::new(
        "distance_symmetric",
        (there - back).abs() < 1e-6 && (340_000.0..350_000.0).contains(&there),
        format!("Paris-London {:.0}m", there),
    ));
    if verbose {
        println!("  Paris-London: {:.1}km", there / 1000.0);
    }

    let soil = Circle::new(paris, 10.0);
    let inner = Circle::new(offset(paris, 4.0, 0.0), 5.0);
    let poking = Circle::new(offset(paris, 6.0, 0.0), 5.0);
    results.push(TestResult::new(
        "circle_containment",
        soil.contains_full_circle(&inner) && !soil.contains_full_circle(&poking),
        "4m offset fits, 6m offset pokes out",
    ));

    let neighbour = Circle::new(offset(paris, 14.0, 0.0), 5.0);
    let stranger = Circle::new(offset(paris, 15.5, 0.0), 5.0);
    results.push(TestResult::new(
        "circle_overlap",
        soil.overlaps_with(&neighbour) && !soil.overlaps_with(&stranger),
        "intersecting circles overlap, separated ones do not",
    ));

    results
}

// ── 2. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(rng: &mut StdRng, verbose: bool) -> Vec<TestResult> {
    println!("--- Catalog & Seeds ---");
    let mut results = Vec::new();

    let species = catalog();
    let names: HashSet<_> = species.iter().map(|s| s.botanical_name.as_str()).collect();
    results.push(TestResult::new(
        "catalog_size",
        species.len() == 10 && names.len() == 10,
        format!("{} species, {} unique", species.len(), names.len()),
    ));

    let uncovered: Vec<_> = SoilType::ALL
        .iter()
        .filter(|t| !species.iter().any(|s| s.optimal_soil == **t))
        .collect();
    results.push(TestResult::new(
        "catalog_covers_soil_types",
        uncovered.is_empty(),
        if uncovered.is_empty() {
            "every soil type is optimal for some species".to_string()
        } else {
            format!("no species prefers {:?}", uncovered)
        },
    ));
    if verbose {
        for s in &species {
            println!("  {} ({}) prefers {}", s.common_name, s.botanical_name, s.optimal_soil);
        }
    }

    let grants: Vec<usize> = (0..1000).map(|_| random_grant_size(rng)).collect();
    let in_range = grants
        .iter()
        .all(|n| (seed_consts::GRANT_MIN..=seed_consts::GRANT_MAX).contains(n));
    let distinct: HashSet<_> = grants.iter().collect();
    results.push(TestResult::new(
        "grant_size_range",
        in_range && distinct.len() == 6,
        format!("{} distinct grant sizes over 1000 draws", distinct.len()),
    ));

    let bad_traits = (0..1000)
        .map(|_| Temperament::random(rng))
        .filter(|t| {
            t.values()
                .iter()
                .any(|v| !(0..temperament::MAX_VALUE).contains(v))
        })
        .count();
    results.push(TestResult::new(
        "temperament_range",
        bad_traits == 0,
        format!("{} out-of-range temperaments in 1000", bad_traits),
    ));

    let curve: Vec<i64> = (1..=4).map(xp_required_for_level).collect();
    results.push(TestResult::new(
        "xp_curve",
        curve == vec![0, 150, 450, 900],
        format!("levels 1-4 need {:?}", curve),
    ));

    results
}

// ── 3. Soil Allocation ──────────────────────────────────────────────────

fn validate_soil_allocation(
    rng: &mut StdRng,
    config: &ScenarioConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Soil Allocation ---");
    let mut results = Vec::new();

    let mut soils: Vec<Soil> = Vec::new();
    let mut refused = 0;
    for _ in 0..300 {
        let target = offset(
            config.centre,
            rng.gen_range(-300.0..300.0),
            rng.gen_range(-300.0..300.0),
        );
        match allocate_soil(rng, target, &soils, None, config.start) {
            Ok(soil) => soils.push(soil),
            Err(GardenError::NoSoilGenerated) => refused += 1,
            Err(e) => {
                results.push(TestResult::new(
                    "allocation_errors",
                    false,
                    format!("unexpected error: {}", e),
                ));
                return results;
            }
        }
    }

    let overlapping = count_overlapping_pairs(soils.iter().map(|s| &s.circle));
    results.push(TestResult::new(
        "soils_disjoint",
        overlapping == 0,
        format!(
            "{} soils placed, {} refused, {} overlapping pairs",
            soils.len(),
            refused,
            overlapping
        ),
    ));

    let odd_radius = soils
        .iter()
        .filter(|s| !SoilSize::ALL.iter().any(|z| z.radius_m() == s.radius_m()))
        .count();
    results.push(TestResult::new(
        "soil_radii_discrete",
        odd_radius == 0,
        format!("{} soils with a non-standard radius", odd_radius),
    ));

    let bad_meta = soils
        .iter()
        .filter(|s| {
            let m = s.meta;
            !(0.05..=1.0).contains(&m.water_retention) || !(0.05..=1.0).contains(&m.nutrient_richness)
        })
        .count();
    results.push(TestResult::new(
        "soil_attributes_clamped",
        bad_meta == 0,
        format!("{} soils with attributes outside [0.05, 1.00]", bad_meta),
    ));

    let cap = SoilSize::Medium.radius_m();
    let oversized = (0..100)
        .filter_map(|_| allocate_soil(rng, config.centre, &[], Some(cap), config.start).ok())
        .filter(|s| s.radius_m() > cap)
        .count();
    results.push(TestResult::new(
        "capped_allocation",
        oversized == 0,
        format!("{} of 100 soils exceed the {}m cap", oversized, cap),
    ));

    if verbose {
        for t in SoilType::ALL {
            let of_type: Vec<&Soil> = soils.iter().filter(|s| s.soil_type() == t).collect();
            let area: f64 = of_type.iter().map(|s| s.circle.area_m2()).sum();
            println!("  {}: {} soils, {:.0} m2", t, of_type.len(), area);
        }
    }

    results
}

fn count_overlapping_pairs<'a>(circles: impl Iterator<Item = &'a Circle>) -> usize {
    let circles: Vec<&Circle> = circles.collect();
    let mut count = 0;
    for (i, a) in circles.iter().enumerate() {
        for b in &circles[i + 1..] {
            if a.overlaps_with(b) {
                count += 1;
            }
        }
    }
    count
}

// ── 4. Lifecycle ────────────────────────────────────────────────────────

/// A full-health plant planted at `t0` in a roomy loam patch.
fn lab_plant(rng: &mut StdRng, t0: DateTime<Utc>) -> Result<Plant, GardenError> {
    let spot = Coordinates::new(-33.8568, 151.2153);
    let soil = Soil::new(
        Uuid::nil(),
        Circle::new(spot, 22.0),
        SoilMeta::baseline(SoilType::Loam),
        t0,
    );
    let mut seed = Seed::new(rng, Uuid::nil(), t0);
    let mut plant = Plant::new(rng, &mut seed, &soil, spot, t0)?;
    plant.hp = 100.0;
    Ok(plant)
}

fn validate_lifecycle(rng: &mut StdRng, t0: DateTime<Utc>) -> Vec<TestResult> {
    println!("--- Plant Lifecycle ---");
    lifecycle_checks(rng, t0)
        .unwrap_or_else(|e| vec![TestResult::new("lab_plant", false, e.to_string())])
}

fn lifecycle_checks(
    rng: &mut StdRng,
    t0: DateTime<Utc>,
) -> Result<Vec<TestResult>, GardenError> {
    let mut results = Vec::new();
    let h = Duration::hours;

    let mut neglected = lab_plant(rng, t0)?;
    neglected.refresh(t0 + h(8));
    results.push(TestResult::new(
        "neglect_two_intervals",
        neglected.hp == 98.0 && !neglected.dead,
        format!("hp {} after 8h", neglected.hp),
    ));

    let mut watered = lab_plant(rng, t0)?;
    let water_ok = watered.water(t0) == Ok(true);
    watered.refresh(t0 + h(3));
    let after_three = watered.hp;
    watered.refresh(t0 + h(8));
    results.push(TestResult::new(
        "grace_shields_decay",
        water_ok && after_three == 100.0 && watered.hp == 99.0,
        format!("hp {} at +3h, {} at +8h", after_three, watered.hp),
    ));

    let mut cooling = lab_plant(rng, t0)?;
    cooling.water(t0 + h(1))?;
    let rejected = cooling.water(t0 + h(2));
    results.push(TestResult::new(
        "cooldown_enforced",
        rejected == Err(GardenError::InCooldown { remaining: h(2) }),
        format!("{:?}", rejected),
    ));

    let mut doomed = lab_plant(rng, t0)?;
    let death_at = t0 + Duration::days(17);
    let alive = doomed.refresh(death_at);
    let frozen = doomed.clone();
    let late_water = doomed.water(death_at + h(4));
    doomed.refresh(death_at + Duration::days(1));
    results.push(TestResult::new(
        "neglect_kills",
        !alive && doomed.hp == 0.0 && doomed.time_of_death == Some(death_at),
        format!("dead={} hp={}", doomed.dead, doomed.hp),
    ));
    results.push(TestResult::new(
        "death_is_terminal",
        late_water == Ok(false) && doomed == frozen && doomed.state(death_at) == PlantState::Dead,
        "watering and refreshing a dead plant change nothing",
    ));

    Ok(results)
}

// ── 5. Scenario ─────────────────────────────────────────────────────────

fn validate_scenario_run(
    config: &ScenarioConfig,
    outcome: &ScenarioOutcome,
    store: &GardenStore,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Scenario ({} players, {} days) ---", config.players, config.days);
    let mut results = Vec::new();
    let stats = store.stats();

    let planted_seeds = store.seeds.iter().filter(|s| s.planted).count();
    results.push(TestResult::new(
        "seeds_match_plants",
        planted_seeds == stats.plant_count && outcome.planting_attempts == outcome.seeds_granted,
        format!(
            "{} of {} seeds planted, rejections {:?}",
            planted_seeds, outcome.seeds_granted, outcome.rejections
        ),
    ));

    let activated = store.plants.iter().filter(|p| p.activated).count();
    results.push(TestResult::new(
        "plants_activated",
        outcome.activations == stats.plant_count && activated == stats.plant_count,
        format!("{}/{} plants activated", outcome.activations, stats.plant_count),
    ));

    let homeless = store
        .plants
        .iter()
        .filter(|p| {
            !store
                .soils
                .iter()
                .any(|s| s.id == p.soil_id && s.circle.contains_full_circle(&p.circle))
        })
        .count();
    results.push(TestResult::new(
        "plants_inside_soil",
        homeless == 0,
        format!("{} plants outside their soil", homeless),
    ));

    let soil_overlaps = count_overlapping_pairs(store.soils.iter().map(|s| &s.circle));
    let plant_overlaps: usize = store
        .soils
        .iter()
        .map(|soil| {
            count_overlapping_pairs(
                store
                    .plants
                    .iter()
                    .filter(|p| p.soil_id == soil.id)
                    .map(|p| &p.circle),
            )
        })
        .sum();
    results.push(TestResult::new(
        "no_overlaps",
        soil_overlaps == 0 && plant_overlaps == 0,
        format!(
            "{} overlapping soil pairs, {} overlapping plant pairs",
            soil_overlaps, plant_overlaps
        ),
    ));

    let by_style = |style| plants_with_style(store, outcome, style);

    let diligent = by_style(CareStyle::Diligent);
    let thriving = diligent
        .iter()
        .filter(|p| !p.dead && p.hp >= outcome.initial_hp.get(&p.id).copied().unwrap_or(0.0))
        .count();
    results.push(TestResult::new(
        "diligent_plants_thrive",
        thriving == diligent.len(),
        format!("{}/{} diligent plants alive and not weaker", thriving, diligent.len()),
    ));

    // One watering (+5) outweighs the decay of a day, so daily care or better keeps up
    let casual = by_style(CareStyle::Casual);
    let casual_alive = casual.iter().filter(|p| !p.dead).count();
    let expect_survival = config.casual_interval_hours <= 24;
    results.push(TestResult::new(
        "casual_plants_survive",
        !expect_survival || casual_alive == casual.len(),
        format!(
            "{}/{} casual plants alive (watered every {}h)",
            casual_alive,
            casual.len(),
            config.casual_interval_hours
        ),
    ));

    // 100 HP lasts 400h without water, so past that every neglected plant is gone
    let neglected = by_style(CareStyle::Neglectful);
    let certain_death = config.days as i64 * 24 >= 400;
    let as_expected = neglected
        .iter()
        .filter(|p| {
            let initial = outcome.initial_hp.get(&p.id).copied().unwrap_or(0.0);
            if certain_death {
                p.dead
            } else {
                p.dead || p.hp < initial
            }
        })
        .count();
    results.push(TestResult::new(
        "neglected_plants_decline",
        as_expected == neglected.len(),
        format!(
            "{}/{} neglected plants {}",
            as_expected,
            neglected.len(),
            if certain_death { "dead" } else { "weakened" }
        ),
    ));

    let broken_corpses = store
        .plants
        .iter()
        .filter(|p| {
            (p.dead != (p.hp == 0.0))
                || (p.dead && (p.grace_period_ends_at.is_some() || p.time_of_death.is_none()))
        })
        .count();
    results.push(TestResult::new(
        "death_invariants",
        broken_corpses == 0,
        format!("{} plants violate dead <=> hp 0", broken_corpses),
    ));

    results.push(TestResult::new(
        "stats_consistent",
        stats.living_count + stats.dead_count == stats.plant_count
            && stats.seed_count == outcome.seeds_granted,
        stats.to_string(),
    ));

    let nearest = closest_plants(&store.plants, &config.centre, 4);
    let sorted = nearest.windows(2).all(|w| w[0].distance_m <= w[1].distance_m);
    results.push(TestResult::new(
        "closest_plants",
        nearest.len() == stats.plant_count.min(4) && sorted,
        format!("{} nearest plants listed", nearest.len()),
    ));

    let grouped_ok = outcome.players.iter().all(|player| {
        let owned: Vec<Seed> = store
            .seeds
            .iter()
            .filter(|s| s.owner_id == player.id)
            .cloned()
            .collect();
        let unplanted = store.inventory(player.id).len();
        let planted = store.plants_of(player.id).count();
        group_seeds(&owned).iter().map(|g| g.count).sum::<usize>() == owned.len()
            && unplanted + planted == owned.len()
    });
    results.push(TestResult::new(
        "inventories_balance",
        grouped_ok,
        "every seed is either in an inventory or in the ground",
    ));

    if verbose {
        for player in &outcome.players {
            let plants: Vec<&Plant> = store.plants_of(player.id).collect();
            let alive = plants.iter().filter(|p| !p.dead).count();
            println!(
                "  {} ({:?}): {}/{} alive",
                player.id,
                player.style,
                alive,
                plants.len()
            );
            for plant in plants {
                println!(
                    "    {} hp {} level {} ({} xp to next)",
                    plant.nickname,
                    plant.hp,
                    plant.level.level,
                    plant.level.xp_to_next_level()
                );
            }
        }
    }

    results
}

fn plants_with_style<'a>(
    store: &'a GardenStore,
    outcome: &ScenarioOutcome,
    style: CareStyle,
) -> Vec<&'a Plant> {
    store
        .plants
        .iter()
        .filter(|p| outcome.style_of(p.owner_id) == Some(style))
        .collect()
}

// ── 6. Snapshot ─────────────────────────────────────────────────────────

fn validate_snapshot(store: &GardenStore, taken_at: DateTime<Utc>) -> Vec<TestResult> {
    println!("--- Snapshot ---");
    let mut buffer = Vec::new();
    let outcome = save_garden(&mut buffer, store, taken_at)
        .and_then(|_| load_garden(&buffer[..]))
        .map(|loaded| loaded.store == *store && loaded.taken_at == taken_at);

    vec![match outcome {
        Ok(same) => TestResult::new(
            "snapshot_roundtrip",
            same,
            format!("{} bytes", buffer.len()),
        ),
        Err(e) => TestResult::new("snapshot_roundtrip", false, e.to_string()),
    }]
}
