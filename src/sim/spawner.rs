//! Time-gated entity spawning
//!
//! Four independent timers feed the registry: obstacle pairs, currency
//! tokens, bosses (Evasion only) and the Windfall token wind. A spawn whose
//! safe vertical slot is empty is skipped for that tick and logged.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ledger::Denomination;
use super::modes::ModeSet;
use super::state::{Boss, EntityKind, ObstaclePair, Registry, Token};
use crate::config::{SafeBand, SimConfig};

/// Simulation time of the last spawn per kind. `None` means due right away.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnTimers {
    pub last_obstacle_ms: Option<f64>,
    pub last_token_ms: Option<f64>,
    pub last_boss_ms: Option<f64>,
    pub last_wind_ms: Option<f64>,
}

fn due(last: Option<f64>, now_ms: f64, interval_ms: f64) -> bool {
    last.is_none_or(|t| now_ms - t > interval_ms)
}

/// Uniform pick in `[min, max)`, or `None` when the range is inverted
fn pick_in<R: Rng>(rng: &mut R, min: f32, max: f32) -> Option<f32> {
    if max < min {
        return None;
    }
    if max == min {
        return Some(min);
    }
    Some(rng.random_range(min..max).floor())
}

fn pick_band<R: Rng>(rng: &mut R, config: &SimConfig, band: &SafeBand, what: &str) -> Option<f32> {
    let (top, bottom) = config.band_range(band);
    let y = pick_in(rng, top, bottom);
    if y.is_none() {
        log::warn!("Skipping {} spawn: no safe slot ({} > {})", what, top, bottom);
    }
    y
}

/// Create an obstacle pair at the right edge
pub fn spawn_obstacle<R: Rng>(
    registry: &mut Registry,
    config: &SimConfig,
    rng: &mut R,
) -> Option<u32> {
    let obstacles = &config.obstacles;
    let max_segment = config.max_obstacle_segment();
    let Some(gap_top) = pick_in(rng, obstacles.min_segment, max_segment) else {
        log::warn!(
            "Skipping obstacle spawn: max segment {} below minimum {}",
            max_segment,
            obstacles.min_segment
        );
        return None;
    };

    let id = registry.next_entity_id();
    registry.obstacles.push(ObstaclePair {
        id,
        x: config.arena.width,
        width: obstacles.width,
        gap_top,
        gap: obstacles.gap,
        floor_y: config.arena.floor_y(),
        passed: false,
    });
    Some(id)
}

fn push_token(
    registry: &mut Registry,
    config: &SimConfig,
    pos: Vec2,
    denomination: Denomination,
    wind: bool,
) -> u32 {
    let id = registry.next_entity_id();
    registry.tokens.push(Token {
        id,
        pos,
        size: config.tokens.size,
        denomination,
        collected: false,
        remove_at_ms: None,
        wind,
    });
    id
}

/// Create a regular token just beyond the right edge
pub fn spawn_token<R: Rng>(
    registry: &mut Registry,
    config: &SimConfig,
    rng: &mut R,
) -> Option<(u32, Denomination)> {
    let tokens = &config.tokens;
    let y = pick_band(rng, config, &tokens.band, "token")?;
    let jitter = if tokens.x_jitter > 0.0 {
        rng.random_range(0.0..tokens.x_jitter).floor()
    } else {
        0.0
    };
    let denomination = if rng.random_bool(tokens.rare_chance.clamp(0.0, 1.0)) {
        Denomination::Rare
    } else if rng.random_bool(tokens.bonus_chance.clamp(0.0, 1.0)) {
        Denomination::Bonus
    } else {
        Denomination::Common
    };
    let pos = Vec2::new(config.arena.width + jitter, y);
    let id = push_token(registry, config, pos, denomination, false);
    Some((id, denomination))
}

/// Create a wind token (Windfall)
pub fn spawn_wind_token<R: Rng>(
    registry: &mut Registry,
    config: &SimConfig,
    rng: &mut R,
) -> Option<(u32, Denomination)> {
    let y = pick_band(rng, config, &config.tokens.band, "wind token")?;
    let denomination = if rng.random_bool(config.wind.rare_chance.clamp(0.0, 1.0)) {
        Denomination::Rare
    } else {
        Denomination::Common
    };
    let pos = Vec2::new(config.arena.width + config.wind.edge_offset, y);
    let id = push_token(registry, config, pos, denomination, true);
    Some((id, denomination))
}

/// Token dropped where a boss was defeated
pub fn spawn_boss_reward(registry: &mut Registry, config: &SimConfig, pos: Vec2) -> u32 {
    push_token(registry, config, pos, Denomination::Windfall, false)
}

/// Create a boss at the right edge
pub fn spawn_boss<R: Rng>(registry: &mut Registry, config: &SimConfig, rng: &mut R) -> Option<u32> {
    let y = pick_band(rng, config, &config.bosses.band, "boss")?;
    let id = registry.next_entity_id();
    registry.bosses.push(Boss {
        id,
        pos: Vec2::new(config.arena.width, y),
        size: Vec2::new(config.bosses.width, config.bosses.height),
        defeated: false,
        remove_at_ms: None,
    });
    log::debug!("Boss {} spawned at y={}", id, y);
    Some(id)
}

/// Check every timer and spawn what is due. Returns the new entities.
pub fn run_spawners<R: Rng>(
    registry: &mut Registry,
    timers: &mut SpawnTimers,
    modes: &ModeSet,
    config: &SimConfig,
    now_ms: f64,
    rng: &mut R,
) -> Vec<(u32, EntityKind)> {
    let mut spawned = Vec::new();

    // Obstacles arrive twice as often while the scroll is doubled
    let speedup = modes.physics(&config.physics).scroll_speed / config.physics.scroll_speed;
    let obstacle_interval = config.obstacles.interval_ms / speedup.max(1.0) as f64;
    if due(timers.last_obstacle_ms, now_ms, obstacle_interval) {
        timers.last_obstacle_ms = Some(now_ms);
        if let Some(id) = spawn_obstacle(registry, config, rng) {
            spawned.push((id, EntityKind::Obstacle));
        }
    }

    if due(timers.last_token_ms, now_ms, config.tokens.interval_ms) {
        timers.last_token_ms = Some(now_ms);
        if let Some((id, denomination)) = spawn_token(registry, config, rng) {
            spawned.push((id, EntityKind::Token(denomination)));
        }
    }

    if modes.spawns_bosses()
        && due(timers.last_boss_ms, now_ms, config.bosses.interval_ms)
        && rng.random_bool(config.bosses.chance.clamp(0.0, 1.0))
    {
        timers.last_boss_ms = Some(now_ms);
        if let Some(id) = spawn_boss(registry, config, rng) {
            spawned.push((id, EntityKind::Boss));
        }
    }

    if modes.token_wind() && due(timers.last_wind_ms, now_ms, config.wind.interval_ms) {
        timers.last_wind_ms = Some(now_ms);
        if rng.random_bool(config.wind.chance.clamp(0.0, 1.0)) {
            if let Some((id, denomination)) = spawn_wind_token(registry, config, rng) {
                spawned.push((id, EntityKind::Token(denomination)));
            }
        }
    }

    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModesConfig;
    use crate::sim::ledger::{Ledger, Wallet};
    use crate::sim::modes::ModeKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_obstacle_gap_within_safe_range() {
        let config = SimConfig::default();
        let mut registry = Registry::new();
        let mut rng = rng();
        for _ in 0..200 {
            spawn_obstacle(&mut registry, &config, &mut rng);
        }
        assert_eq!(registry.obstacles.len(), 200);
        for pair in &registry.obstacles {
            assert!(pair.gap_top >= 50.0 && pair.gap_top < 260.0);
            assert!(pair.gap_bottom() <= config.arena.floor_y() - config.obstacles.floor_clearance);
            assert_eq!(pair.x, config.arena.width);
        }
    }

    #[test]
    fn test_infeasible_spawns_are_skipped() {
        let mut config = SimConfig::default();
        config.arena.height = 250.0;
        let mut registry = Registry::new();
        let mut rng = rng();
        assert_eq!(spawn_obstacle(&mut registry, &config, &mut rng), None);
        assert_eq!(spawn_token(&mut registry, &config, &mut rng), None);
        assert_eq!(spawn_boss(&mut registry, &config, &mut rng), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_token_band_and_denominations() {
        let mut config = SimConfig::default();
        config.tokens.rare_chance = 0.5;
        let mut registry = Registry::new();
        let mut rng = rng();
        let mut reported = Vec::new();
        for _ in 0..200 {
            reported.extend(spawn_token(&mut registry, &config, &mut rng));
        }
        for (token, (id, denomination)) in registry.tokens.iter().zip(&reported) {
            assert_eq!((token.id, token.denomination), (*id, *denomination));
        }
        let rare = registry
            .tokens
            .iter()
            .filter(|t| t.denomination == Denomination::Rare)
            .count();
        assert!(rare > 50 && rare < 150, "rare = {}", rare);
        for token in &registry.tokens {
            assert!(token.pos.y >= 80.0 && token.pos.y < 420.0);
            assert!(token.pos.x >= 480.0 && token.pos.x < 580.0);
            assert_ne!(token.denomination, Denomination::Bonus);
        }
    }

    #[test]
    fn test_bonus_chance_produces_bonus_tokens() {
        let mut config = SimConfig::default();
        config.tokens.rare_chance = 0.0;
        config.tokens.bonus_chance = 1.0;
        let mut registry = Registry::new();
        let spawned = spawn_token(&mut registry, &config, &mut rng());
        assert_eq!(spawned, Some((1, Denomination::Bonus)));
        assert_eq!(registry.tokens[0].denomination, Denomination::Bonus);
    }

    #[test]
    fn test_first_tick_spawns_obstacle_and_token() {
        let config = SimConfig::default();
        let modes = ModeSet::new(&ModesConfig::default());
        let mut registry = Registry::new();
        let mut timers = SpawnTimers::default();

        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 0.0, &mut rng());
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[0].1, EntityKind::Obstacle);
        assert!(registry.bosses.is_empty());

        // Nothing more until the intervals pass
        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 1000.0, &mut rng());
        assert!(spawned.is_empty());
        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 1600.0, &mut rng());
        assert_eq!(spawned.len(), 1);
    }

    #[test]
    fn test_evasion_halves_obstacle_interval_and_spawns_bosses() {
        let mut config = SimConfig::default();
        config.bosses.chance = 1.0;
        let mut modes = ModeSet::new(&config.modes);
        let mut ledger = Ledger::with_balances(Wallet::new(3, 1, 0, 0));
        modes.try_activate(ModeKind::Evasion, &mut ledger);

        let mut registry = Registry::new();
        let mut timers = SpawnTimers {
            last_obstacle_ms: Some(0.0),
            last_token_ms: Some(0.0),
            last_boss_ms: Some(0.0),
            last_wind_ms: None,
        };
        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 1300.0, &mut rng());
        assert_eq!(spawned, vec![(1, EntityKind::Obstacle)]);

        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 2100.0, &mut rng());
        assert!(spawned.iter().any(|s| s.1 == EntityKind::Boss));
        assert_eq!(registry.bosses.len(), 1);
        assert_eq!(registry.obstacles.len(), 1);
    }

    #[test]
    fn test_wind_only_while_windfall_active() {
        let mut config = SimConfig::default();
        config.wind.chance = 1.0;
        let mut modes = ModeSet::new(&config.modes);
        let mut registry = Registry::new();
        let mut timers = SpawnTimers {
            last_obstacle_ms: Some(0.0),
            last_token_ms: Some(0.0),
            last_boss_ms: Some(0.0),
            last_wind_ms: None,
        };
        let mut rng = rng();
        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 10.0, &mut rng);
        assert!(spawned.is_empty());

        let mut ledger = Ledger::with_balances(Wallet::new(4, 2, 0, 1));
        modes.try_activate(ModeKind::Evasion, &mut ledger);
        modes.try_activate(ModeKind::Windfall, &mut ledger);
        config.bosses.chance = 0.0;
        let spawned = run_spawners(&mut registry, &mut timers, &modes, &config, 20.0, &mut rng);
        assert_eq!(spawned.len(), 1);
        let wind = &registry.tokens[0];
        assert!(wind.wind);
        assert_eq!(wind.pos.x, 500.0);
        assert_eq!(spawned[0], (wind.id, EntityKind::Token(wind.denomination)));
    }
}
