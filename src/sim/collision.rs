//! Collision detection and response
//!
//! Everything is an axis-aligned box. Which contacts matter depends on the
//! active modes, folded into [`CollisionRules`] once per tick:
//! 1. intangible: obstacles and bosses are ignored
//! 2. invincible: nothing is lethal, boundaries clamp instead
//! 3. default: boundaries, obstacles and side/bottom boss contact are lethal
//!
//! Tokens are always collectable and never lethal.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::modes::ModeSet;
use super::state::{Boss, DeathCause, ObstaclePair, Player, Token};
use crate::config::{CollisionConfig, SimConfig};
use crate::spans_overlap;

/// Axis-aligned bounding box (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Touching edges count as overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        spans_overlap(self.min.x, self.max.x, other.min.x, other.max.x)
            && spans_overlap(self.min.y, self.max.y, other.min.y, other.max.y)
    }

    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        spans_overlap(self.min.x, self.max.x, other.min.x, other.max.x)
    }
}

/// Collision rules in effect for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionRules {
    pub intangible: bool,
    pub invincible: bool,
    pub perches: bool,
}

impl CollisionRules {
    pub fn from_modes(modes: &ModeSet) -> Self {
        Self {
            intangible: modes.intangible(),
            invincible: modes.invincible(),
            perches: modes.perches(),
        }
    }
}

/// Player vs boss outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossContact {
    None,
    /// Landed on the boss from above
    Stomp,
    Lethal,
}

/// Player vs obstacle pair outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstacleContact {
    None,
    /// Resting on the top edge of the lower segment
    Perch { surface_y: f32 },
    Lethal,
}

pub fn token_hit(player: &Player, token: &Token) -> bool {
    !token.collected && player.bounds().overlaps(&token.bounds())
}

pub fn boss_contact(player: &Player, boss: &Boss, rules: &CollisionRules) -> BossContact {
    if rules.intangible || boss.defeated || !player.bounds().overlaps(&boss.bounds()) {
        return BossContact::None;
    }
    // Falling, with the player's top still above the boss's top
    if player.vel > 0.0 && player.y < boss.pos.y {
        BossContact::Stomp
    } else if rules.invincible {
        BossContact::None
    } else {
        BossContact::Lethal
    }
}

pub fn obstacle_contact(
    player: &Player,
    pair: &ObstaclePair,
    rules: &CollisionRules,
    config: &CollisionConfig,
) -> ObstacleContact {
    if rules.intangible {
        return ObstacleContact::None;
    }
    let bounds = player.bounds();
    let lower = pair.lower();
    if !bounds.overlaps_x(&lower) {
        return ObstacleContact::None;
    }

    let bottom = player.bottom();
    let surface = lower.min.y;
    let perch_limit = surface + config.perch_band;
    if rules.perches && player.vel >= 0.0 && bottom >= surface && bottom <= perch_limit {
        return ObstacleContact::Perch { surface_y: surface };
    }

    let lower_hit = if rules.perches {
        bottom > perch_limit
    } else {
        bottom >= surface
    };
    let upper_hit = player.y <= pair.gap_top;
    if (lower_hit || upper_hit) && !rules.invincible {
        ObstacleContact::Lethal
    } else {
        ObstacleContact::None
    }
}

/// Apply floor/ceiling rules. Returns the cause if the contact is lethal.
pub fn resolve_bounds(
    player: &mut Player,
    rules: &CollisionRules,
    config: &SimConfig,
) -> Option<DeathCause> {
    let floor = config.arena.floor_y();
    let at_floor = player.bottom() >= floor;
    let at_ceiling = player.y <= 0.0;

    if rules.invincible {
        if at_floor {
            // Velocity is kept so the next jump still works
            player.y = floor - player.height;
        } else if at_ceiling {
            player.y = config.collision.ceiling_nudge_y;
            player.vel = config.collision.ceiling_nudge_velocity;
        }
        return None;
    }

    if at_floor {
        Some(DeathCause::Ground)
    } else if at_ceiling {
        Some(DeathCause::Ceiling)
    } else {
        None
    }
}

/// Run obstacle rules against every pair. A perch repositions the player;
/// the first lethal contact wins.
pub fn resolve_obstacles(
    player: &mut Player,
    obstacles: &[ObstaclePair],
    rules: &CollisionRules,
    config: &CollisionConfig,
) -> Option<DeathCause> {
    for pair in obstacles {
        match obstacle_contact(player, pair, rules, config) {
            ObstacleContact::None => {}
            ObstacleContact::Perch { surface_y } => {
                player.y = surface_y - player.height;
                player.vel = 0.0;
                return None;
            }
            ObstacleContact::Lethal => return Some(DeathCause::Obstacle),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::sim::ledger::Denomination;

    fn player_at(y: f32, vel: f32) -> Player {
        let mut player = Player::new(&ArenaConfig::default());
        player.y = y;
        player.vel = vel;
        player
    }

    /// Pair directly under the player (x = 72..106)
    fn pair_at_player() -> ObstaclePair {
        ObstaclePair {
            id: 1,
            x: 60.0,
            width: 80.0,
            gap_top: 150.0,
            gap: 220.0,
            floor_y: 560.0,
            passed: false,
        }
    }

    fn boss_at(y: f32) -> Boss {
        Boss {
            id: 9,
            pos: Vec2::new(80.0, y),
            size: Vec2::new(100.0, 110.0),
            defeated: false,
            remove_at_ms: None,
        }
    }

    const DEFAULT: CollisionRules = CollisionRules {
        intangible: false,
        invincible: false,
        perches: false,
    };
    const EVASION: CollisionRules = CollisionRules {
        intangible: false,
        invincible: true,
        perches: true,
    };
    const GHOST: CollisionRules = CollisionRules {
        intangible: true,
        invincible: false,
        perches: false,
    };

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_pos_size(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_pos_size(Vec2::new(10.0, 5.0), Vec2::splat(10.0));
        let c = Aabb::from_pos_size(Vec2::new(11.0, 0.0), Vec2::splat(10.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_gap_is_safe_segments_are_not() {
        let config = CollisionConfig::default();
        let pair = pair_at_player();
        assert_eq!(
            obstacle_contact(&player_at(250.0, 1.0), &pair, &DEFAULT, &config),
            ObstacleContact::None
        );
        assert_eq!(
            obstacle_contact(&player_at(140.0, 1.0), &pair, &DEFAULT, &config),
            ObstacleContact::Lethal
        );
        assert_eq!(
            obstacle_contact(&player_at(350.0, 1.0), &pair, &DEFAULT, &config),
            ObstacleContact::Lethal
        );
    }

    #[test]
    fn test_intangible_ignores_obstacles_and_bosses() {
        let config = CollisionConfig::default();
        let player = player_at(350.0, -2.0);
        assert_eq!(
            obstacle_contact(&player, &pair_at_player(), &GHOST, &config),
            ObstacleContact::None
        );
        assert_eq!(boss_contact(&player, &boss_at(300.0), &GHOST), BossContact::None);
    }

    #[test]
    fn test_perch_on_lower_segment_during_evasion() {
        let config = CollisionConfig::default();
        let mut player = player_at(370.0 - 24.0 + 10.0, 3.0);
        let pairs = [pair_at_player()];

        assert_eq!(resolve_obstacles(&mut player, &pairs, &EVASION, &config), None);
        assert_eq!(player.bottom(), 370.0);
        assert_eq!(player.vel, 0.0);
    }

    #[test]
    fn test_perch_band_edge_is_a_hit_without_evasion() {
        let config = CollisionConfig::default();
        let mut player = player_at(370.0 - 24.0 + 10.0, 3.0);
        let pairs = [pair_at_player()];
        assert_eq!(
            resolve_obstacles(&mut player, &pairs, &DEFAULT, &config),
            Some(DeathCause::Obstacle)
        );
    }

    #[test]
    fn test_stomp_from_above_and_side_hit() {
        // Player top (280) above boss top (290) while falling
        assert_eq!(
            boss_contact(&player_at(280.0, 2.0), &boss_at(290.0), &DEFAULT),
            BossContact::Stomp
        );
        // Rising into the boss
        assert_eq!(
            boss_contact(&player_at(300.0, -2.0), &boss_at(290.0), &DEFAULT),
            BossContact::Lethal
        );
        assert_eq!(
            boss_contact(&player_at(300.0, -2.0), &boss_at(290.0), &EVASION),
            BossContact::None
        );
    }

    #[test]
    fn test_bounds_lethal_by_default() {
        let config = SimConfig::default();
        let mut player = player_at(540.0, 5.0);
        assert_eq!(resolve_bounds(&mut player, &DEFAULT, &config), Some(DeathCause::Ground));
        let mut player = player_at(-1.0, -5.0);
        assert_eq!(resolve_bounds(&mut player, &DEFAULT, &config), Some(DeathCause::Ceiling));
    }

    #[test]
    fn test_bounds_clamp_when_invincible() {
        let config = SimConfig::default();
        let mut player = player_at(545.0, 6.0);
        assert_eq!(resolve_bounds(&mut player, &EVASION, &config), None);
        assert_eq!(player.bottom(), 560.0);
        assert_eq!(player.vel, 6.0);

        let mut player = player_at(-3.0, -9.0);
        assert_eq!(resolve_bounds(&mut player, &EVASION, &config), None);
        assert_eq!(player.y, 5.0);
        assert_eq!(player.vel, 1.0);
    }

    #[test]
    fn test_bounds_still_lethal_when_only_intangible() {
        let config = SimConfig::default();
        let mut player = player_at(550.0, 5.0);
        assert_eq!(resolve_bounds(&mut player, &GHOST, &config), Some(DeathCause::Ground));
    }

    #[test]
    fn test_collected_token_is_not_hit_again() {
        let player = player_at(100.0, 0.0);
        let mut token = Token {
            id: 3,
            pos: Vec2::new(80.0, 100.0),
            size: 30.0,
            denomination: Denomination::Rare,
            collected: false,
            remove_at_ms: None,
            wind: false,
        };
        assert!(token_hit(&player, &token));
        token.collected = true;
        assert!(!token_hit(&player, &token));
    }
}
