//! Game state and core simulation types
//!
//! All state owned by a single run lives here. Starting a new run replaces
//! the whole `GameState`, which drops every pending removal and spawn timer
//! of the previous run along with it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::ledger::{Denomination, Ledger, Wallet};
use super::modes::{ModeEvent, ModeKind, ModeSet};
use super::spawner::SpawnTimers;
use crate::config::{ArenaConfig, SimConfig};
use crate::consts::{MAX_ROTATION_DEG, ROTATION_PER_VELOCITY};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// No run started yet
    Ready,
    Running,
    /// Lethal collision happened; ticks are ignored until `start`
    Ended,
}

/// What ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Ground,
    Ceiling,
    Obstacle,
    Boss,
}

/// The flying entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Left edge (fixed for the run)
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Vertical velocity in pixels per normalized frame (positive = down)
    pub vel: f32,
    pub width: f32,
    pub height: f32,
    /// Visual tilt in degrees, derived from velocity
    pub rotation: f32,
}

impl Player {
    pub fn new(arena: &ArenaConfig) -> Self {
        Self {
            x: arena.player_x(),
            y: arena.height / 2.0,
            vel: 0.0,
            width: arena.player_width,
            height: arena.player_height,
            rotation: 0.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(Vec2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn update_rotation(&mut self) {
        self.rotation =
            (self.vel * ROTATION_PER_VELOCITY).clamp(-MAX_ROTATION_DEG, MAX_ROTATION_DEG);
    }
}

/// An upper and a lower segment with a gap between them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstaclePair {
    pub id: u32,
    /// Left edge
    pub x: f32,
    pub width: f32,
    /// Bottom of the upper segment
    pub gap_top: f32,
    pub gap: f32,
    /// Bottom of the lower segment (ground surface)
    pub floor_y: f32,
    /// Set once when the player gets past the trailing edge
    pub passed: bool,
}

impl ObstaclePair {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top edge of the lower segment
    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap
    }

    pub fn upper(&self) -> Aabb {
        Aabb::new(Vec2::new(self.x, 0.0), Vec2::new(self.right(), self.gap_top))
    }

    pub fn lower(&self) -> Aabb {
        Aabb::new(
            Vec2::new(self.x, self.gap_bottom()),
            Vec2::new(self.right(), self.floor_y),
        )
    }
}

/// A collectible currency token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: f32,
    pub denomination: Denomination,
    pub collected: bool,
    /// Simulation time at which a collected token disappears
    pub remove_at_ms: Option<f64>,
    /// Spawned by the Windfall token wind
    pub wind: bool,
}

impl Token {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, Vec2::splat(self.size))
    }
}

/// A boss creature, spawned during Evasion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub defeated: bool,
    /// Simulation time at which a defeated boss disappears
    pub remove_at_ms: Option<f64>,
}

impl Boss {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// Entity categories reported to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle,
    Token(Denomination),
    Boss,
}

/// Live entity collections of one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    pub obstacles: Vec<ObstaclePair>,
    pub tokens: Vec<Token>,
    pub bosses: Vec<Boss>,
    next_id: u32,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty() && self.tokens.is_empty() && self.bosses.is_empty()
    }

    /// Move every entity left by `dx`
    pub fn scroll(&mut self, dx: f32) {
        for pair in &mut self.obstacles {
            pair.x -= dx;
        }
        for token in &mut self.tokens {
            token.pos.x -= dx;
        }
        for boss in &mut self.bosses {
            boss.pos.x -= dx;
        }
    }

    /// Drop entities that left the screen or whose removal delay ran out.
    /// Returns what was removed, in collection order.
    pub fn sweep(&mut self, now_ms: f64) -> Vec<(u32, EntityKind)> {
        let mut removed = Vec::new();
        let expired = |at: Option<f64>| at.is_some_and(|t| now_ms >= t);

        self.obstacles.retain(|p| {
            let keep = p.right() >= 0.0;
            if !keep {
                removed.push((p.id, EntityKind::Obstacle));
            }
            keep
        });
        self.tokens.retain(|t| {
            let keep = !expired(t.remove_at_ms) && (t.collected || t.pos.x + t.size >= 0.0);
            if !keep {
                removed.push((t.id, EntityKind::Token(t.denomination)));
            }
            keep
        });
        self.bosses.retain(|b| {
            let keep = !expired(b.remove_at_ms) && (b.defeated || b.pos.x + b.size.x >= 0.0);
            if !keep {
                removed.push((b.id, EntityKind::Boss));
            }
            keep
        });

        removed
    }

    /// Remove the given obstacle pairs, returning the IDs actually removed
    pub fn remove_obstacles(&mut self, ids: &[u32]) -> Vec<u32> {
        let mut removed = Vec::new();
        self.obstacles.retain(|p| {
            let keep = !ids.contains(&p.id);
            if !keep {
                removed.push(p.id);
            }
            keep
        });
        removed
    }
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub final_score: u64,
    pub distance: u64,
    /// Tokens collected over the whole run per denomination
    pub counts: Wallet,
    pub cause: DeathCause,
    pub ticks: u64,
}

/// Outcome notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    EntitySpawned { id: u32, kind: EntityKind },
    EntityRemoved { id: u32, kind: EntityKind },
    TokenCollected { id: u32, denomination: Denomination, value: u64 },
    BossDefeated { id: u32 },
    ObstaclePassed { id: u32, distance: u64 },
    Jumped,
    ModeActivated { mode: ModeKind, free: bool },
    ModeExpired { mode: ModeKind },
    ModeReady { mode: ModeKind },
    RunEnded { final_score: u64, counts: Wallet, cause: DeathCause },
}

impl From<ModeEvent> for SimEvent {
    fn from(event: ModeEvent) -> Self {
        match event {
            ModeEvent::Activated { mode, free } => SimEvent::ModeActivated { mode, free },
            ModeEvent::Expired { mode } => SimEvent::ModeExpired { mode },
            ModeEvent::Ready { mode } => SimEvent::ModeReady { mode },
        }
    }
}

/// Complete state of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: RunPhase,
    /// Simulation time in milliseconds (advances by clamped frame time)
    pub time_ms: f64,
    /// Simulation tick counter
    pub ticks: u64,
    pub player: Player,
    pub registry: Registry,
    pub ledger: Ledger,
    pub modes: ModeSet,
    pub timers: SpawnTimers,
    pub summary: Option<RunSummary>,
    /// Events not yet drained by the presentation layer
    #[serde(skip)]
    pub events: Vec<SimEvent>,
}

impl GameState {
    /// Fresh state for a new run
    pub fn new(config: &SimConfig) -> Self {
        Self {
            phase: RunPhase::Ready,
            time_ms: 0.0,
            ticks: 0,
            player: Player::new(&config.arena),
            registry: Registry::new(),
            ledger: Ledger::new(),
            modes: ModeSet::new(&config.modes),
            timers: SpawnTimers::default(),
            summary: None,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: impl Into<SimEvent>) {
        self.events.push(event.into());
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: u32, x: f32) -> Token {
        Token {
            id,
            pos: Vec2::new(x, 100.0),
            size: 30.0,
            denomination: Denomination::Common,
            collected: false,
            remove_at_ms: None,
            wind: false,
        }
    }

    #[test]
    fn test_rotation_is_clamped() {
        let mut player = Player::new(&ArenaConfig::default());
        player.vel = 7.0;
        player.update_rotation();
        assert_eq!(player.rotation, 14.0);
        player.vel = -40.0;
        player.update_rotation();
        assert_eq!(player.rotation, -30.0);
    }

    #[test]
    fn test_obstacle_segments() {
        let pair = ObstaclePair {
            id: 1,
            x: 100.0,
            width: 80.0,
            gap_top: 150.0,
            gap: 220.0,
            floor_y: 560.0,
            passed: false,
        };
        assert_eq!(pair.upper().max.y, 150.0);
        assert_eq!(pair.lower().min.y, 370.0);
        assert_eq!(pair.lower().max, Vec2::new(180.0, 560.0));
    }

    #[test]
    fn test_sweep_respects_removal_delay() {
        let mut registry = Registry::new();
        let mut collected = token(1, 50.0);
        collected.collected = true;
        collected.remove_at_ms = Some(300.0);
        registry.tokens.push(collected);
        registry.tokens.push(token(2, -31.0));
        registry.tokens.push(token(3, 200.0));

        let removed = registry.sweep(100.0);
        assert_eq!(removed, vec![(2, EntityKind::Token(Denomination::Common))]);
        assert_eq!(registry.tokens.len(), 2);

        let removed = registry.sweep(300.0);
        assert_eq!(removed, vec![(1, EntityKind::Token(Denomination::Common))]);
        assert_eq!(registry.tokens.len(), 1);
    }

    #[test]
    fn test_defeated_boss_waits_for_delay_even_offscreen() {
        let mut registry = Registry::new();
        registry.bosses.push(Boss {
            id: 7,
            pos: Vec2::new(-500.0, 100.0),
            size: Vec2::new(100.0, 110.0),
            defeated: true,
            remove_at_ms: Some(1000.0),
        });
        assert!(registry.sweep(999.0).is_empty());
        assert_eq!(registry.sweep(1000.0), vec![(7, EntityKind::Boss)]);
    }

    #[test]
    fn test_entity_ids_are_monotonic() {
        let mut registry = Registry::new();
        assert_eq!(registry.next_entity_id(), 1);
        assert_eq!(registry.next_entity_id(), 2);
    }
}
