//! Simulation tunables
//!
//! Every constant the simulation uses lives here with its tuned default.
//! Sections are `#[serde(default)]`, so a JSON override only
//! needs the fields it changes.

use serde::{Deserialize, Serialize};

use crate::sim::ledger::{TokenValues, Wallet};
use crate::sim::modes::{ModeKind, ModeSpec, PhysicsOverride};

/// Depth below the top edge of a lower obstacle segment that still counts as
/// a perch while Evasion is active
pub const PERCH_BAND: f32 = 20.0;

/// Play area geometry (y grows downward, top edge is 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Height of the ground strip at the bottom of the play area
    pub ground_height: f32,
    /// Player's horizontal position as a fraction of the width
    pub player_x_frac: f32,
    pub player_width: f32,
    pub player_height: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 640.0,
            ground_height: 80.0,
            player_x_frac: 0.15,
            player_width: 34.0,
            player_height: 24.0,
        }
    }
}

impl ArenaConfig {
    /// Y coordinate of the ground surface
    pub fn floor_y(&self) -> f32 {
        self.height - self.ground_height
    }

    /// Left edge of the player
    pub fn player_x(&self) -> f32 {
        self.width * self.player_x_frac
    }
}

/// Physics constants in effect for a tick. The config holds the baseline;
/// active modes may substitute their own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsProfile {
    /// Added to velocity each normalized frame
    pub gravity: f32,
    /// Velocity set by a jump (negative = up)
    pub jump_impulse: f32,
    pub max_fall_speed: f32,
    /// Horizontal scroll in pixels per normalized frame
    pub scroll_speed: f32,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            gravity: 0.25,
            jump_impulse: -7.0,
            max_fall_speed: 7.0,
            scroll_speed: 2.0,
        }
    }
}

/// Vertical band that spawned tokens and bosses must stay within
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeBand {
    /// Smallest allowed y
    pub top: f32,
    /// Distance kept above the ground surface
    pub floor_margin: f32,
}

impl Default for SafeBand {
    fn default() -> Self {
        Self {
            top: 80.0,
            floor_margin: 140.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub width: f32,
    /// Vertical opening between the two segments
    pub gap: f32,
    pub interval_ms: f64,
    /// Space kept between the gap and the ground
    pub floor_clearance: f32,
    /// Shortest allowed upper segment
    pub min_segment: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            width: 80.0,
            gap: 220.0,
            interval_ms: 2500.0,
            floor_clearance: 80.0,
            min_segment: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub size: f32,
    pub interval_ms: f64,
    pub rare_chance: f64,
    pub bonus_chance: f64,
    /// Random extra distance beyond the right edge
    pub x_jitter: f32,
    /// Delay between collection and removal (collection animation)
    pub removal_delay_ms: f64,
    pub band: SafeBand,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            size: 30.0,
            interval_ms: 1500.0,
            rare_chance: 0.15,
            bonus_chance: 0.0,
            x_jitter: 100.0,
            removal_delay_ms: 300.0,
            band: SafeBand::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    pub width: f32,
    pub height: f32,
    pub interval_ms: f64,
    pub chance: f64,
    pub removal_delay_ms: f64,
    /// Fraction of the jump impulse given to the player after a stomp
    pub bounce_factor: f32,
    pub band: SafeBand,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 110.0,
            interval_ms: 2000.0,
            chance: 0.80,
            removal_delay_ms: 1000.0,
            bounce_factor: 0.7,
            band: SafeBand::default(),
        }
    }
}

/// Token wind spawned while Windfall is active
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    pub interval_ms: f64,
    pub chance: f64,
    pub rare_chance: f64,
    /// Distance beyond the right edge
    pub edge_offset: f32,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            interval_ms: 400.0,
            chance: 0.7,
            rare_chance: 0.2,
            edge_offset: 20.0,
        }
    }
}

/// Obstacle clearing performed when Evasion ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearingConfig {
    pub ahead: usize,
    pub behind: usize,
    /// Only trailing pairs whose right edge is this close behind the player
    pub behind_window: f32,
}

impl Default for ClearingConfig {
    fn default() -> Self {
        Self {
            ahead: 2,
            behind: 1,
            behind_window: 300.0,
        }
    }
}

/// Tunable parts of one mode. Unset fields keep the mode's built-in value.
/// Prerequisite, traits and end-of-mode effects belong to the mode kind and
/// cannot be overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTuning {
    pub duration_secs: Option<f32>,
    pub cooldown_secs: Option<f32>,
    /// Replaces the whole cost vector
    pub cost: Option<Wallet>,
    /// Replaces the physics applied while the mode is active
    pub physics: Option<PhysicsOverride>,
}

impl ModeTuning {
    /// Overlay the set fields on a built-in spec
    pub fn apply(&self, mut spec: ModeSpec) -> ModeSpec {
        if let Some(duration) = self.duration_secs {
            spec.duration_secs = duration;
        }
        if let Some(cooldown) = self.cooldown_secs {
            spec.cooldown_secs = cooldown;
        }
        if let Some(cost) = self.cost {
            spec.cost = cost;
        }
        if self.physics.is_some() {
            spec.physics = self.physics;
        }
        spec
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModesConfig {
    pub evasion: ModeTuning,
    pub intangibility: ModeTuning,
    pub windfall: ModeTuning,
    pub clearing: ClearingConfig,
}

impl ModesConfig {
    /// Built-in spec of `kind` with this config's overrides applied
    pub fn spec(&self, kind: ModeKind) -> ModeSpec {
        let tuning = match kind {
            ModeKind::Evasion => &self.evasion,
            ModeKind::Intangibility => &self.intangibility,
            ModeKind::Windfall => &self.windfall,
        };
        tuning.apply(ModeSpec::for_kind(kind))
    }
}

/// Collision response constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub perch_band: f32,
    /// Where an invincible player is put back after touching the ceiling
    pub ceiling_nudge_y: f32,
    /// Downward velocity given after the ceiling nudge
    pub ceiling_nudge_velocity: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            perch_band: PERCH_BAND,
            ceiling_nudge_y: 5.0,
            ceiling_nudge_velocity: 1.0,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub arena: ArenaConfig,
    pub physics: PhysicsProfile,
    pub obstacles: ObstacleConfig,
    pub tokens: TokenConfig,
    pub bosses: BossConfig,
    pub wind: WindConfig,
    pub values: TokenValues,
    pub modes: ModesConfig,
    pub collision: CollisionConfig,
}

/// Settings that are accepted but leave part of the game inert
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// The arena is too short for any obstacle gap
    NoObstacleSlot { max_segment: f32, min_segment: f32 },
    /// The token/boss band is empty
    EmptySpawnBand { top: f32, bottom: f32 },
    /// Fall speed cap is not positive
    NonPositiveFallCap(f32),
}

impl SimConfig {
    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Largest upper segment height an obstacle may get
    pub fn max_obstacle_segment(&self) -> f32 {
        self.arena.floor_y() - self.obstacles.gap - self.obstacles.floor_clearance
    }

    /// Lowest and highest y for a spawn band
    pub fn band_range(&self, band: &SafeBand) -> (f32, f32) {
        (band.top, self.arena.floor_y() - band.floor_margin)
    }

    /// Report settings that make spawning impossible. Nothing is changed; the
    /// spawner skips infeasible spawns at runtime either way.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let max_segment = self.max_obstacle_segment();
        if max_segment < self.obstacles.min_segment {
            warnings.push(ConfigWarning::NoObstacleSlot {
                max_segment,
                min_segment: self.obstacles.min_segment,
            });
        }
        for band in [&self.tokens.band, &self.bosses.band] {
            let (top, bottom) = self.band_range(band);
            if bottom < top {
                warnings.push(ConfigWarning::EmptySpawnBand { top, bottom });
            }
        }
        if self.physics.max_fall_speed <= 0.0 {
            warnings.push(ConfigWarning::NonPositiveFallCap(self.physics.max_fall_speed));
        }

        for warning in &warnings {
            log::warn!("Config: {:?}", warning);
        }
        warnings
    }
}
