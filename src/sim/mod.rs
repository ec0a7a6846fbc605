//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters through normalized frame steps
//! - Seeded RNG only
//! - Stable iteration order (spawn order, ids ascending)
//! - No rendering, audio or platform dependencies

pub mod clock;
pub mod collision;
pub mod ledger;
pub mod modes;
pub mod spawner;
pub mod state;
pub mod tick;

pub use clock::FrameStep;
pub use collision::{Aabb, BossContact, CollisionRules, ObstacleContact};
pub use ledger::{Denomination, Ledger, TokenValues, Wallet};
pub use modes::{Activation, ModeKind, ModePhase, ModeSnapshot, ModeSpec, ModeStatus, RejectReason};
pub use spawner::SpawnTimers;
pub use state::{
    Boss, DeathCause, EntityKind, GameState, ObstaclePair, Player, Registry, RunPhase, RunSummary,
    SimEvent, Token,
};
pub use tick::{Simulation, tick};
