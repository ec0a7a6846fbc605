//! Timed special abilities
//!
//! Every mode is the same small machine: Idle -> Active -> Cooling -> Idle.
//! What makes Evasion, Intangibility and Windfall different is data carried in
//! their [`ModeSpec`]: cost, timings, the physics override applied while
//! active, collision/spawn traits, and the effects emitted when the mode ends.
//!
//! End-of-mode effects (free chained activations, forced shutdowns, obstacle
//! clearing) are queued and worked off inside the same `update` call instead
//! of calling back into activation code re-entrantly.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::ledger::{Ledger, Wallet};
use crate::config::{ModesConfig, PhysicsProfile};

/// The three special abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    /// Invincible, faster and floatier; bosses appear
    Evasion,
    /// Pass through obstacles and bosses
    Intangibility,
    /// Token wind; only available inside Evasion
    Windfall,
}

impl ModeKind {
    pub const ALL: [ModeKind; 3] = [ModeKind::Evasion, ModeKind::Intangibility, ModeKind::Windfall];

    fn index(self) -> usize {
        match self {
            ModeKind::Evasion => 0,
            ModeKind::Intangibility => 1,
            ModeKind::Windfall => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKind::Evasion => "Evasion",
            ModeKind::Intangibility => "Intangibility",
            ModeKind::Windfall => "Windfall",
        }
    }
}

/// Physics constants a mode replaces while it is active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsOverride {
    pub gravity: f32,
    pub jump_impulse: f32,
    /// Multiplies the baseline scroll speed
    pub scroll_multiplier: f32,
}

/// Collision and spawning rules switched on while a mode is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTraits {
    /// Boundaries, obstacles and bosses cannot end the run
    pub invincible: bool,
    /// Obstacle and boss collision is skipped entirely
    pub intangible: bool,
    /// Boss creatures may spawn
    pub spawns_bosses: bool,
    /// Periodic wind tokens spawn
    pub token_wind: bool,
    /// The top edge of a lower obstacle segment can be stood on
    pub perches: bool,
}

/// Side effect requested by a mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeEffect {
    /// Activate a mode at zero cost, ignoring its cooldown, unless already active
    GrantFree(ModeKind),
    /// Deactivate a mode if it is active
    ForceOff(ModeKind),
    /// Remove the obstacle pairs closest to the player
    ClearNearbyObstacles,
}

/// Static description of one mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSpec {
    pub duration_secs: f32,
    pub cooldown_secs: f32,
    pub cost: Wallet,
    /// Another mode that must be active for this one to be activated
    pub requires: Option<ModeKind>,
    pub physics: Option<PhysicsOverride>,
    pub traits: ModeTraits,
    /// Effects emitted when the mode leaves the Active state
    pub on_end: Vec<ModeEffect>,
}

impl ModeSpec {
    /// Built-in spec of a mode kind
    pub fn for_kind(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Evasion => Self::evasion(),
            ModeKind::Intangibility => Self::intangibility(),
            ModeKind::Windfall => Self::windfall(),
        }
    }

    pub fn evasion() -> Self {
        Self {
            duration_secs: 8.0,
            cooldown_secs: 5.0,
            cost: Wallet::new(3, 1, 0, 0),
            requires: None,
            physics: Some(PhysicsOverride {
                gravity: 0.20,
                jump_impulse: -11.0,
                scroll_multiplier: 2.0,
            }),
            traits: ModeTraits {
                invincible: true,
                spawns_bosses: true,
                perches: true,
                ..ModeTraits::default()
            },
            on_end: vec![
                ModeEffect::ClearNearbyObstacles,
                ModeEffect::ForceOff(ModeKind::Windfall),
                ModeEffect::GrantFree(ModeKind::Intangibility),
            ],
        }
    }

    pub fn intangibility() -> Self {
        Self {
            duration_secs: 5.0,
            cooldown_secs: 7.0,
            cost: Wallet::new(2, 0, 0, 0),
            requires: None,
            physics: None,
            traits: ModeTraits {
                intangible: true,
                ..ModeTraits::default()
            },
            on_end: Vec::new(),
        }
    }

    pub fn windfall() -> Self {
        Self {
            duration_secs: 6.0,
            cooldown_secs: 10.0,
            cost: Wallet::new(1, 1, 0, 1),
            requires: Some(ModeKind::Evasion),
            physics: None,
            traits: ModeTraits {
                token_wind: true,
                ..ModeTraits::default()
            },
            on_end: vec![ModeEffect::GrantFree(ModeKind::Intangibility)],
        }
    }
}

/// Timer state of a mode. Active and cooling are exclusive by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ModePhase {
    Idle,
    Active { remaining: f32 },
    Cooling { remaining: f32 },
}

/// Player-facing availability of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeStatus {
    Active,
    CoolingDown,
    /// A prerequisite mode is not active
    Locked,
    InsufficientFunds,
    Available,
}

/// Why an activation request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// No run in progress
    NotRunning,
    AlreadyActive,
    CoolingDown,
    RequiresMode(ModeKind),
    InsufficientFunds,
}

/// Result of an activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Activated,
    Rejected(RejectReason),
}

/// Mode transitions reported to the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeEvent {
    Activated { mode: ModeKind, free: bool },
    Expired { mode: ModeKind },
    Ready { mode: ModeKind },
}

/// Everything a timer pass produced
#[derive(Debug, Clone, Default)]
pub struct ModeUpdate {
    pub events: Vec<ModeEvent>,
    /// The obstacle pairs around the player should be cleared this tick
    pub clear_obstacles: bool,
}

/// Read-only view of one mode for HUD timers and buttons
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeSnapshot {
    pub kind: ModeKind,
    pub status: ModeStatus,
    pub remaining_secs: f32,
    pub cooldown_secs: f32,
    pub cost: Wallet,
}

/// One mode instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mode {
    pub kind: ModeKind,
    pub spec: ModeSpec,
    pub phase: ModePhase,
}

impl Mode {
    pub fn new(kind: ModeKind, spec: ModeSpec) -> Self {
        Self {
            kind,
            spec,
            phase: ModePhase::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, ModePhase::Active { .. })
    }

    pub fn is_cooling(&self) -> bool {
        matches!(self.phase, ModePhase::Cooling { .. })
    }

    pub fn remaining_secs(&self) -> f32 {
        match self.phase {
            ModePhase::Active { remaining } => remaining,
            _ => 0.0,
        }
    }

    pub fn cooldown_secs(&self) -> f32 {
        match self.phase {
            ModePhase::Cooling { remaining } => remaining,
            _ => 0.0,
        }
    }

    fn start(&mut self) {
        self.phase = ModePhase::Active {
            remaining: self.spec.duration_secs,
        };
    }

    /// Leave the Active state, entering cooldown (or Idle for a zero cooldown)
    fn stop(&mut self) {
        self.phase = if self.spec.cooldown_secs > 0.0 {
            ModePhase::Cooling {
                remaining: self.spec.cooldown_secs,
            }
        } else {
            ModePhase::Idle
        };
    }

    /// Count timers down by `dt_secs`. Returns the event for a phase change.
    fn advance(&mut self, dt_secs: f32) -> Option<ModeEvent> {
        match self.phase {
            ModePhase::Idle => None,
            ModePhase::Active { remaining } => {
                let remaining = remaining - dt_secs;
                if remaining <= 0.0 {
                    self.stop();
                    Some(ModeEvent::Expired { mode: self.kind })
                } else {
                    self.phase = ModePhase::Active { remaining };
                    None
                }
            }
            ModePhase::Cooling { remaining } => {
                let remaining = remaining - dt_secs;
                if remaining <= 0.0 {
                    self.phase = ModePhase::Idle;
                    Some(ModeEvent::Ready { mode: self.kind })
                } else {
                    self.phase = ModePhase::Cooling { remaining };
                    None
                }
            }
        }
    }
}

/// The three modes, iterated uniformly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeSet {
    modes: [Mode; 3],
}

impl ModeSet {
    pub fn new(config: &ModesConfig) -> Self {
        Self {
            modes: ModeKind::ALL.map(|kind| Mode::new(kind, config.spec(kind))),
        }
    }

    pub fn get(&self, kind: ModeKind) -> &Mode {
        &self.modes[kind.index()]
    }

    fn get_mut(&mut self, kind: ModeKind) -> &mut Mode {
        &mut self.modes[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mode> {
        self.modes.iter()
    }

    pub fn is_active(&self, kind: ModeKind) -> bool {
        self.get(kind).is_active()
    }

    fn prerequisite_missing(&self, kind: ModeKind) -> Option<ModeKind> {
        self.get(kind)
            .spec
            .requires
            .filter(|&required| !self.is_active(required))
    }

    pub fn status(&self, kind: ModeKind, ledger: &Ledger) -> ModeStatus {
        let mode = self.get(kind);
        if mode.is_active() {
            ModeStatus::Active
        } else if mode.is_cooling() {
            ModeStatus::CoolingDown
        } else if self.prerequisite_missing(kind).is_some() {
            ModeStatus::Locked
        } else if !ledger.can_afford(&mode.spec.cost) {
            ModeStatus::InsufficientFunds
        } else {
            ModeStatus::Available
        }
    }

    pub fn snapshot(&self, ledger: &Ledger) -> Vec<ModeSnapshot> {
        self.modes
            .iter()
            .map(|m| ModeSnapshot {
                kind: m.kind,
                status: self.status(m.kind, ledger),
                remaining_secs: m.remaining_secs(),
                cooldown_secs: m.cooldown_secs(),
                cost: m.spec.cost,
            })
            .collect()
    }

    /// Paid activation. Any failed precondition leaves the ledger and the
    /// mode untouched.
    pub fn try_activate(&mut self, kind: ModeKind, ledger: &mut Ledger) -> Activation {
        let mode = self.get(kind);
        if mode.is_active() {
            return Activation::Rejected(RejectReason::AlreadyActive);
        }
        if mode.is_cooling() {
            return Activation::Rejected(RejectReason::CoolingDown);
        }
        if let Some(required) = self.prerequisite_missing(kind) {
            return Activation::Rejected(RejectReason::RequiresMode(required));
        }
        let cost = mode.spec.cost;
        if !ledger.try_spend(&cost) {
            return Activation::Rejected(RejectReason::InsufficientFunds);
        }
        self.get_mut(kind).start();
        log::debug!("{} activated (cost {:?})", kind.as_str(), cost);
        Activation::Activated
    }

    /// Advance every timer, then work off the effects of any mode that ended
    pub fn update(&mut self, dt_secs: f32) -> ModeUpdate {
        let mut update = ModeUpdate::default();
        let mut queue = VecDeque::new();

        for mode in &mut self.modes {
            if let Some(event) = mode.advance(dt_secs) {
                if let ModeEvent::Expired { mode: kind } = event {
                    log::debug!("{} expired", kind.as_str());
                    queue.extend(mode.spec.on_end.iter().copied());
                }
                update.events.push(event);
            }
        }

        self.apply_effects(queue, &mut update);
        update
    }

    /// Deactivate a mode outside its natural expiry, running its end effects.
    /// The caller applies the returned update.
    pub(crate) fn force_off(&mut self, kind: ModeKind) -> ModeUpdate {
        let mut update = ModeUpdate::default();
        self.apply_effects(VecDeque::from([ModeEffect::ForceOff(kind)]), &mut update);
        update
    }

    fn apply_effects(&mut self, mut queue: VecDeque<ModeEffect>, update: &mut ModeUpdate) {
        while let Some(effect) = queue.pop_front() {
            match effect {
                ModeEffect::GrantFree(kind) => {
                    if self.is_active(kind) || self.prerequisite_missing(kind).is_some() {
                        continue;
                    }
                    self.get_mut(kind).start();
                    log::debug!("{} granted for free", kind.as_str());
                    update.events.push(ModeEvent::Activated { mode: kind, free: true });
                }
                ModeEffect::ForceOff(kind) => {
                    let mode = self.get_mut(kind);
                    if !mode.is_active() {
                        continue;
                    }
                    mode.stop();
                    log::debug!("{} forced off", kind.as_str());
                    queue.extend(mode.spec.on_end.iter().copied());
                    update.events.push(ModeEvent::Expired { mode: kind });
                }
                ModeEffect::ClearNearbyObstacles => update.clear_obstacles = true,
            }
        }
    }

    /// Baseline physics with the override of the first active mode that has one
    pub fn physics(&self, base: &PhysicsProfile) -> PhysicsProfile {
        self.modes
            .iter()
            .filter(|m| m.is_active())
            .find_map(|m| m.spec.physics)
            .map(|o| PhysicsProfile {
                gravity: o.gravity,
                jump_impulse: o.jump_impulse,
                max_fall_speed: base.max_fall_speed,
                scroll_speed: base.scroll_speed * o.scroll_multiplier,
            })
            .unwrap_or(*base)
    }

    fn any_active(&self, pred: impl Fn(&ModeTraits) -> bool) -> bool {
        self.modes.iter().any(|m| m.is_active() && pred(&m.spec.traits))
    }

    pub fn invincible(&self) -> bool {
        self.any_active(|t| t.invincible)
    }

    pub fn intangible(&self) -> bool {
        self.any_active(|t| t.intangible)
    }

    pub fn spawns_bosses(&self) -> bool {
        self.any_active(|t| t.spawns_bosses)
    }

    pub fn token_wind(&self) -> bool {
        self.any_active(|t| t.token_wind)
    }

    pub fn perches(&self) -> bool {
        self.any_active(|t| t.perches)
    }
}
