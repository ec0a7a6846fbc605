//! Per-frame simulation tick
//!
//! Order within a tick: mode timers -> physics -> spawning -> collision ->
//! removal sweep. The `Simulation` facade owns the config, the run state
//! and the RNG, and is the only thing the presentation layer talks to.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::clock::FrameStep;
use super::collision::{
    BossContact, CollisionRules, boss_contact, resolve_bounds, resolve_obstacles, token_hit,
};
use super::ledger::{Denomination, Ledger, Wallet};
use super::modes::{Activation, ModeKind, ModeSnapshot, ModeUpdate, RejectReason};
use super::spawner::{run_spawners, spawn_boss_reward};
use super::state::{
    Boss, DeathCause, EntityKind, GameState, ObstaclePair, Player, RunPhase, RunSummary, SimEvent,
    Token,
};
use crate::config::{PhysicsProfile, SimConfig};

/// Advance a running game by one frame step
pub fn tick<R: Rng>(state: &mut GameState, config: &SimConfig, step: FrameStep, rng: &mut R) {
    if !state.is_running() {
        return;
    }

    state.ticks += 1;
    state.time_ms += step.ms;
    let now_ms = state.time_ms;

    // Ability timers, including chained effects of modes that just ended
    let update = state.modes.update(step.secs());
    apply_mode_update(state, config, update);

    // Physics
    let physics = state.modes.physics(&config.physics);
    integrate_player(&mut state.player, &physics, step.dt);
    state.registry.scroll(physics.scroll_speed * step.dt);
    score_passed_obstacles(state);

    // Spawning
    let spawned = run_spawners(
        &mut state.registry,
        &mut state.timers,
        &state.modes,
        config,
        now_ms,
        rng,
    );
    for (id, kind) in spawned {
        state.emit(SimEvent::EntitySpawned { id, kind });
    }

    // Collision
    let rules = CollisionRules::from_modes(&state.modes);
    if let Some(cause) = collide(state, config, &rules, &physics, now_ms) {
        end_run(state, config, cause);
        return;
    }

    for (id, kind) in state.registry.sweep(now_ms) {
        state.emit(SimEvent::EntityRemoved { id, kind });
    }
}

/// Report mode transitions and carry out the obstacle clearing they request
fn apply_mode_update(state: &mut GameState, config: &SimConfig, update: ModeUpdate) {
    for event in update.events {
        state.emit(event);
    }
    if update.clear_obstacles {
        clear_obstacles_near_player(state, config);
    }
}

/// Gravity, fall-speed cap and vertical motion
pub fn integrate_player(player: &mut Player, physics: &PhysicsProfile, dt: f32) {
    player.vel = (player.vel + physics.gravity * dt).min(physics.max_fall_speed);
    player.y += player.vel * dt;
    player.update_rotation();
}

/// Mark pairs whose trailing edge the player has passed; one point each
pub fn score_passed_obstacles(state: &mut GameState) {
    let player_x = state.player.x;
    for pair in &mut state.registry.obstacles {
        if !pair.passed && pair.right() < player_x {
            pair.passed = true;
            let distance = state.ledger.add_distance();
            state.events.push(SimEvent::ObstaclePassed {
                id: pair.id,
                distance,
            });
        }
    }
}

/// Remove the nearest pairs ahead of and just behind the player so the end of
/// invincibility is survivable
pub fn clear_obstacles_near_player(state: &mut GameState, config: &SimConfig) {
    let clearing = &config.modes.clearing;
    let player = &state.player;

    let mut ahead: Vec<&ObstaclePair> = state
        .registry
        .obstacles
        .iter()
        .filter(|p| p.x > player.right())
        .collect();
    ahead.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut behind: Vec<&ObstaclePair> = state
        .registry
        .obstacles
        .iter()
        .filter(|p| p.right() < player.x && p.right() > player.x - clearing.behind_window)
        .collect();
    behind.sort_by(|a, b| b.right().total_cmp(&a.right()));

    let ids: Vec<u32> = ahead
        .iter()
        .take(clearing.ahead)
        .chain(behind.iter().take(clearing.behind))
        .map(|p| p.id)
        .collect();

    for id in state.registry.remove_obstacles(&ids) {
        log::debug!("Cleared obstacle {} near player", id);
        state.emit(SimEvent::EntityRemoved {
            id,
            kind: EntityKind::Obstacle,
        });
    }
}

/// Bosses, then tokens, then boundaries and obstacles
fn collide(
    state: &mut GameState,
    config: &SimConfig,
    rules: &CollisionRules,
    physics: &PhysicsProfile,
    now_ms: f64,
) -> Option<DeathCause> {
    for i in 0..state.registry.bosses.len() {
        match boss_contact(&state.player, &state.registry.bosses[i], rules) {
            BossContact::None => {}
            BossContact::Stomp => defeat_boss(state, config, i, physics, now_ms),
            BossContact::Lethal => return Some(DeathCause::Boss),
        }
    }

    for i in 0..state.registry.tokens.len() {
        if token_hit(&state.player, &state.registry.tokens[i]) {
            collect_token(state, config, i, now_ms);
        }
    }

    if let Some(cause) = resolve_bounds(&mut state.player, rules, config) {
        return Some(cause);
    }
    resolve_obstacles(
        &mut state.player,
        &state.registry.obstacles,
        rules,
        &config.collision,
    )
}

fn defeat_boss(
    state: &mut GameState,
    config: &SimConfig,
    index: usize,
    physics: &PhysicsProfile,
    now_ms: f64,
) {
    let boss: &mut Boss = &mut state.registry.bosses[index];
    boss.defeated = true;
    boss.remove_at_ms = Some(now_ms + config.bosses.removal_delay_ms);
    let (boss_id, pos) = (boss.id, boss.pos);

    let reward = spawn_boss_reward(&mut state.registry, config, pos);
    state.player.vel = physics.jump_impulse * config.bosses.bounce_factor;
    log::debug!("Boss {} defeated, reward token {}", boss_id, reward);

    state.emit(SimEvent::BossDefeated { id: boss_id });
    state.emit(SimEvent::EntitySpawned {
        id: reward,
        kind: EntityKind::Token(Denomination::Windfall),
    });
}

fn collect_token(state: &mut GameState, config: &SimConfig, index: usize, now_ms: f64) {
    let token: &mut Token = &mut state.registry.tokens[index];
    token.collected = true;
    token.remove_at_ms = Some(now_ms + config.tokens.removal_delay_ms);
    let (id, denomination) = (token.id, token.denomination);

    state.ledger.credit(denomination);
    state.emit(SimEvent::TokenCollected {
        id,
        denomination,
        value: config.values.value(denomination),
    });
}

fn end_run(state: &mut GameState, config: &SimConfig, cause: DeathCause) {
    let final_score = state.ledger.final_score(&config.values);
    let counts = state.ledger.collected();
    state.phase = RunPhase::Ended;
    state.summary = Some(RunSummary {
        final_score,
        distance: state.ledger.distance(),
        counts,
        cause,
        ticks: state.ticks,
    });
    log::info!(
        "Run ended by {:?} after {} ticks: score {} (distance {})",
        cause,
        state.ticks,
        final_score,
        state.ledger.distance()
    );
    state.emit(SimEvent::RunEnded {
        final_score,
        counts,
        cause,
    });
}

/// The simulation core: owns config, run state and RNG
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    state: GameState,
    rng: Pcg32,
    seed: u64,
    runs: u64,
}

impl Simulation {
    pub fn new(config: SimConfig, seed: u64) -> Self {
        config.validate();
        let state = GameState::new(&config);
        Self {
            config,
            state,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            runs: 0,
        }
    }

    /// Begin a new run, discarding everything owned by the previous one
    pub fn start(&mut self) {
        let run_seed = self.seed.wrapping_add(self.runs);
        self.runs += 1;
        self.rng = Pcg32::seed_from_u64(run_seed);
        self.state = GameState::new(&self.config);
        self.state.phase = RunPhase::Running;
        log::info!("Run {} started (seed {})", self.runs, run_seed);
    }

    /// Advance by the wall time since the previous frame
    pub fn tick(&mut self, elapsed_ms: f64) {
        self.step(FrameStep::from_elapsed_ms(elapsed_ms));
    }

    /// Advance by an already normalized step
    pub fn step(&mut self, step: FrameStep) {
        tick(&mut self.state, &self.config, step, &mut self.rng);
    }

    /// Set the player's velocity to the current jump impulse
    pub fn request_jump(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }
        let physics = self.state.modes.physics(&self.config.physics);
        self.state.player.vel = physics.jump_impulse;
        self.state.player.update_rotation();
        self.state.emit(SimEvent::Jumped);
        true
    }

    /// Paid activation of a mode; rejected requests change nothing
    pub fn request_activate(&mut self, mode: ModeKind) -> Activation {
        if !self.state.is_running() {
            return Activation::Rejected(RejectReason::NotRunning);
        }
        let result = self.state.modes.try_activate(mode, &mut self.state.ledger);
        match result {
            Activation::Activated => {
                log::info!("{} activated", mode.as_str());
                self.state.emit(SimEvent::ModeActivated { mode, free: false });
            }
            Activation::Rejected(reason) => {
                log::debug!("{} activation rejected: {:?}", mode.as_str(), reason);
            }
        }
        result
    }

    /// Switch an active mode off early. End-of-mode effects run exactly as on
    /// natural expiry. Returns false if the mode was not active.
    pub fn force_off(&mut self, mode: ModeKind) -> bool {
        if !self.state.is_running() || !self.state.modes.is_active(mode) {
            return false;
        }
        let update = self.state.modes.force_off(mode);
        apply_mode_update(&mut self.state, &self.config, update);
        log::info!("{} switched off", mode.as_str());
        true
    }

    /// Take all events produced since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.state.events)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase
    }

    pub fn player(&self) -> &Player {
        &self.state.player
    }

    pub fn obstacles(&self) -> &[ObstaclePair] {
        &self.state.registry.obstacles
    }

    pub fn tokens(&self) -> &[Token] {
        &self.state.registry.tokens
    }

    pub fn bosses(&self) -> &[Boss] {
        &self.state.registry.bosses
    }

    pub fn modes(&self) -> Vec<ModeSnapshot> {
        self.state.modes.snapshot(&self.state.ledger)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn balances(&self) -> Wallet {
        self.state.ledger.balances()
    }

    /// Physics constants in effect right now
    pub fn physics(&self) -> PhysicsProfile {
        self.state.modes.physics(&self.config.physics)
    }

    pub fn summary(&self) -> Option<&RunSummary> {
        self.state.summary.as_ref()
    }
}
