//! Sky Dodge headless runner
//!
//! Plays one seeded run with a simple autopilot at a synthetic 60 Hz and
//! prints the end-of-run summary as JSON.
//!
//! Usage: `sky-dodge [seed] [max_frames] [config.json]`

use std::error::Error;

use sky_dodge::consts::FRAME_MS;
use sky_dodge::sim::{ModeStatus, RunPhase, SimEvent};
use sky_dodge::{SimConfig, Simulation};

const DEFAULT_SEED: u64 = 42;
const DEFAULT_MAX_FRAMES: u64 = 60 * 60 * 5;

struct Args {
    seed: u64,
    max_frames: u64,
    config_path: Option<String>,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse()?,
        None => DEFAULT_SEED,
    };
    let max_frames = match args.next() {
        Some(s) => s.parse()?,
        None => DEFAULT_MAX_FRAMES,
    };
    Ok(Args {
        seed,
        max_frames,
        config_path: args.next(),
    })
}

fn load_config(path: Option<&str>) -> Result<SimConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let json = std::fs::read_to_string(path)?;
    let config = SimConfig::from_json(&json)?;
    log::info!("Loaded config from {}", path);
    Ok(config)
}

/// Jump when sinking below the centre of the next gap; buy any mode on offer
fn autopilot(sim: &mut Simulation) {
    let player = sim.player();
    let centre = player.y + player.height / 2.0;
    let target = sim
        .obstacles()
        .iter()
        .find(|p| p.right() >= player.x)
        .map(|p| p.gap_top + p.gap / 2.0)
        .unwrap_or(sim.config().arena.floor_y() / 2.0);
    let sinking = player.vel > 0.0 && centre > target;

    let available: Vec<_> = sim
        .modes()
        .into_iter()
        .filter(|m| m.status == ModeStatus::Available)
        .map(|m| m.kind)
        .collect();

    if sinking {
        sim.request_jump();
    }
    for kind in available {
        sim.request_activate(kind);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = parse_args()?;
    let config = load_config(args.config_path.as_deref())?;
    log::info!("Sky Dodge (headless) starting, seed {}", args.seed);

    let mut sim = Simulation::new(config, args.seed);
    sim.start();

    let mut frames = 0;
    while frames < args.max_frames && sim.phase() == RunPhase::Running {
        autopilot(&mut sim);
        sim.tick(FRAME_MS);
        frames += 1;

        for event in sim.drain_events() {
            match event {
                SimEvent::ModeActivated { mode, free } => {
                    log::info!("frame {}: {} on (free: {})", frames, mode.as_str(), free)
                }
                SimEvent::ModeExpired { mode } => {
                    log::info!("frame {}: {} off", frames, mode.as_str())
                }
                SimEvent::BossDefeated { id } => {
                    log::info!("frame {}: boss {} defeated", frames, id)
                }
                other => log::trace!("frame {}: {:?}", frames, other),
            }
        }
    }

    let output = match sim.summary() {
        Some(summary) => serde_json::to_string_pretty(summary)?,
        None => {
            log::info!("Frame cap reached with the run still in progress");
            serde_json::to_string_pretty(&serde_json::json!({
                "in_progress": true,
                "frames": frames,
                "distance": sim.ledger().distance(),
                "balances": sim.balances(),
            }))?
        }
    };
    println!("{}", output);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is embedded by a host page; there is no native runner
}
