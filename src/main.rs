//! Position-based particle simulation
//!
//! Headless driver: pours a rainbow column of particles into a 200×200 box and
//! steps the engine at a fixed 60 Hz frame time. Emission stops once a frame
//! no longer fits the real-time budget or the particle capacity is reached.

use std::time::{Duration, Instant};

use particle_physics::Error as PhysicsError;
use particle_simulation::{Emitter, Error, Simulation, SimulationBackend, SimulationConfig};

const FRAME_DT: f32 = 1.0 / 60.0;
const FRAMES: u64 = 3_000;
const REPORT_EVERY: u64 = 120;
/// Wall-clock time one step may take at 60 FPS
const FRAME_BUDGET: Duration = Duration::from_micros(16_667);

fn run<B: SimulationBackend>(mut simulation: Simulation<B>) -> particle_simulation::Result<()> {
    let mut emitter = Emitter::new();
    let mut window_start = Instant::now();
    let mut contacts = 0;

    for frame in 0..FRAMES {
        match emitter.emit(&mut simulation, frame) {
            Ok(_) => {}
            Err(Error::Physics(PhysicsError::CapacityExceeded { capacity })) => {
                log::warn!("Capacity of {capacity} particles reached, emitter off");
                emitter.set_enabled(false);
            }
            Err(e) => return Err(e),
        }

        let report = simulation.step(FRAME_DT)?;
        contacts += report.contacts;

        if emitter.is_enabled() && report.elapsed > FRAME_BUDGET {
            log::info!(
                "Step took {:.2?} with {} particles, emitter off",
                report.elapsed,
                simulation.particle_count()
            );
            emitter.set_enabled(false);
        }

        if (frame + 1) % REPORT_EVERY == 0 {
            let window = window_start.elapsed();
            log::info!(
                "Frame {}: {} particles, {:.1} frames/s, {} contacts/frame",
                frame + 1,
                simulation.particle_count(),
                REPORT_EVERY as f64 / window.as_secs_f64(),
                contacts / REPORT_EVERY as usize
            );
            window_start = Instant::now();
            contacts = 0;
        }
    }

    log::info!(
        "✓ Finished {} frames with {} particles",
        simulation.frame(),
        simulation.particle_count()
    );
    Ok(())
}

#[cfg(feature = "gpu")]
fn start(config: SimulationConfig) -> particle_simulation::Result<()> {
    match Simulation::gpu(config.clone()) {
        Ok(simulation) => run(simulation),
        Err(e @ (Error::Adapter(_) | Error::Device(_))) => {
            log::warn!("GPU unavailable ({e}), falling back to the CPU backend");
            run(Simulation::cpu(config)?)
        }
        Err(e) => Err(e),
    }
}

#[cfg(not(feature = "gpu"))]
fn start(config: SimulationConfig) -> particle_simulation::Result<()> {
    run(Simulation::cpu(config)?)
}

fn main() {
    // Initialize logger (RUST_LOG=debug for per-frame output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle simulation...");

    if let Err(e) = start(SimulationConfig::default()) {
        log::error!("Simulation failed: {e}");
        std::process::exit(1);
    }
}
