//! `movekit` – headless movement-session demo.
//!
//! Runs one movement session against the simulated engine:
//!
//! 1. Loads `~/.movekit/config.toml` (or the path given as the first
//!    argument) and applies `MOVEKIT_*` overrides.
//! 2. Drives the controller at the configured frame rate with a scripted
//!    head / controller path, feeding simulated contacts when collisions are
//!    enabled.
//! 3. Ends the session gracefully and polls until the engine settles, or
//!    tears it down immediately on **Ctrl-C**.
//! 4. Prints a summary (`--json` for machine-readable output).
//!
//! `movekit --init [path]` writes the default configuration and exits.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use movekit_hal::ControlledObject;
use movekit_hal::sim::{SimEngine, SimObject};
use movekit_runtime::{MovementController, SessionState, telemetry};
use movekit_types::{
    Bounds, ContactEvent, ContactPoint, ControllerSample, FrameInput, InputDriver,
    InteractionMode, MovementColliderMarker, ObjectId, Pose, ProximityEvent, Quaternion,
    TouchSample, Vec2, Vec3,
};

use config::CliConfig;

const OBSTACLE: ObjectId = ObjectId(1);
const SHELF: ObjectId = ObjectId(2);

fn main() {
    let _guard = telemetry::init_tracing("movekit");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let json = args.iter().any(|a| a == "--json");
    let path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);

    if !json {
        print_banner();
    }
    if args.iter().any(|a| a == "--init") {
        if let Err(e) = config::save_to(&CliConfig::default(), &path) {
            eprintln!("{}: {e}", "Config error".red());
            std::process::exit(1);
        }
        println!("  Default config written to {}", path.display().to_string().bold());
        return;
    }
    let cfg = load_config(&path, json);

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; Ctrl-C will not tear the session down");
    }

    // The runtime is built after `init_tracing` so the span exporter never
    // depends on it.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to start runtime".red());
            std::process::exit(1);
        }
    };
    let summary = runtime.block_on(run(cfg, shutdown));

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(out) => println!("{out}"),
            Err(e) => eprintln!("{}: {e}", "Failed to encode summary".red()),
        }
    } else {
        print_summary(&summary);
    }
    if summary.error.is_some() {
        std::process::exit(2);
    }
}

fn load_config(path: &Path, quiet: bool) -> CliConfig {
    match config::load_from(path) {
        Ok(Some(cfg)) => {
            if !quiet {
                println!("  Config loaded from {}", path.display().to_string().bold());
            }
            cfg
        }
        Ok(None) => {
            if !quiet {
                println!(
                    "  No config at {}; using defaults.",
                    path.display().to_string().dimmed()
                );
            }
            let mut cfg = CliConfig::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            if !quiet {
                println!("{}: {e}", "Config error".red());
                println!("  Using default configuration.");
            }
            let mut cfg = CliConfig::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session loop
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RunSummary {
    mode: InteractionMode,
    driver: InputDriver,
    collisions_enabled: bool,
    frames: u32,
    end_polls: u32,
    interrupted: bool,
    final_state: String,
    enabled: bool,
    error: Option<String>,
    final_position: Vec3,
}

async fn run(cfg: CliConfig, shutdown: Arc<AtomicBool>) -> RunSummary {
    let dt = cfg.frame_dt();
    let movement = cfg.movement.clone();

    let mut object = SimObject::new(Pose::new(Vec3::new(0.0, 1.2, 1.5), Quaternion::identity()));
    if movement.collisions_enabled {
        object = object
            .with_rigidbody()
            .with_collider(Vec3::new(0.1, 0.1, 0.1));
    }
    let mut ctl = MovementController::new(movement.clone(), SimEngine::new(), object);
    let script = DemoScript::new(dt, cfg.frames);

    ctl.on_start(&script.frame(0));
    if ctl.state() == SessionState::ShutDown && ctl.is_enabled() {
        ctl.start_movement_session(&script.frame(0));
    }
    info!(mode = %movement.interaction_mode, driver = %movement.input_driver, "demo started");

    let mut ticker = tokio::time::interval(Duration::from_secs_f32(dt));
    let mut frames = 0;
    let mut interrupted = false;

    for n in 0..cfg.frames {
        ticker.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            interrupted = true;
            break;
        }
        ctl.update(&script.frame(n));
        if movement.collisions_enabled {
            script.collide(&mut ctl, n);
        }
        frames += 1;
    }

    let mut end_polls = 0;
    if interrupted {
        ctl.teardown();
    } else if ctl.state() == SessionState::Running {
        ctl.end_movement_session(dt, false);
        while ctl.state() == SessionState::PendingShutDown && ctl.is_enabled() {
            ticker.tick().await;
            if shutdown.load(Ordering::SeqCst) {
                interrupted = true;
                ctl.teardown();
                break;
            }
            ctl.update(&script.frame(cfg.frames));
            end_polls += 1;
        }
    }

    RunSummary {
        mode: movement.interaction_mode,
        driver: movement.input_driver,
        collisions_enabled: movement.collisions_enabled,
        frames,
        end_polls,
        interrupted,
        final_state: ctl.state().to_string(),
        enabled: ctl.is_enabled(),
        error: ctl.last_error().map(ToString::to_string),
        final_position: ctl.object().pose().position,
    }
}

/// Scripted head and controller motion plus a few scene contacts.
struct DemoScript {
    dt: f32,
    frames: u32,
}

impl DemoScript {
    fn new(dt: f32, frames: u32) -> Self {
        Self { dt, frames }
    }

    fn frame(&self, n: u32) -> FrameInput {
        let t = n as f32 * self.dt;
        let yaw = (t * 0.8).sin() * 0.6;
        let head = Pose::new(
            Vec3::new(0.0, 1.6, 0.0),
            Quaternion::from_axis_angle(Vec3::up(), yaw),
        );

        let mut controller = ControllerSample::connected_at(Pose::new(
            Vec3::new(0.2 + yaw * 0.3, 1.2, 0.3),
            Quaternion::from_axis_angle(Vec3::up(), yaw * 1.5),
        ));
        // Push the object away for a while in the middle of the run.
        if (self.frames / 3..self.frames / 2).contains(&n) {
            controller.touch = TouchSample {
                active: true,
                position: Vec2::new(0.05, 0.8),
                force: 0.6,
            };
        }
        FrameInput {
            dt: self.dt,
            headpose: Some(head),
            controller: Some(controller),
        }
    }

    fn collide(&self, ctl: &mut MovementController<SimEngine, SimObject>, n: u32) {
        let marker = Some(MovementColliderMarker::default());
        let quarter = self.frames / 4;
        let obstacle = ContactEvent {
            other: OBSTACLE,
            marker,
            contacts: vec![ContactPoint {
                point: Vec3::new(0.0, 1.2, 2.0),
                normal: Vec3::new(0.0, 0.0, -1.0),
            }],
        };

        if n == quarter {
            ctl.on_proximity_enter(&ProximityEvent {
                other: SHELF,
                marker,
                other_bounds: Bounds::new(Vec3::new(0.0, 1.2, 3.0), Vec3::new(0.5, 0.5, 0.2)),
            });
        }
        if n == quarter * 2 {
            ctl.on_contact_enter(&obstacle);
        } else if n > quarter * 2 && n < quarter * 3 {
            ctl.on_contact_stay(&obstacle);
        } else if n == quarter * 3 {
            ctl.on_contact_exit(OBSTACLE);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", "  movekit · movement session demo".bold().cyan());
    println!("{}", "  ────────────────────────────────".cyan());
    println!();
}

fn print_summary(s: &RunSummary) {
    println!();
    println!("  {}", "Session summary".bold());
    println!("    mode        {} / {}", s.mode.to_string().bold(), s.driver);
    println!(
        "    collisions  {}",
        if s.collisions_enabled { "on".green() } else { "off".dimmed() }
    );
    println!("    frames      {} (+{} end polls)", s.frames, s.end_polls);
    let state = if s.final_state == SessionState::ShutDown.to_string() {
        s.final_state.green()
    } else {
        s.final_state.yellow()
    };
    println!("    final state {state}");
    let p = s.final_position;
    println!("    position    ({:.3}, {:.3}, {:.3})", p.x, p.y, p.z);
    if s.interrupted {
        println!("    {}", "interrupted by Ctrl-C, session torn down".yellow());
    }
    match &s.error {
        Some(e) => println!("    {} {e}", "disabled:".red().bold()),
        None => println!("    {}", "✓ completed without errors".green()),
    }
    println!();
}
