//! `movekit-runtime` – the movement-session state machine.
//!
//! # Modules
//!
//! - [`controller`] – [`MovementController`]: the `Running` /
//!   `PendingShutDown` / `ShutDown` lifecycle, per-frame update, collision
//!   callbacks and forced teardown.
//! - [`movement_session`] – [`MovementSession`]: one engine session handle
//!   and its 3DoF or 6DoF update protocol.
//! - [`control_sampler`] – touch-driven rotation/depth adjustments and the
//!   per-frame control signal.
//! - [`collision_ledger`] – [`CollisionLedger`]: hard and soft engine
//!   collision sessions keyed by contacting object.
//! - [`config`] – [`MovementConfig`], the component options.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing] for hosts.
//!
//! # Example
//!
//! ```rust
//! use movekit_hal::sim::{SimEngine, SimObject};
//! use movekit_runtime::{MovementConfig, MovementController, SessionState};
//! use movekit_types::{FrameInput, Pose};
//!
//! let mut ctl = MovementController::new(
//!     MovementConfig::default(),
//!     SimEngine::new(),
//!     SimObject::new(Pose::identity()),
//! );
//! let frame = FrameInput::headpose_only(1.0 / 60.0, Pose::identity());
//! ctl.on_start(&frame);
//! ctl.update(&frame);
//! assert_eq!(ctl.state(), SessionState::Running);
//!
//! ctl.teardown();
//! assert_eq!(ctl.state(), SessionState::ShutDown);
//! ```

pub mod collision_ledger;
pub mod config;
pub mod control_sampler;
pub mod controller;
pub mod movement_session;
pub mod telemetry;

pub use collision_ledger::{CollisionEntry, CollisionLedger};
pub use config::{MovementConfig, TouchConfig};
pub use control_sampler::{ControlSampler, TouchAdjustment};
pub use controller::{MovementController, SessionState};
pub use movement_session::{DofPath, MovementSession};
pub use telemetry::{TracerProviderGuard, init_tracing};
