//! `movekit-hal` – collaborator seams for the movement component.
//!
//! The movement component never talks to a tracking service or a scene
//! graph directly.  It only sees the traits defined here, so the real
//! device runtime, the in-process simulator and test doubles are
//! interchangeable.
//!
//! # Modules
//!
//! - [`engine`] – [`MovementEngine`][engine::MovementEngine]: the synchronous,
//!   handle-based motion solver.
//! - [`object`] – [`ControlledObject`][object::ControlledObject]: the scene
//!   entity being moved (transform, rigidbody, collider).
//! - [`sim`] – [`SimEngine`][sim::SimEngine] and [`SimObject`][sim::SimObject]:
//!   a plausible in-process engine and object for headless runs.
//! - [`scripted`] – [`ScriptedEngine`][scripted::ScriptedEngine]: records
//!   every call and answers with scripted results.

pub mod engine;
pub mod object;
pub mod scripted;
pub mod sim;

pub use engine::MovementEngine;
pub use object::ControlledObject;
