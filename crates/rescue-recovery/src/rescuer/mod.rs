//! Rescuer role: phase derivation, countdown and the step engine.

pub mod countdown;
pub mod engine;
pub mod phase;

pub use countdown::{Countdown, CountdownAnchor};
pub use engine::RescuerStepEngine;
pub use phase::{derive_phase, remaining_blocks, PhaseInputs, RescuerPhase};
