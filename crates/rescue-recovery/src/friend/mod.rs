//! Friend role: the vouch decision and its engine.

pub mod decision;
pub mod engine;

pub use decision::{decide_vouch, VouchStatus};
pub use engine::{FriendVouchEngine, VouchOutcome};
