//! Rescue Testing Infrastructure
//!
//! Test doubles and fixtures shared by the Rescue crates' tests.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! rescue-testkit = { path = "../rescue-testkit" }
//! ```
//!
//! ```rust,no_run
//! use rescue_testkit::{QueryTarget, RecoveryScenario};
//!
//! let scenario = RecoveryScenario::new().initiated_at(950).vouched_by(&[0, 1]);
//! let chain = scenario.build();
//! let gate = chain.hold(QueryTarget::BlockHeight);
//! // ... drive an engine, then
//! gate.release();
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod mock_chain;

pub use fixtures::*;
pub use mock_chain::{Gate, MockChain, QueryTarget};
