//! CountOn calculator core.
//!
//! Keypad accumulators, a free-text evaluator that graphs functions of
//! `x`, a persisted history and formula library, and a weighted mark
//! aggregator. Rendering is left to the caller.

pub mod calculator;
pub mod config;
pub mod error;
pub mod formula;
pub mod logging;
pub mod marks;
pub mod store;

pub use error::{CalcError, Result, StoreError};
