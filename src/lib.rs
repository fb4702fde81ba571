#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod computations;
pub mod diagnostics;
mod engine;
mod error;
pub mod executor;
#[cfg(feature = "logging")]
pub mod logging;
mod monitor;
mod outcome;
mod pair;
#[cfg(feature = "progress")]
pub mod progress;

pub use crate::engine::{Collector, Computation, Conjunction, Inspect, NodeId, NodeKind};
pub use crate::error::*;
pub use crate::monitor::{Monitor, MonitorState, ProgressSink};
pub use crate::outcome::Outcome;
pub use crate::pair::Pair;
