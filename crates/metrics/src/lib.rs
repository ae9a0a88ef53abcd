//! Metric definitions for bridgekeeper.
//!
//! Crates record through the `metrics` facade re-exported here, so nothing is
//! emitted until the embedding application installs a recorder (for example
//! with `metrics::set_global_recorder`). The `bridgekeeper` CLI installs none
//! and leaves its `metrics` feature off by default.
//!
//! ```rust,ignore
//! use bridgekeeper_metrics::{bridges, counter};
//!
//! counter!(bridges::JOINS_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

pub use metrics::{counter, gauge, histogram};
