//! renderlens - render farm statistics viewer
//!
//! Loads per-frame render statistics (render time, memory, CPU utilization)
//! from the studio file share and lets you drill from a sequence down to its
//! shots and frames.
//!
//! ## Layers
//!
//! 1. **stats**: stat catalog, raw sample store and aggregation
//! 2. **fetch**: file share access and the batch coordinator used to load
//!    a whole sequence at once
//! 3. **viewer**: navigation state, chart data and the view controller that
//!    ties the other two together
//! 4. **config**: TOML configuration

pub mod config;
pub mod fetch;
pub mod stats;
pub mod viewer;
