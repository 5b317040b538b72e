// ULP Validator - core/mod.rs
//
// Core processing components: classification, deduplication, rejection
// logs, master appends, and progress delivery.
// Dependencies: standard library, util layer.
// Must NOT depend on: app, platform.

pub mod classifier;
pub mod dedup;
pub mod lines;
pub mod master;
pub mod model;
pub mod progress;
pub mod rejection;
