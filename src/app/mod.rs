// ULP Validator - app/mod.rs
//
// Application layer: run orchestration and caller-side session state.
// Dependencies: core and util layers.
// Must NOT depend on: platform specifics.

pub mod controller;
pub mod session;
