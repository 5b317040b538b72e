// ULP Validator - lib.rs
//
// Library entry point, exposing the processing engine and its supporting
// layers for integration testing and for front ends other than the CLI.
//
// The command-line front end lives in `main.rs` and is not part of the
// library surface.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;
