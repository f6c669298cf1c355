//! rustiny-make: build orchestrator for the RusTiny compiler.
//!
//! Keeps the generated instruction selection table fresh, drives the build
//! toolchain, and runs, debugs, or tests the resulting compiler. Exit status
//! is that of the first failing stage.

pub mod cli;
pub mod core;
pub mod harness;
pub mod notice;
pub mod process;
