//! Core orchestration.

pub mod dispatcher;
pub mod error;
pub mod freshness;
pub mod parser;
pub mod toolchain;
pub mod types;
