//! Return-on-investment projections for automating invoice processing.
//!
//! The calculation itself lives in [`roi`] and is pure. Everything else
//! (config, scenario store, terminal output, HTTP API) wraps it.

pub mod config;
pub mod output;
pub mod roi;
pub mod scenarios;
pub mod server;
