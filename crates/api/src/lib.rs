//! HTTP API: bearer-token authenticated service built on the groundwork crates.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
