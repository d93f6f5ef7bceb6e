//! Livescore Library
//!
//! Live football fixtures from API-Football: the fetcher, the rate-limit
//! tracker, the match cache, the refresh scheduler and the terminal UI. The
//! binary wires these together; integration tests use them directly.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod rate_limit;
pub mod refresh;
pub mod ui;

#[cfg(test)]
mod test_support;
