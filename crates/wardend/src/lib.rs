//! Warden Daemon - autonomous health monitoring and self-healing for a
//! fleet of long-running integrations.
//!
//! Two independent paths feed the same remediation dispatcher: the
//! event-driven outcome path (callers report execution results as they
//! happen) and the periodic drift scan (live specs diffed against
//! stored baselines).

pub mod config;
pub mod dispatcher;
pub mod fetcher;
pub mod monitor;
pub mod registry;
pub mod tracker;
