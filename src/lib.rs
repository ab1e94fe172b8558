//! Punch — Telegram auto check-in orchestrator.
//!
//! Resolves configured targets against the live dialog roster, runs
//! the per-target interaction protocol (command send, optional inline
//! button press), and delivers a consolidated HTML report.

pub mod config;
pub mod executor;
pub mod notify;
pub mod registry;
pub mod report;
pub mod run;
pub mod session;
