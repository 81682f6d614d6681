//! SETPULSE — AI-grounded SET quote refresh service.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod universe;
pub mod store;
pub mod storage;
pub mod time;
pub mod fetch;
pub mod scheduler;
pub mod dashboard;
