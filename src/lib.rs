// ABOUTME: Library root for molt - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod error;
pub mod report;
pub mod runtime;
pub mod scheduler;
pub mod types;
pub mod update;
