//! Shared types and configuration for Splitrail.
//!
//! This crate provides common pieces used across all other crates:
//! - Minor-unit money helpers and banker's rounding
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, PlannerConfig};
