//! Rule compile errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rule that failed to compile, with the location of the problem.
///
/// Surfaced when rules are authored and again by the planner's pre-flight
/// check; allocation itself assumes every reachable rule compiles.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Rule syntax error at {row}:{column}: {message}")]
pub struct RuleSyntaxError {
    /// Human-readable description from the rule compiler.
    pub message: String,
    /// 1-based line of the offending token.
    pub row: u32,
    /// 1-based column of the offending token.
    pub column: u32,
}
