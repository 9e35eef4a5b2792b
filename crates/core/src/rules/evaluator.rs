//! The rule-evaluator capability interface.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::context::RuleContext;
use super::error::RuleSyntaxError;

/// A rule compiled from source, ready for repeated evaluation.
///
/// Evaluation never fails: a rule that cannot produce a number yields `None`
/// (the allocation engine clamps that to a zero draw), and boolean evaluation
/// of a non-boolean result is `false`. Compile problems are reported through
/// [`CompiledRule::compile_error`] instead, so they can be surfaced before
/// any allocation starts.
pub trait CompiledRule: Send + Sync {
    /// The compile error, if the source did not parse.
    fn compile_error(&self) -> Option<&RuleSyntaxError>;

    /// Evaluates the rule to a numeric result against the given context.
    fn evaluate_to_number(&self, context: &RuleContext<'_>) -> Option<Decimal>;

    /// Evaluates the rule to a boolean result against the given context.
    fn evaluate_to_boolean(&self, context: &RuleContext<'_>) -> bool;
}

/// Compiles rule source strings.
///
/// Implementations are injected into the engine; Splitrail never parses rule
/// source itself. Compilation is expected to be deterministic, which is what
/// makes the process-wide cache in [`super::cache::RuleCache`] sound.
pub trait RuleCompiler: Send + Sync {
    /// Compiles `source` into an evaluator.
    ///
    /// A source that fails to parse still returns a [`CompiledRule`]; the
    /// failure is carried in [`CompiledRule::compile_error`].
    fn compile(&self, source: &str) -> Arc<dyn CompiledRule>;
}
