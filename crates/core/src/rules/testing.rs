//! Canned rule compiler for tests.
//!
//! Tests register closures per source string instead of depending on a real
//! rule-language implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_decimal::Decimal;

use super::context::RuleContext;
use super::error::RuleSyntaxError;
use super::evaluator::{CompiledRule, RuleCompiler};

type BooleanFn = Box<dyn Fn(&RuleContext<'_>) -> bool + Send + Sync>;
type NumberFn = Box<dyn Fn(&RuleContext<'_>) -> Option<Decimal> + Send + Sync>;

#[derive(Default)]
struct StubRule {
    error: Option<RuleSyntaxError>,
    boolean: Option<BooleanFn>,
    number: Option<NumberFn>,
}

impl CompiledRule for StubRule {
    fn compile_error(&self) -> Option<&RuleSyntaxError> {
        self.error.as_ref()
    }

    fn evaluate_to_number(&self, context: &RuleContext<'_>) -> Option<Decimal> {
        self.number.as_ref().and_then(|f| f(context))
    }

    fn evaluate_to_boolean(&self, context: &RuleContext<'_>) -> bool {
        self.boolean.as_ref().is_some_and(|f| f(context))
    }
}

/// Compiler whose "language" is a fixed map from source strings to closures.
pub(crate) struct StubCompiler {
    rules: HashMap<String, Arc<StubRule>>,
    compiles: AtomicUsize,
}

impl StubCompiler {
    pub(crate) fn new() -> Self {
        Self {
            rules: HashMap::new(),
            compiles: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_boolean(
        mut self,
        source: &str,
        f: impl Fn(&RuleContext<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rules.insert(
            source.to_string(),
            Arc::new(StubRule {
                boolean: Some(Box::new(f)),
                ..StubRule::default()
            }),
        );
        self
    }

    pub(crate) fn with_number(
        mut self,
        source: &str,
        f: impl Fn(&RuleContext<'_>) -> Option<Decimal> + Send + Sync + 'static,
    ) -> Self {
        self.rules.insert(
            source.to_string(),
            Arc::new(StubRule {
                number: Some(Box::new(f)),
                ..StubRule::default()
            }),
        );
        self
    }

    pub(crate) fn with_error(mut self, source: &str, message: &str, row: u32, column: u32) -> Self {
        self.rules.insert(
            source.to_string(),
            Arc::new(StubRule {
                error: Some(RuleSyntaxError {
                    message: message.to_string(),
                    row,
                    column,
                }),
                ..StubRule::default()
            }),
        );
        self
    }

    /// Number of times `compile` was invoked (cache-hit assertions).
    pub(crate) fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }
}

impl RuleCompiler for StubCompiler {
    fn compile(&self, source: &str) -> Arc<dyn CompiledRule> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        self.rules.get(source).cloned().unwrap_or_else(|| {
            Arc::new(StubRule {
                error: Some(RuleSyntaxError {
                    message: format!("unknown rule: {source}"),
                    row: 1,
                    column: 1,
                }),
                ..StubRule::default()
            })
        })
    }
}
