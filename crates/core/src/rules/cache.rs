//! Process-wide compiled-rule cache.
//!
//! Rules are immutable once authored, so compiled evaluators are cached by
//! source string for the lifetime of the process and never invalidated.

use std::sync::Arc;

use moka::sync::Cache;

use super::error::RuleSyntaxError;
use super::evaluator::{CompiledRule, RuleCompiler};

/// Maximum number of distinct rule sources held at once.
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Cache mapping rule source strings to compiled evaluators.
///
/// Populated lazily on first use. Thread-safe and cheap to clone; clones
/// share the same underlying cache and compiler.
#[derive(Clone)]
pub struct RuleCache {
    compiler: Arc<dyn RuleCompiler>,
    cache: Cache<String, Arc<dyn CompiledRule>>,
}

impl RuleCache {
    /// Creates a cache around the injected compiler.
    #[must_use]
    pub fn new(compiler: Arc<dyn RuleCompiler>) -> Self {
        Self::with_capacity(compiler, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache with a custom capacity.
    #[must_use]
    pub fn with_capacity(compiler: Arc<dyn RuleCompiler>, max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { compiler, cache }
    }

    /// Returns the compiled form of `source`, compiling on first sight.
    #[must_use]
    pub fn get(&self, source: &str) -> Arc<dyn CompiledRule> {
        self.cache
            .get_with(source.to_string(), || self.compiler.compile(source))
    }

    /// Checks that `source` compiles.
    ///
    /// Used at Value/Program authoring time and by the planner's pre-flight
    /// pass, so syntax problems surface before allocation begins.
    ///
    /// # Errors
    ///
    /// Returns the structured compile error reported by the compiler.
    pub fn validate(&self, source: &str) -> Result<(), RuleSyntaxError> {
        match self.get(source).compile_error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Returns the number of compiled rules currently cached.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}
