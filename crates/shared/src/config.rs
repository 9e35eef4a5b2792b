//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Checkout planner configuration.
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Checkout planner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Maximum number of free-order (lightrail) steps per tax partition.
    ///
    /// Candidate enumeration is factorial in this count, so the planner
    /// rejects checkouts above the limit instead of attempting them.
    #[serde(default = "default_max_free_order_steps")]
    pub max_free_order_steps: usize,
}

fn default_max_free_order_steps() -> usize {
    7 // 7! = 5040 candidate orderings per partition
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_free_order_steps: default_max_free_order_steps(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SPLITRAIL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
