use anyhow::Result;
use std::sync::Arc;

use crate::{Config, ValidationResult};

/// Application state and lifecycle holder
pub struct App {
    config: Arc<Config>,
    validation: ValidationResult,
}

impl App {
    /// Create a new application instance from the user config file
    pub fn new() -> Result<Self> {
        let (config, validation) = Config::load_validated()?;
        Ok(Self::with_config(config, validation))
    }

    /// Create an application instance from an already loaded config
    pub fn with_config(config: Config, validation: ValidationResult) -> Self {
        tracing::info!(
            "Application configured from {} ({} warnings)",
            config.config_dir.display(),
            validation.warnings.len()
        );

        Self {
            config: Arc::new(config),
            validation,
        }
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the config for services that outlive a borrow
    pub fn shared_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Warnings collected when the config was validated
    pub fn warnings(&self) -> &ValidationResult {
        &self.validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_exposes_config_and_warnings() {
        let config = Config::default();
        let validation = config.validate();
        let app = App::with_config(config, validation);

        assert_eq!(app.config().search.debounce_ms, 300);
        assert!(app.warnings().is_valid());
        assert_eq!(app.shared_config().weather.history_days, 30);
    }
}
