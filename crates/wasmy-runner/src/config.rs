//! Runner configuration.

use serde::{Deserialize, Serialize};
use wasmy_types::protocol::{DEFAULT_IMPORT_MODULE, DEFAULT_IMPORT_PREFIX};
use wasmy_types::BUFFER_SIZE;

use crate::error::{RunnerError, RunnerResult};

/// Settings applied when a [`Runner`](crate::Runner) warms up.
///
/// Every field has a default, so `{}` is a valid configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Buffer capacity assumed when the guest does not export `bufferCapacity`.
    pub buffer_capacity: usize,
    /// Import module host functions are linked under.
    pub import_module: String,
    /// Prefix joined to each host function name to form its import field.
    pub import_prefix: String,
    /// Fuel granted to every call; requires a module compiled with fuel metering.
    pub fuel_per_call: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: BUFFER_SIZE,
            import_module: DEFAULT_IMPORT_MODULE.to_string(),
            import_prefix: DEFAULT_IMPORT_PREFIX.to_string(),
            fuel_per_call: None,
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> RunnerResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RunnerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if self.buffer_capacity == 0 || self.buffer_capacity > i32::MAX as usize {
            return Err(RunnerError::Config(format!(
                "buffer_capacity must be between 1 and {}, got {}",
                i32::MAX,
                self.buffer_capacity
            )));
        }
        if self.import_module.is_empty() {
            return Err(RunnerError::Config("import_module must not be empty".into()));
        }
        if self.fuel_per_call == Some(0) {
            return Err(RunnerError::Config("fuel_per_call must be positive".into()));
        }
        Ok(())
    }

    /// Import field a host function named `name` is linked as.
    pub fn import_field(&self, name: &str) -> String {
        format!("{}{}", self.import_prefix, name)
    }

    pub fn with_fuel_per_call(mut self, fuel: u64) -> Self {
        self.fuel_per_call = Some(fuel);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        assert_eq!(RunnerConfig::from_json_str("{}").unwrap(), RunnerConfig::default());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config =
            RunnerConfig::from_json_str(r#"{"import_prefix": "", "fuel_per_call": 5000}"#).unwrap();
        assert_eq!(config.import_module, "env");
        assert_eq!(config.import_prefix, "");
        assert_eq!(config.fuel_per_call, Some(5000));
        assert_eq!(config.import_field("PrintHello"), "PrintHello");
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = RunnerConfig::from_json_str(r#"{"buffer_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, RunnerError::Config(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = RunnerConfig::from_json_str("{buffer_capacity: }").unwrap_err();
        assert!(matches!(err, RunnerError::Config(_)));
    }
}
