//! Job configuration.

use serde::{Deserialize, Serialize};

/// What to do with an in-flight run when the service shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Wait for the current run to finish.
    #[default]
    Wait,
    /// Cancel the run at its next suspension point.
    Abandon,
}

/// Configuration for transfer runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Item cap used when a start request does not name one.
    /// None means transfer everything pending.
    #[serde(default)]
    pub default_max_items: Option<usize>,

    #[serde(default)]
    pub shutdown: ShutdownMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JobConfig::default();
        assert!(config.default_max_items.is_none());
        assert_eq!(config.shutdown, ShutdownMode::Wait);
    }

    #[test]
    fn test_deserialize() {
        let config: JobConfig = toml::from_str(
            r#"
            default_max_items = 25
            shutdown = "abandon"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_max_items, Some(25));
        assert_eq!(config.shutdown, ShutdownMode::Abandon);
    }
}
