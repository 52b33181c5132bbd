use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Nested keys are addressed with a double underscore, e.g.
/// `VIDSYNC_STORAGE__BUCKET=my-bucket`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("VIDSYNC_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerBackend;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_minimal() {
        let toml = r#"
[storage]
bucket = "media-archive"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.storage.bucket, "media-archive");
        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.source.per_page, 100);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ledger.backend, LedgerBackend::Json);
    }

    #[test]
    fn test_load_config_from_str_missing_storage() {
        let toml = r#"
[server]
port = 8080
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/vidsync.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[source]
url = "https://blog.example.com/wp-json/wp/v2/posts"
per_page = 50

[storage]
bucket = "media-archive"
region = "eu-west-1"

[ledger]
backend = "sqlite"
path = "ledger.db"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.source.per_page, 50);
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.ledger.backend, LedgerBackend::Sqlite);
    }
}
