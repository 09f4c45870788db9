//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `PRINTQUOTE_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `PRINTQUOTE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `PRINTQUOTE_CORS__MAX_AGE=600` sets the `cors.max_age` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use printquote::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! PRINTQUOTE_PORT=8080
//!
//! # Accept uploads up to 16 MiB
//! PRINTQUOTE_MAX_UPLOAD_SIZE=16777216
//!
//! PRINTQUOTE_ENABLE_METRICS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PRINTQUOTE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Largest accepted `/upload` request body, in bytes
    pub max_upload_size: usize,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
    /// Cross-origin access to the API. No CORS headers are sent when `allowed_origins` is empty.
    pub cors: CorsConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://shop.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_size: 64 * 1024 * 1024,
            enable_metrics: false,
            enable_otel_export: false,
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        if self.port == 0 {
            return Err(Error::Internal {
                operation: "Config validation: port cannot be 0".to_string(),
            });
        }

        if self.max_upload_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: max_upload_size cannot be 0. Set a positive number of bytes (default: 67108864)."
                    .to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PRINTQUOTE_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(config: &str) -> Args {
        Args {
            config: config.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.host, "0.0.0.0");
            assert_eq!(config.port, 5000);
            assert_eq!(config.bind_address(), "0.0.0.0:5000");
            assert_eq!(config.max_upload_size, 64 * 1024 * 1024);
            assert!(!config.enable_metrics);
            assert!(!config.enable_otel_export);
            assert!(config.cors.allowed_origins.is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_yaml_config() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
host: 127.0.0.1
port: 8081
max_upload_size: 1048576
enable_metrics: true
cors:
  allowed_origins:
    - "*"
    - https://shop.example.com
  max_age: 600
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.bind_address(), "127.0.0.1:8081");
            assert_eq!(config.max_upload_size, 1048576);
            assert!(config.enable_metrics);
            assert_eq!(config.cors.max_age, Some(600));
            assert!(matches!(config.cors.allowed_origins[0], CorsOrigin::Wildcard));
            assert!(
                matches!(&config.cors.allowed_origins[1], CorsOrigin::Url(url) if url.as_str() == "https://shop.example.com/")
            );

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8081
enable_metrics: true
"#,
            )?;

            jail.set_env("PRINTQUOTE_HOST", "127.0.0.1");
            jail.set_env("PRINTQUOTE_PORT", "9090");
            jail.set_env("PRINTQUOTE_CORS__MAX_AGE", "60");

            let config = Config::load(&args("test.yaml"))?;

            // Env vars should override
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 9090);
            assert_eq!(config.cors.max_age, Some(60));

            // YAML values should be preserved
            assert!(config.enable_metrics);

            Ok(())
        });
    }

    #[test]
    fn test_config_file_from_env() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.yaml", "port: 7000\n")?;
            jail.set_env("PRINTQUOTE_CONFIG", "custom.yaml");

            let args = Args::try_parse_from(["printquote"]).expect("args should parse");
            assert_eq!(args.config, "custom.yaml");

            let config = Config::load(&args)?;
            assert_eq!(config.port, 7000);

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "prot: 8080\n")?;

            let result = Config::load(&args("test.yaml"));
            assert!(result.is_err());

            Ok(())
        });
    }

    #[test]
    fn test_invalid_cors_origin_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
cors:
  allowed_origins:
    - not a url
"#,
            )?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("zero-port.yaml", "port: 0\n")?;
            jail.create_file("zero-upload.yaml", "max_upload_size: 0\n")?;

            let err = Config::load(&args("zero-port.yaml")).unwrap_err();
            assert!(err.to_string().contains("port cannot be 0"), "{err}");

            let err = Config::load(&args("zero-upload.yaml")).unwrap_err();
            assert!(err.to_string().contains("max_upload_size cannot be 0"), "{err}");

            Ok(())
        });
    }
}
