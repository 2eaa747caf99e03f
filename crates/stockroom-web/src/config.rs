//! Server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use stockroom_core::{Error, Result};

/// Where uploaded item images are written.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Local directory served at `/uploads`.
    #[default]
    Local,
    /// S3 bucket with a public URL prefix.
    Remote,
}

/// Bucket settings for remote uploads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BucketConfig {
    /// Bucket name.
    pub name: Option<String>,
    /// Bucket region.
    pub region: Option<String>,
    /// Public URL prefix that stored keys are appended to.
    pub public_url: Option<String>,
}

/// Configuration for the Stockroom web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server port.
    pub http_port: u16,

    /// Enable debug mode.
    ///
    /// When enabled:
    /// - logs are pretty-printed
    /// - the document store may fall back to memory when no data dir is set
    pub debug: bool,

    /// Directory for the JSON document store.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Upload backend selection.
    #[serde(default)]
    pub upload_mode: UploadMode,

    /// Local upload directory (local mode).
    pub upload_dir: PathBuf,

    /// Bucket settings (remote mode).
    #[serde(default)]
    pub bucket: BucketConfig,

    /// Maximum accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            debug: false,
            data_dir: None,
            upload_mode: UploadMode::Local,
            upload_dir: PathBuf::from("public/uploads"),
            bucket: BucketConfig::default(),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Supported env vars:
    /// - `STOCKROOM_HTTP_PORT`
    /// - `STOCKROOM_DEBUG`
    /// - `STOCKROOM_DATA_DIR`
    /// - `STOCKROOM_UPLOAD_MODE` (`local` | `remote`)
    /// - `STOCKROOM_UPLOAD_DIR`
    /// - `STOCKROOM_BUCKET_NAME`
    /// - `STOCKROOM_BUCKET_REGION`
    /// - `STOCKROOM_BUCKET_URL`
    /// - `STOCKROOM_MAX_UPLOAD_BYTES`
    ///
    /// S3 credentials are read by the storage client from the standard
    /// `AWS_*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any environment variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);
        let mut config = Self::default();

        if let Some(port) = vars.u16("STOCKROOM_HTTP_PORT")? {
            config.http_port = port;
        }
        if let Some(debug) = vars.bool("STOCKROOM_DEBUG")? {
            config.debug = debug;
        }
        config.data_dir = vars.string("STOCKROOM_DATA_DIR").map(PathBuf::from);
        if let Some(mode) = vars.string("STOCKROOM_UPLOAD_MODE") {
            config.upload_mode = parse_upload_mode("STOCKROOM_UPLOAD_MODE", &mode)?;
        }
        if let Some(dir) = vars.string("STOCKROOM_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        config.bucket = BucketConfig {
            name: vars.string("STOCKROOM_BUCKET_NAME"),
            region: vars.string("STOCKROOM_BUCKET_REGION"),
            public_url: vars.string("STOCKROOM_BUCKET_URL"),
        };
        if let Some(limit) = vars.usize("STOCKROOM_MAX_UPLOAD_BYTES")? {
            config.max_upload_bytes = limit;
        }

        Ok(config)
    }

    /// Checks cross-field requirements.
    ///
    /// # Errors
    ///
    /// Returns an error if remote mode lacks bucket settings, if the data
    /// directory is missing outside debug mode, or if the body limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.upload_mode == UploadMode::Remote {
            for (name, value) in [
                ("STOCKROOM_BUCKET_NAME", &self.bucket.name),
                ("STOCKROOM_BUCKET_REGION", &self.bucket.region),
                ("STOCKROOM_BUCKET_URL", &self.bucket.public_url),
            ] {
                if value.is_none() {
                    return Err(Error::InvalidInput(format!(
                        "{name} is required when STOCKROOM_UPLOAD_MODE=remote"
                    )));
                }
            }
        }
        if !self.debug && self.data_dir.is_none() {
            return Err(Error::InvalidInput(
                "STOCKROOM_DATA_DIR is required unless STOCKROOM_DEBUG=true".to_string(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::InvalidInput(
                "STOCKROOM_MAX_UPLOAD_BYTES must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    fn string(&self, name: &str) -> Option<String> {
        (self.0)(name).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    fn u16(&self, name: &str) -> Result<Option<u16>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<u16>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{name} must be a u16: {e}")))
    }

    fn usize(&self, name: &str) -> Result<Option<usize>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        v.parse::<usize>()
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("{name} must be a usize: {e}")))
    }

    fn bool(&self, name: &str) -> Result<Option<bool>> {
        let Some(v) = self.string(name) else {
            return Ok(None);
        };
        parse_bool(name, &v).map(Some)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let value = value.trim().to_ascii_lowercase();
    match value.as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be a boolean (true/false/1/0)"
        ))),
    }
}

fn parse_upload_mode(name: &str, value: &str) -> Result<UploadMode> {
    let mode = value.trim().to_ascii_lowercase();
    match mode.as_str() {
        "local" => Ok(UploadMode::Local),
        "remote" => Ok(UploadMode::Remote),
        _ => Err(Error::InvalidInput(format!(
            "{name} must be one of: local, remote (got {value})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() -> Result<()> {
        let config = load(&[])?;
        assert_eq!(config.http_port, 3000);
        assert!(!config.debug);
        assert_eq!(config.upload_mode, UploadMode::Local);
        assert_eq!(config.upload_dir, PathBuf::from("public/uploads"));
        assert_eq!(config.max_upload_bytes, 5_242_880);
        Ok(())
    }

    #[test]
    fn blank_values_are_unset() -> Result<()> {
        let config = load(&[("STOCKROOM_HTTP_PORT", "  "), ("STOCKROOM_DATA_DIR", "")])?;
        assert_eq!(config.http_port, 3000);
        assert!(config.data_dir.is_none());
        Ok(())
    }

    #[test]
    fn reads_all_variables() -> Result<()> {
        let config = load(&[
            ("STOCKROOM_HTTP_PORT", "8080"),
            ("STOCKROOM_DEBUG", "yes"),
            ("STOCKROOM_DATA_DIR", "/var/lib/stockroom"),
            ("STOCKROOM_UPLOAD_MODE", "REMOTE"),
            ("STOCKROOM_BUCKET_NAME", "images"),
            ("STOCKROOM_BUCKET_REGION", "eu-west-1"),
            ("STOCKROOM_BUCKET_URL", "https://images.example.com"),
            ("STOCKROOM_MAX_UPLOAD_BYTES", "1024"),
        ])?;
        assert_eq!(config.http_port, 8080);
        assert!(config.debug);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/stockroom")));
        assert_eq!(config.upload_mode, UploadMode::Remote);
        assert_eq!(config.bucket.name.as_deref(), Some("images"));
        assert_eq!(config.max_upload_bytes, 1024);
        config.validate()
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = load(&[("STOCKROOM_HTTP_PORT", "http")]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn invalid_upload_mode_is_rejected() {
        let err = load(&[("STOCKROOM_UPLOAD_MODE", "ftp")]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn remote_mode_requires_bucket_settings() -> Result<()> {
        let config = load(&[
            ("STOCKROOM_DEBUG", "true"),
            ("STOCKROOM_UPLOAD_MODE", "remote"),
            ("STOCKROOM_BUCKET_NAME", "images"),
        ])?;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("STOCKROOM_BUCKET_REGION"));
        Ok(())
    }

    #[test]
    fn data_dir_required_outside_debug() -> Result<()> {
        assert!(load(&[])?.validate().is_err());
        load(&[("STOCKROOM_DEBUG", "true")])?.validate()
    }

    #[test]
    fn parse_bool_accepts_true_values() {
        assert!(parse_bool("TEST", "true").unwrap());
        assert!(parse_bool("TEST", "1").unwrap());
        assert!(parse_bool("TEST", "TRUE").unwrap());
    }

    #[test]
    fn parse_bool_rejects_invalid_values() {
        assert!(parse_bool("TEST", "maybe").is_err());
        assert!(parse_bool("TEST", "").is_err());
    }
}
