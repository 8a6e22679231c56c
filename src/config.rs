//! Command line and environment configuration for the dashboard server.

use std::time::Duration;

use clap::Parser;

/// Settings for the dashboard server.
///
/// Every option can also be set through the environment variable named in
/// its help text.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about = "Dashboard de servicios", long_about = None)]
pub struct Config {
    /// Base URL of the report backend, e.g. "http://localhost:5000".
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:5000")]
    pub api_base_url: String,

    /// The port to serve the dashboard from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Canonical timezone name used for generated filenames, e.g. "America/Bogota".
    #[arg(long, env = "TIMEZONE", default_value = "America/Bogota")]
    pub timezone: String,

    /// How long to wait for the backend before giving up, in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Largest accepted request body in megabytes. Spreadsheets and support
    /// photos are uploaded whole, so this bounds the size of a form.
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 50)]
    pub max_upload_mb: usize,
}

impl Config {
    /// The backend request timeout as a [Duration].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// [Config::max_upload_mb] in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::Config;

    #[test]
    fn parses_explicit_arguments() {
        let config = Config::try_parse_from([
            "server",
            "--api-base-url",
            "http://reportes.local:8080",
            "--port",
            "8000",
            "--timezone",
            "America/Lima",
            "--request-timeout-secs",
            "30",
            "--max-upload-mb",
            "10",
        ])
        .expect("could not parse arguments");

        assert_eq!(config.api_base_url, "http://reportes.local:8080");
        assert_eq!(config.port, 8000);
        assert_eq!(config.timezone, "America/Lima");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn default_upload_limit_fits_phone_photos() {
        let config = Config::try_parse_from(["server"]).expect("could not parse arguments");

        assert_eq!(config.max_upload_mb, 50);
    }

    #[test]
    fn rejects_non_numeric_port() {
        let result = Config::try_parse_from(["server", "--port", "abc"]);

        assert!(result.is_err());
    }
}
