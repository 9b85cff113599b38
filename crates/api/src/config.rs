use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// Network fields default to values suitable for local development;
/// secrets are required and missing ones abort startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shared secret for verifying processor webhook signatures.
    /// Required: without it every delivery would have to be trusted
    /// blindly, so startup fails instead.
    pub webhook_secret: String,
    /// JWT validation configuration.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default     |
    /// |--------------------------|----------|-------------|
    /// | `HOST`                   | no       | `0.0.0.0`   |
    /// | `PORT`                   | no       | `3000`      |
    /// | `CORS_ORIGINS`           | no       | `http://localhost:3000` |
    /// | `REQUEST_TIMEOUT_SECS`   | no       | `30`        |
    /// | `WEBHOOK_SECRET`         | **yes**  | --          |
    /// | `JWT_SECRET`             | **yes**  | --          |
    ///
    /// # Panics
    ///
    /// Panics on malformed values or missing secrets.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let webhook_secret =
            std::env::var("WEBHOOK_SECRET").expect("WEBHOOK_SECRET must be set in the environment");
        assert!(!webhook_secret.is_empty(), "WEBHOOK_SECRET must not be empty");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            webhook_secret,
            jwt,
        }
    }
}

/// Connection settings for the external media services, loaded by the
/// binary (not part of [`ServerConfig`] because tests replace the
/// clients entirely).
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub processor_api_url: String,
    pub processor_image_cdn_url: String,
    pub processor_stream_cdn_url: String,
    pub processor_token: String,
    pub image_host_api_url: String,
    pub image_host_token: String,
}

impl MediaConfig {
    /// # Panics
    ///
    /// Panics if any of the service URLs or tokens is missing.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name).unwrap_or_else(|_| panic!("{name} must be set in the environment"))
        };
        Self {
            processor_api_url: var("PROCESSOR_API_URL"),
            processor_image_cdn_url: var("PROCESSOR_IMAGE_CDN_URL"),
            processor_stream_cdn_url: var("PROCESSOR_STREAM_CDN_URL"),
            processor_token: var("PROCESSOR_TOKEN"),
            image_host_api_url: var("IMAGE_HOST_API_URL"),
            image_host_token: var("IMAGE_HOST_TOKEN"),
        }
    }
}
