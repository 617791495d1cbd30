use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Bucket the relay writes to unless `S3_BUCKET` says otherwise.
pub const DEFAULT_BUCKET: &str = "vestrade-static";

/// Region of the default bucket.
pub const DEFAULT_REGION: &str = "ap-southeast-1";

/// Relay configuration, read once at process start.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Listen port (default: 3000)
    pub port: u16,

    /// Prefix for the public links returned after an upload
    pub base_url: String,

    /// Object store bucket (default: "vestrade-static")
    pub bucket: String,

    /// Object store region (default: "ap-southeast-1")
    pub region: String,

    /// Static access key. Falls back to the AWS provider chain when unset.
    pub access_key: Option<String>,

    /// Static secret key
    pub secret_key: Option<String>,

    /// Custom S3 endpoint (MinIO and friends)
    pub endpoint_url: Option<String>,

    /// Base URL of the auth collaborator
    pub auth_service_url: String,

    /// Upper bound for one auth round-trip
    pub auth_timeout: Duration,

    /// Upper bound for one object store call
    pub storage_timeout: Duration,

    /// Local directory uploads are staged in before they reach the bucket
    pub staging_dir: PathBuf,

    /// Maximum file size in bytes (default: 100 MB)
    pub max_file_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            access_key: None,
            secret_key: None,
            endpoint_url: None,
            auth_service_url: "http://127.0.0.1:4000".to_string(),
            auth_timeout: Duration::from_secs(10),
            storage_timeout: Duration::from_secs(60),
            staging_dir: PathBuf::from("uploads"),
            max_file_size: 100 * 1024 * 1024, // 100 MB
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            base_url: env::var("BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.base_url),

            bucket: env::var("S3_BUCKET").unwrap_or(default.bucket),

            region: env::var("AWS_REGION").unwrap_or(default.region),

            access_key: env::var("AWS_ACCESS").ok().filter(|v| !v.is_empty()),
            secret_key: env::var("AWS_SECRET").ok().filter(|v| !v.is_empty()),

            endpoint_url: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),

            auth_service_url: env::var("AUTH_SERVICE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.auth_service_url),

            auth_timeout: env::var("AUTH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.auth_timeout),

            storage_timeout: env::var("STORAGE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.storage_timeout),

            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.staging_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),
        }
    }

    /// Local development against MinIO and an auth stub on localhost
    pub fn development() -> Self {
        Self {
            endpoint_url: Some("http://127.0.0.1:9000".to_string()),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            auth_timeout: Duration::from_secs(2),
            storage_timeout: Duration::from_secs(10),
            ..Self::default()
        }
    }

    /// Public link for a stored key
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            crate::utils::keys::encode_path_segment(key)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bucket, "vestrade-static");
        assert_eq!(config.region, "ap-southeast-1");
        assert_eq!(config.staging_dir, PathBuf::from("uploads"));
        assert!(config.access_key.is_none());
    }

    #[test]
    fn test_development_config() {
        let config = RelayConfig::development();
        assert_eq!(config.endpoint_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(config.bucket, DEFAULT_BUCKET);
        assert_eq!(config.auth_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_from_env_overrides() {
        unsafe {
            env::set_var("BASE_URL", "https://cdn.example.com/");
            env::set_var("AUTH_TIMEOUT_SECS", "3");
            env::set_var("AWS_ACCESS", "");
        }
        let config = RelayConfig::from_env();
        unsafe {
            env::remove_var("BASE_URL");
            env::remove_var("AUTH_TIMEOUT_SECS");
            env::remove_var("AWS_ACCESS");
        }
        assert_eq!(config.base_url, "https://cdn.example.com");
        assert_eq!(config.auth_timeout, Duration::from_secs(3));
        assert!(config.access_key.is_none());
    }

    #[test]
    fn test_public_url() {
        let config = RelayConfig {
            base_url: "https://files.example.com/".to_string(),
            ..RelayConfig::default()
        };
        assert_eq!(
            config.public_url("abc_1700000000000_photo.png"),
            "https://files.example.com/abc_1700000000000_photo.png"
        );
        assert_eq!(
            config.public_url("abc_1_my photo.png"),
            "https://files.example.com/abc_1_my%20photo.png"
        );
    }
}
