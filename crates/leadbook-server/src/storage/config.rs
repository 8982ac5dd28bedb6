use serde::{Deserialize, Serialize};
use std::env;

/// Default lifetime of presigned upload URLs (one hour).
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom endpoint for S3-compatible stores such as MinIO.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    /// Static credentials. When absent the default AWS credential chain is used.
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
    pub path_style: bool,
    pub presign_expiry_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            bucket: "leadbook-uploads".to_string(),
            access_key: None,
            secret_key: None,
            path_style: false,
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            region: env::var("AWS_REGION")
                .or_else(|_| env::var("S3_REGION"))
                .unwrap_or(defaults.region),
            bucket: env::var("AWS_S3_BUCKET")
                .or_else(|_| env::var("S3_BUCKET"))
                .unwrap_or(defaults.bucket),
            access_key: env::var("AWS_ACCESS_KEY_ID").ok().filter(|v| !v.is_empty()),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").ok().filter(|v| !v.is_empty()),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            presign_expiry_secs: env::var("S3_PRESIGN_EXPIRY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS),
        }
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            bucket: bucket.into(),
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
            path_style: true,
            ..Self::default()
        }
    }
}
