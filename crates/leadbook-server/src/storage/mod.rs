//! S3-compatible object storage
//!
//! The server never proxies file bytes. Clients ask for a presigned `PUT` URL
//! and upload straight to the bucket.

use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    presigning::PresigningConfig,
    Client,
};
use std::time::Duration;
use tracing::{debug, info, instrument};

pub mod config;

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

/// A presigned upload target handed back to the client.
#[derive(Debug, Clone)]
pub struct PresignedUpload {
    pub url: String,
    pub key: String,
    pub expires_in: Duration,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "Initializing storage"
        );

        let mut s3_config_builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "leadbook-storage");
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .credentials_provider(credentials)
            },
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        s3_config_builder = s3_config_builder
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(bucket = %config.bucket, "Storage client initialized");

        Ok(Self {
            client,
            bucket: config.bucket,
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Presigned `PUT` URL for `key`, valid for the configured expiry.
    #[instrument(skip(self))]
    pub async fn presign_put(&self, key: &str) -> Result<PresignedUpload> {
        let presigning_config = PresigningConfig::expires_in(self.presign_expiry)
            .context("Failed to create presigning config")?;

        let presigned_request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .context("Failed to generate presigned upload URL")?;

        debug!(key, "Generated presigned upload URL");

        Ok(PresignedUpload {
            url: presigned_request.uri().to_string(),
            key: key.to_string(),
            expires_in: self.presign_expiry,
        })
    }
}
