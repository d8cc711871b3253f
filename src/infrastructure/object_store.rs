//! S3-Compatible Object Store Client (C6)
//!
//! Uploads the chosen still for a newly admitted identity and returns a
//! public URL. Key derivation and failure semantics are owned by the
//! caller (§4.5); this client's only job is the upload itself.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::domain::ports::{ObjectStoreClient, ObjectStoreError, ObjectStoreResult};

/// Configuration for the S3-compatible bucket backing C6.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    pub region: String,
    pub public_base_url: String,
}

impl S3Config {
    pub fn from_env() -> ObjectStoreResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("OBJECT_STORE_ENDPOINT_URL")
                .map_err(|_| ObjectStoreError::Config("OBJECT_STORE_ENDPOINT_URL not set".into()))?,
            access_key_id: std::env::var("OBJECT_STORE_ACCESS_KEY_ID")
                .map_err(|_| ObjectStoreError::Config("OBJECT_STORE_ACCESS_KEY_ID not set".into()))?,
            secret_access_key: std::env::var("OBJECT_STORE_SECRET_ACCESS_KEY")
                .map_err(|_| ObjectStoreError::Config("OBJECT_STORE_SECRET_ACCESS_KEY not set".into()))?,
            bucket_name: std::env::var("OBJECT_STORE_BUCKET")
                .map_err(|_| ObjectStoreError::Config("OBJECT_STORE_BUCKET not set".into()))?,
            region: std::env::var("OBJECT_STORE_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("OBJECT_STORE_PUBLIC_BASE_URL")
                .map_err(|_| ObjectStoreError::Config("OBJECT_STORE_PUBLIC_BASE_URL not set".into()))?,
        })
    }
}

/// S3-compatible bucket client (C6).
#[derive(Clone)]
pub struct S3ObjectStoreClient {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3ObjectStoreClient {
    pub async fn new(config: S3Config) -> ObjectStoreResult<Self> {
        let credentials =
            Credentials::new(&config.access_key_id, &config.secret_access_key, None, None, "face-tracker");

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
        })
    }

    pub async fn from_env() -> ObjectStoreResult<Self> {
        Self::new(S3Config::from_env()?).await
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStoreClient {
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> ObjectStoreResult<String> {
        debug!(key, bytes = bytes.len(), "uploading still to object store");

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Upload(e.to_string()))?;

        let url = format!("{}/{}", self.public_base_url.trim_end_matches('/'), key);
        info!(key, url = %url, "uploaded still to object store");
        Ok(url)
    }
}
