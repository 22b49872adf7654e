// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::time::Duration;
use tracing::debug;

use super::text_store::{validate_location, StorageError, TextStore, WriteAck};
use crate::config::StorageConfig;

/// Text store backed by S3 (or an S3-compatible endpoint).
///
/// Credentials resolve through the AWS provider chain: explicit keys,
/// environment, shared credentials/config files, web identity, ECS and
/// instance metadata.
#[derive(Debug)]
pub struct S3TextStore {
    client: Client,
    sdk_config: SdkConfig,
}

impl S3TextStore {
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(Duration::from_secs(config.timeout_seconds))
                    .build(),
            );

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        if let Some(profile) = &config.profile {
            loader = loader.profile_name(profile.clone());
        }

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                config.session_token.clone(),
                None,
                "service-config",
            ));
        } else if let Some(path) = &config.shared_credentials_file {
            debug!("Resolving S3 credentials from {:?}", path);
            let files = ProfileFiles::builder()
                .with_file(ProfileFileKind::Credentials, path.clone())
                .build();
            let mut provider = ProfileFileCredentialsProvider::builder().profile_files(files);
            if let Some(profile) = &config.profile {
                provider = provider.profile_name(profile.clone());
            }
            loader = loader.credentials_provider(provider.build());
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            sdk_config,
        })
    }

    /// Resolve credentials the way a request would
    pub async fn resolve_credentials(&self) -> Result<Credentials, StorageError> {
        let provider = self
            .sdk_config
            .credentials_provider()
            .ok_or_else(|| StorageError::AccessDenied("no credentials provider".to_string()))?;

        provider
            .provide_credentials()
            .await
            .map_err(|e| StorageError::AccessDenied(DisplayErrorContext(e).to_string()))
    }

    fn map_error<E>(&self, err: SdkError<E, HttpResponse>, bucket: &str, key: &str) -> StorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let location = self.uri(bucket, key);
        let status = err.raw_response().map(|r| r.status().as_u16());

        match status {
            Some(404) => StorageError::NotFound(location),
            Some(401) | Some(403) => StorageError::AccessDenied(location),
            Some(s) if s >= 500 => {
                StorageError::Transient(format!("server error {} for {}", s, location))
            }
            Some(s) => StorageError::Rejected {
                status: s,
                message: DisplayErrorContext(err).to_string(),
            },
            None => StorageError::Transient(DisplayErrorContext(err).to_string()),
        }
    }
}

#[async_trait]
impl TextStore for S3TextStore {
    async fn read(&self, bucket: &str, key: &str) -> Result<String, StorageError> {
        validate_location(bucket, key)?;

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.map_error(e, bucket, key))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transient(e.to_string()))?
            .into_bytes();

        String::from_utf8(data.to_vec()).map_err(|e| StorageError::Encoding(e.to_string()))
    }

    async fn write(&self, bucket: &str, key: &str, text: &str) -> Result<WriteAck, StorageError> {
        validate_location(bucket, key)?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/plain; charset=utf-8")
            .body(ByteStream::from(text.as_bytes().to_vec()))
            .send()
            .await
            .map_err(|e| self.map_error(e, bucket, key))?;

        Ok(WriteAck {
            uri: self.uri(bucket, key),
            bytes_written: text.len(),
        })
    }

    async fn exists(&self, bucket: &str, key: &str) -> Result<bool, StorageError> {
        validate_location(bucket, key)?;

        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) => match self.map_error(e, bucket, key) {
                StorageError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    fn uri(&self, bucket: &str, key: &str) -> String {
        format!("s3://{}/{}", bucket, key)
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
