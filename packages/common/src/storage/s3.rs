use std::io::Cursor;

use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BlobStore, BoxReader};

/// Connection settings for an S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Blob store backed by one bucket of an S3-compatible service (AWS, MinIO, R2).
pub struct S3BlobStore {
    name: String,
    bucket: Box<Bucket>,
    max_size: u64,
}

impl S3BlobStore {
    pub fn new(settings: &S3Settings, bucket: &str, max_size: u64) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: settings.region.clone(),
            endpoint: settings.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(e.to_string()))?;

        let handle = Bucket::new(bucket, region, credentials)
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .with_path_style();

        Ok(Self {
            name: bucket.to_string(),
            bucket: handle,
            max_size,
        })
    }
}

fn backend_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn bucket(&self) -> &str {
        &self.name
    }

    async fn put(&self, data: &[u8]) -> Result<ContentHash, StorageError> {
        let actual = data.len() as u64;
        if actual > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual,
                limit: self.max_size,
            });
        }

        let hash = ContentHash::compute(data);
        let response = self
            .bucket
            .put_object(hash.object_key(), data)
            .await
            .map_err(backend_error)?;

        match response.status_code() {
            200..=299 => Ok(hash),
            code => Err(StorageError::Backend(format!(
                "put {} returned status {code}",
                hash.object_key()
            ))),
        }
    }

    async fn get_stream(&self, hash: &ContentHash) -> Result<BoxReader, StorageError> {
        let response = self
            .bucket
            .get_object(hash.object_key())
            .await
            .map_err(backend_error)?;

        match response.status_code() {
            200..=299 => Ok(Box::new(Cursor::new(response.bytes().to_vec()))),
            404 => Err(StorageError::NotFound(hash.to_hex())),
            code => Err(StorageError::Backend(format!(
                "get {} returned status {code}",
                hash.object_key()
            ))),
        }
    }

    async fn delete(&self, hash: &ContentHash) -> Result<bool, StorageError> {
        let (_, head_status) = self
            .bucket
            .head_object(hash.object_key())
            .await
            .map_err(backend_error)?;
        if head_status == 404 {
            return Ok(false);
        }

        let response = self
            .bucket
            .delete_object(hash.object_key())
            .await
            .map_err(backend_error)?;

        match response.status_code() {
            200..=299 => Ok(true),
            404 => Ok(false),
            code => Err(StorageError::Backend(format!(
                "delete {} returned status {code}",
                hash.object_key()
            ))),
        }
    }
}
