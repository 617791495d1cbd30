use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("The specified key does not exist: {0}")]
    NotFound(String),

    #[error("Object store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Object store error: {0}")]
    Backend(String),
}

/// An object fetched from the store, body not yet read.
pub struct ObjectDownload {
    pub body: ByteStream,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
}

/// Bucket-backed object storage addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<(), StorageError>;

    async fn get_object(&self, key: &str) -> Result<ObjectDownload, StorageError>;

    /// Bucket name, for logging and health output
    fn bucket(&self) -> &str;
}

/// Bound a store call by `limit`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, StorageError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| StorageError::Timeout(limit))?
}

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let res = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={}",
                self.bucket,
                key,
                DisplayErrorContext(&e)
            );
            return Err(StorageError::Backend(DisplayErrorContext(&e).to_string()));
        }
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<ObjectDownload, StorageError> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(output) => Ok(ObjectDownload {
                body: output.body,
                content_type: output.content_type,
                content_length: output.content_length,
            }),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    Err(StorageError::NotFound(key.to_string()))
                } else {
                    tracing::error!(
                        "S3 get_object failed: bucket={}, key={}, error={}",
                        self.bucket,
                        key,
                        DisplayErrorContext(&service_error)
                    );
                    Err(StorageError::Backend(
                        DisplayErrorContext(&service_error).to_string(),
                    ))
                }
            }
        }
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}
