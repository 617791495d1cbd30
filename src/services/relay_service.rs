use crate::api::error::AppError;
use crate::config::RelayConfig;
use crate::services::staging::{StagedFile, StagingError};
use crate::services::storage::{ObjectDownload, ObjectStore, StorageError, with_timeout};
use aws_sdk_s3::primitives::ByteStream;
use std::sync::Arc;

/// Result of a successful relay into the bucket.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub filename: String,
    pub url: String,
}

/// Moves staged uploads into the object store and reads them back.
pub struct RelayService {
    storage: Arc<dyn ObjectStore>,
    config: RelayConfig,
}

impl RelayService {
    pub fn new(storage: Arc<dyn ObjectStore>, config: RelayConfig) -> Self {
        Self { storage, config }
    }

    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    /// Upload a staged file under its key. The staged file is removed
    /// whether or not the store accepted it.
    pub async fn store(&self, staged: StagedFile) -> Result<StoredUpload, AppError> {
        tracing::info!(
            "preparing to upload {} ({} bytes) to bucket {}",
            staged.key,
            staged.size,
            self.storage.bucket()
        );

        let result: Result<(), AppError> = async {
            let body = ByteStream::from_path(staged.path())
                .await
                .map_err(|e| StagingError::Io(std::io::Error::other(e.to_string())))?;

            with_timeout(
                self.config.storage_timeout,
                self.storage
                    .put_object(&staged.key, body, &staged.content_type),
            )
            .await?;
            Ok(())
        }
        .await;

        let key = staged.key.clone();
        staged.remove();
        result?;

        tracing::info!("Successfully uploaded {}", key);
        Ok(StoredUpload {
            url: self.config.public_url(&key),
            filename: key,
        })
    }

    pub async fn fetch(&self, key: &str) -> Result<ObjectDownload, StorageError> {
        with_timeout(self.config.storage_timeout, self.storage.get_object(key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::staging::stage_upload;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use std::time::Duration;

    enum Behaviour {
        Accept,
        Fail,
        Hang,
    }

    struct ScriptedStore(Behaviour);

    #[async_trait]
    impl ObjectStore for ScriptedStore {
        async fn put_object(
            &self,
            _key: &str,
            body: ByteStream,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            match self.0 {
                Behaviour::Accept => {
                    body.collect()
                        .await
                        .map_err(|e| StorageError::Backend(e.to_string()))?;
                    Ok(())
                }
                Behaviour::Fail => Err(StorageError::Backend("AccessDenied".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                }
            }
        }

        async fn get_object(&self, key: &str) -> Result<ObjectDownload, StorageError> {
            Err(StorageError::NotFound(key.to_string()))
        }

        fn bucket(&self) -> &str {
            "test-bucket"
        }
    }

    async fn staged_in(dir: &std::path::Path) -> StagedFile {
        let body = stream::iter(vec![Ok::<_, String>(Bytes::from_static(b"payload"))]);
        stage_upload(dir, "report.pdf", Some("application/pdf"), body, 1024)
            .await
            .unwrap()
    }

    fn service(behaviour: Behaviour) -> RelayService {
        let config = RelayConfig {
            base_url: "https://files.example.com".to_string(),
            storage_timeout: Duration::from_millis(200),
            ..RelayConfig::default()
        };
        RelayService::new(Arc::new(ScriptedStore(behaviour)), config)
    }

    #[tokio::test]
    async fn test_store_success_removes_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = staged_in(dir.path()).await;
        let key = staged.key.clone();

        let stored = service(Behaviour::Accept).store(staged).await.unwrap();
        assert_eq!(stored.filename, key);
        assert_eq!(stored.url, format!("https://files.example.com/{}", key));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_removes_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = staged_in(dir.path()).await;

        let err = service(Behaviour::Fail).store(staged).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Backend(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_store_timeout_removes_stage_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = staged_in(dir.path()).await;

        let err = service(Behaviour::Hang).store(staged).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Timeout(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_passes_store_errors_through() {
        let res = service(Behaviour::Accept).fetch("missing").await;
        assert!(matches!(res, Err(StorageError::NotFound(k)) if k == "missing"));
    }
}
