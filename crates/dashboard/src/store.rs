//! Persistence port for the dashboard.
//!
//! The dashboard keeps one shop connection and the shop's reviews. Where
//! they live is behind [`ConnectionStore`]: [`MemoryStore`] for tests and
//! throwaway sessions, [`JsonFileStore`] for the CLI.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::review::Review;
use crate::session::ShopConnection;

/// Errors that can occur reading or writing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store document is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the dashboard keeps its connection and reviews.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    async fn load_connection(&self) -> Result<Option<ShopConnection>, StoreError>;

    async fn save_connection(&self, connection: &ShopConnection) -> Result<(), StoreError>;

    async fn clear_connection(&self) -> Result<(), StoreError>;

    async fn load_reviews(&self) -> Result<Vec<Review>, StoreError>;

    async fn save_reviews(&self, reviews: &[Review]) -> Result<(), StoreError>;
}

/// Everything the dashboard persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    connection: Option<ShopConnection>,
    #[serde(default)]
    reviews: Vec<Review>,
}

// =============================================================================
// Memory
// =============================================================================

/// Store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<Document>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn load_connection(&self) -> Result<Option<ShopConnection>, StoreError> {
        Ok(self.document.read().await.connection.clone())
    }

    async fn save_connection(&self, connection: &ShopConnection) -> Result<(), StoreError> {
        self.document.write().await.connection = Some(connection.clone());
        Ok(())
    }

    async fn clear_connection(&self) -> Result<(), StoreError> {
        self.document.write().await.connection = None;
        Ok(())
    }

    async fn load_reviews(&self) -> Result<Vec<Review>, StoreError> {
        Ok(self.document.read().await.reviews.clone())
    }

    async fn save_reviews(&self, reviews: &[Review]) -> Result<(), StoreError> {
        self.document.write().await.reviews = reviews.to_vec();
        Ok(())
    }
}

// =============================================================================
// JSON file
// =============================================================================

/// Store backed by one JSON document on disk.
///
/// A missing file reads as empty. Writes go to a sibling temp file which is
/// then renamed over the document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Document::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::default()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    async fn write(&self, document: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), "Store written");
        Ok(())
    }

    /// Read, modify and write the document under the write lock.
    async fn update(&self, f: impl FnOnce(&mut Document) + Send) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read().await?;
        f(&mut document);
        self.write(&document).await
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ConnectionStore for JsonFileStore {
    async fn load_connection(&self) -> Result<Option<ShopConnection>, StoreError> {
        Ok(self.read().await?.connection)
    }

    async fn save_connection(&self, connection: &ShopConnection) -> Result<(), StoreError> {
        let connection = connection.clone();
        self.update(move |doc| doc.connection = Some(connection))
            .await
    }

    async fn clear_connection(&self) -> Result<(), StoreError> {
        self.update(|doc| doc.connection = None).await
    }

    async fn load_reviews(&self) -> Result<Vec<Review>, StoreError> {
        Ok(self.read().await?.reviews)
    }

    async fn save_reviews(&self, reviews: &[Review]) -> Result<(), StoreError> {
        let reviews = reviews.to_vec();
        self.update(move |doc| doc.reviews = reviews).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use secrecy::{ExposeSecret, SecretString};
    use trustloop_core::ShopDomain;

    use super::*;
    use crate::review::ReviewStatus;

    fn connection() -> ShopConnection {
        ShopConnection {
            shop_domain: ShopDomain::normalize("demo"),
            access_token: SecretString::from("shpat_token"),
            shop_name: "Demo".to_string(),
            shop_email: Some("a@b.com".to_string()),
            plan: Some("basic".to_string()),
            currency: Some("USD".to_string()),
            timezone: Some("UTC".to_string()),
            connected_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    fn review() -> Review {
        Review {
            id: "1".to_string(),
            shop_domain: ShopDomain::normalize("demo"),
            product_id: "632910392".to_string(),
            product_title: "Headphones".to_string(),
            customer_name: "Sarah".to_string(),
            customer_email: "sarah@example.com".to_string(),
            rating: 5,
            title: None,
            text: "Great".to_string(),
            photos: Vec::new(),
            status: ReviewStatus::Approved,
            is_verified: true,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            helpful_votes: 0,
            reply: None,
        }
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("trustloop-store-{}", uuid::Uuid::new_v4()))
            .join("store.json")
    }

    async fn exercise(store: &dyn ConnectionStore) {
        assert!(store.load_connection().await.unwrap().is_none());
        assert!(store.load_reviews().await.unwrap().is_empty());

        store.save_connection(&connection()).await.unwrap();
        store.save_reviews(&[review()]).await.unwrap();

        let loaded = store.load_connection().await.unwrap().unwrap();
        assert_eq!(loaded.shop_domain.as_str(), "demo.myshopify.com");
        assert_eq!(loaded.access_token.expose_secret(), "shpat_token");
        assert_eq!(store.load_reviews().await.unwrap(), vec![review()]);

        store.clear_connection().await.unwrap();
        assert!(store.load_connection().await.unwrap().is_none());
        assert_eq!(store.load_reviews().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_json_file_store() {
        let path = temp_path();
        let store = JsonFileStore::new(&path);
        exercise(&store).await;

        // A second handle on the same file sees the same document.
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.load_reviews().await.unwrap(), vec![review()]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_corrupt_document() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let err = JsonFileStore::new(&path).load_connection().await.unwrap_err();
        assert!(matches!(err, StoreError::Json(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
