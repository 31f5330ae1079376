//! Persistence collaborator interfaces
//!
//! The core treats storage as append/update only. In-memory implementations
//! back the default wiring and the test suite; a database-backed system
//! plugs in behind the same traits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::utils::types::{BundleCandidate, BundleStatus, ExecutionRecord, PendingTransaction};

/// Errors from a repository backend
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("no entity with id {0}")]
    NotFound(String),
}

/// Bundle persistence
#[async_trait]
pub trait BundleRepository: Send + Sync {
    /// Persist a new bundle, returning it with any store-assigned fields set
    async fn save(&self, bundle: BundleCandidate) -> Result<BundleCandidate, StorageError>;

    async fn update_status(&self, id: &str, status: BundleStatus) -> Result<(), StorageError>;

    async fn get(&self, id: &str) -> Result<Option<BundleCandidate>, StorageError>;
}

/// Execution record persistence
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    async fn save(&self, record: ExecutionRecord) -> Result<(), StorageError>;

    async fn get(&self, id: &str) -> Result<Option<ExecutionRecord>, StorageError>;
}

/// Observed mempool transaction persistence
#[async_trait]
pub trait MempoolRepository: Send + Sync {
    async fn save_transaction(&self, tx: &PendingTransaction) -> Result<(), StorageError>;
}

/// In-memory bundle store
#[derive(Debug, Default)]
pub struct InMemoryBundleRepository {
    bundles: Arc<RwLock<HashMap<String, BundleCandidate>>>,
}

impl InMemoryBundleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BundleRepository for InMemoryBundleRepository {
    async fn save(&self, bundle: BundleCandidate) -> Result<BundleCandidate, StorageError> {
        self.bundles
            .write()
            .await
            .insert(bundle.id.clone(), bundle.clone());
        Ok(bundle)
    }

    async fn update_status(&self, id: &str, status: BundleStatus) -> Result<(), StorageError> {
        let mut bundles = self.bundles.write().await;
        let bundle = bundles
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        bundle.status = status;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<BundleCandidate>, StorageError> {
        Ok(self.bundles.read().await.get(id).cloned())
    }
}

/// In-memory execution record store
#[derive(Debug, Default)]
pub struct InMemoryExecutionRepository {
    records: Arc<RwLock<HashMap<String, ExecutionRecord>>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn save(&self, record: ExecutionRecord) -> Result<(), StorageError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ExecutionRecord>, StorageError> {
        Ok(self.records.read().await.get(id).cloned())
    }
}

/// In-memory mempool transaction store
#[derive(Debug, Default)]
pub struct InMemoryMempoolRepository {
    transactions: Arc<RwLock<HashMap<String, PendingTransaction>>>,
}

impl InMemoryMempoolRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }
}

#[async_trait]
impl MempoolRepository for InMemoryMempoolRepository {
    async fn save_transaction(&self, tx: &PendingTransaction) -> Result<(), StorageError> {
        self.transactions
            .write()
            .await
            .insert(tx.hash.as_str().to_string(), tx.clone());
        Ok(())
    }
}
