//! In-memory storage backend
//!
//! Keeps every aggregate in process memory and enforces the same unique and
//! foreign-key constraints as the PostgreSQL schema, so use cases and the
//! unit of work can be exercised without a database.
//!
//! Transactions work on a snapshot of the state: `begin` clones it, `commit`
//! writes the snapshot back, and dropping an uncommitted transaction handle
//! discards it. The store takes one writer at a time: while a transaction is
//! open, writes on the ambient handle and a second `begin` fail instead of
//! being lost when the snapshot is written back.

mod repositories;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::StorageError;

use crate::error::DatabaseError;
use crate::handle::DatabaseHandle;
use crate::unit_of_work::RepositoryRegistry;

pub use repositories::{
    MemoryAgreementRepository, MemoryPlanRepository, MemoryServiceRepository,
    MemorySystemRepository, MemoryUserRepository, MemoryUsersListRepository,
};
pub use state::MemoryState;

#[derive(Debug)]
struct Scope {
    parent: Arc<RwLock<MemoryState>>,
    parent_open: Arc<AtomicBool>,
    committed: AtomicBool,
}

impl Drop for Scope {
    fn drop(&mut self) {
        if !self.committed.load(Ordering::Acquire) {
            self.parent_open.store(false, Ordering::Release);
        }
    }
}

/// Handle over an in-memory store, or over a transaction snapshot of it
#[derive(Debug, Clone, Default)]
pub struct MemoryHandle {
    state: Arc<RwLock<MemoryState>>,
    /// Set while a transaction taken from this handle is open
    open: Arc<AtomicBool>,
    scope: Option<Arc<Scope>>,
}

impl MemoryHandle {
    /// Creates a handle over an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.read().await.clone()
    }

    pub(crate) async fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    pub(crate) async fn write<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        match &self.scope {
            Some(scope) if scope.committed.load(Ordering::Acquire) => {
                return Err(StorageError::transaction("Transaction has already been committed"));
            }
            None if self.open.load(Ordering::Acquire) => {
                return Err(StorageError::transaction(
                    "A transaction is open on this store; write through it",
                ));
            }
            _ => {}
        }
        let mut state = self.state.write().await;
        f(&mut state)
    }
}

/// Registry with every in-memory repository registered
pub fn memory_registry() -> RepositoryRegistry<MemoryHandle> {
    RepositoryRegistry::new()
        .plans(MemoryPlanRepository::new)
        .systems(MemorySystemRepository::new)
        .users(MemoryUserRepository::new)
        .agreements(MemoryAgreementRepository::new)
        .services(MemoryServiceRepository::new)
        .users_lists(MemoryUsersListRepository::new)
}

#[async_trait]
impl DatabaseHandle for MemoryHandle {
    async fn begin(&self) -> Result<Self, DatabaseError> {
        if self.scope.is_some() {
            return Err(DatabaseError::transaction("Nested transactions are not supported"));
        }
        if self.open.swap(true, Ordering::AcqRel) {
            return Err(DatabaseError::transaction("Another transaction is already open on this store"));
        }
        let snapshot = self.snapshot().await;
        Ok(Self {
            state: Arc::new(RwLock::new(snapshot)),
            open: Arc::new(AtomicBool::new(false)),
            scope: Some(Arc::new(Scope {
                parent: Arc::clone(&self.state),
                parent_open: Arc::clone(&self.open),
                committed: AtomicBool::new(false),
            })),
        })
    }

    async fn commit(&self) -> Result<(), DatabaseError> {
        let scope = self
            .scope
            .as_ref()
            .ok_or_else(|| DatabaseError::transaction("No transaction to commit"))?;
        if scope.committed.swap(true, Ordering::AcqRel) {
            return Err(DatabaseError::transaction("Transaction has already been committed"));
        }
        let snapshot = self.state.read().await.clone();
        *scope.parent.write().await = snapshot;
        scope.parent_open.store(false, Ordering::Release);
        Ok(())
    }

    fn is_transaction(&self) -> bool {
        self.scope.is_some()
    }
}
