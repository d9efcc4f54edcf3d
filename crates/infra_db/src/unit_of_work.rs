//! Unit of Work
//!
//! Coordinates the repositories of one request so that work touching several
//! aggregates commits or rolls back as a whole.
//!
//! # States
//!
//! - **Idle**: repositories are bound to the ambient handle, built on first
//!   use and cached.
//! - **In transaction**: inside [`UnitOfWork::execute`] the work receives a
//!   scoped unit of work whose repositories are all rebuilt against the
//!   transaction handle. The idle cache is never reused there.
//!
//! Repositories obtained before `execute` stay bound to the ambient handle.
//! Work must fetch its repositories from the unit of work it is given.
//!
//! # Example
//!
//! ```rust,ignore
//! let uow = UnitOfWork::new(handle, postgres_registry());
//! uow.execute(|uow| Box::pin(async move {
//!     let services = uow.services()?;
//!     services.delete(service_id).await?;
//!     Ok::<_, UseCaseError>(())
//! }))
//! .await?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, warn};

use core_kernel::StorageError;
use domain_agreement::{
    AgreementRepository, PlanRepository, ServiceRepository, SystemRepository, UserRepository,
    UsersListRepository,
};

use crate::handle::DatabaseHandle;

/// Every repository a unit of work can hand out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepositoryKind {
    Plan,
    System,
    User,
    Agreement,
    Service,
    UsersList,
}

impl RepositoryKind {
    pub const ALL: [RepositoryKind; 6] = [
        RepositoryKind::Plan,
        RepositoryKind::System,
        RepositoryKind::User,
        RepositoryKind::Agreement,
        RepositoryKind::Service,
        RepositoryKind::UsersList,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RepositoryKind::Plan => "PlanRepository",
            RepositoryKind::System => "SystemRepository",
            RepositoryKind::User => "UserRepository",
            RepositoryKind::Agreement => "AgreementRepository",
            RepositoryKind::Service => "ServiceRepository",
            RepositoryKind::UsersList => "UsersListRepository",
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A repository of any registered kind
#[derive(Clone)]
pub enum Repository {
    Plan(Arc<dyn PlanRepository>),
    System(Arc<dyn SystemRepository>),
    User(Arc<dyn UserRepository>),
    Agreement(Arc<dyn AgreementRepository>),
    Service(Arc<dyn ServiceRepository>),
    UsersList(Arc<dyn UsersListRepository>),
}

impl Repository {
    pub fn kind(&self) -> RepositoryKind {
        match self {
            Repository::Plan(_) => RepositoryKind::Plan,
            Repository::System(_) => RepositoryKind::System,
            Repository::User(_) => RepositoryKind::User,
            Repository::Agreement(_) => RepositoryKind::Agreement,
            Repository::Service(_) => RepositoryKind::Service,
            Repository::UsersList(_) => RepositoryKind::UsersList,
        }
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Repository({})", self.kind())
    }
}

/// Errors raised by the unit of work itself
#[derive(Debug, Error)]
pub enum UnitOfWorkError {
    /// No factory was registered for the requested kind
    #[error("Repository {0} not registered")]
    NotRegistered(RepositoryKind),

    /// A factory produced a repository of another kind
    #[error("Repository {expected} requested but {found} was built")]
    KindMismatch {
        expected: RepositoryKind,
        found: RepositoryKind,
    },

    /// Required repositories were missing when the unit of work was built
    #[error("Repositories not registered: {}", format_kinds(.0))]
    MissingRepositories(Vec<RepositoryKind>),

    /// `execute` was called on a unit of work that is already in a transaction
    #[error("Nested transactions are not supported")]
    NestedTransaction,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn format_kinds(kinds: &[RepositoryKind]) -> String {
    kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
}

type Factory<H> = Arc<dyn Fn(H) -> Repository + Send + Sync>;

/// Repository factories keyed by kind
///
/// Each registration method only accepts a factory producing its own kind.
pub struct RepositoryRegistry<H> {
    factories: HashMap<RepositoryKind, Factory<H>>,
}

macro_rules! register {
    ($method:ident, $kind:ident, $port:ident) => {
        pub fn $method<R, F>(mut self, factory: F) -> Self
        where
            R: $port + 'static,
            F: Fn(H) -> R + Send + Sync + 'static,
        {
            self.factories.insert(
                RepositoryKind::$kind,
                Arc::new(move |handle: H| Repository::$kind(Arc::new(factory(handle)))),
            );
            self
        }
    };
}

impl<H: DatabaseHandle> RepositoryRegistry<H> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    register!(plans, Plan, PlanRepository);
    register!(systems, System, SystemRepository);
    register!(users, User, UserRepository);
    register!(agreements, Agreement, AgreementRepository);
    register!(services, Service, ServiceRepository);
    register!(users_lists, UsersList, UsersListRepository);

    pub fn is_registered(&self, kind: RepositoryKind) -> bool {
        self.factories.contains_key(&kind)
    }

    /// Registered kinds in declaration order
    pub fn kinds(&self) -> Vec<RepositoryKind> {
        RepositoryKind::ALL
            .into_iter()
            .filter(|k| self.is_registered(*k))
            .collect()
    }

    fn build(&self, kind: RepositoryKind, handle: &H) -> Option<Repository> {
        self.factories.get(&kind).map(|factory| factory(handle.clone()))
    }
}

impl<H: DatabaseHandle> Default for RepositoryRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for RepositoryRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("RepositoryRegistry").field("kinds", &kinds).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    Idle,
    InTransaction,
}

/// Future returned by the work passed to [`UnitOfWork::execute`]
pub type WorkFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Binds a set of repositories to one handle and runs work transactionally
pub struct UnitOfWork<H: DatabaseHandle> {
    handle: H,
    registry: Arc<RepositoryRegistry<H>>,
    state: UnitOfWorkState,
    repositories: Mutex<HashMap<RepositoryKind, Repository>>,
}

impl<H: DatabaseHandle> UnitOfWork<H> {
    /// Creates an idle unit of work over the ambient handle
    pub fn new(handle: H, registry: impl Into<Arc<RepositoryRegistry<H>>>) -> Self {
        Self {
            handle,
            registry: registry.into(),
            state: UnitOfWorkState::Idle,
            repositories: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a unit of work after checking every required kind is registered
    pub fn with_required(
        handle: H,
        registry: impl Into<Arc<RepositoryRegistry<H>>>,
        required: &[RepositoryKind],
    ) -> Result<Self, UnitOfWorkError> {
        let uow = Self::new(handle, registry);
        uow.require(required)?;
        Ok(uow)
    }

    /// Fails with every kind in `required` that has no registered factory
    ///
    /// Use cases call this when they are built, so wiring mistakes surface
    /// at startup instead of inside the first transaction.
    pub fn require(&self, required: &[RepositoryKind]) -> Result<(), UnitOfWorkError> {
        let mut missing: Vec<_> = required
            .iter()
            .copied()
            .filter(|k| !self.registry.is_registered(*k))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(UnitOfWorkError::MissingRepositories(missing))
    }

    pub fn state(&self) -> UnitOfWorkState {
        self.state
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Returns the repository of a kind bound to the current handle
    pub fn get_repository(&self, kind: RepositoryKind) -> Result<Repository, UnitOfWorkError> {
        let mut cache = self.cache();
        if let Some(repository) = cache.get(&kind) {
            return Ok(repository.clone());
        }
        let repository = self
            .registry
            .build(kind, &self.handle)
            .ok_or(UnitOfWorkError::NotRegistered(kind))?;
        cache.insert(kind, repository.clone());
        Ok(repository)
    }

    pub fn plans(&self) -> Result<Arc<dyn PlanRepository>, UnitOfWorkError> {
        match self.get_repository(RepositoryKind::Plan)? {
            Repository::Plan(repository) => Ok(repository),
            other => Err(mismatch(RepositoryKind::Plan, &other)),
        }
    }

    pub fn systems(&self) -> Result<Arc<dyn SystemRepository>, UnitOfWorkError> {
        match self.get_repository(RepositoryKind::System)? {
            Repository::System(repository) => Ok(repository),
            other => Err(mismatch(RepositoryKind::System, &other)),
        }
    }

    pub fn users(&self) -> Result<Arc<dyn UserRepository>, UnitOfWorkError> {
        match self.get_repository(RepositoryKind::User)? {
            Repository::User(repository) => Ok(repository),
            other => Err(mismatch(RepositoryKind::User, &other)),
        }
    }

    pub fn agreements(&self) -> Result<Arc<dyn AgreementRepository>, UnitOfWorkError> {
        match self.get_repository(RepositoryKind::Agreement)? {
            Repository::Agreement(repository) => Ok(repository),
            other => Err(mismatch(RepositoryKind::Agreement, &other)),
        }
    }

    pub fn services(&self) -> Result<Arc<dyn ServiceRepository>, UnitOfWorkError> {
        match self.get_repository(RepositoryKind::Service)? {
            Repository::Service(repository) => Ok(repository),
            other => Err(mismatch(RepositoryKind::Service, &other)),
        }
    }

    pub fn users_lists(&self) -> Result<Arc<dyn UsersListRepository>, UnitOfWorkError> {
        match self.get_repository(RepositoryKind::UsersList)? {
            Repository::UsersList(repository) => Ok(repository),
            other => Err(mismatch(RepositoryKind::UsersList, &other)),
        }
    }

    /// Runs `work` inside one transaction
    ///
    /// The transaction commits when `work` returns `Ok`. When it returns
    /// `Err` the error is handed back unchanged and the transaction is
    /// dropped, which rolls it back.
    pub async fn execute<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'u> FnOnce(&'u UnitOfWork<H>) -> WorkFuture<'u, T, E> + Send,
        T: Send,
        E: From<UnitOfWorkError> + Send,
    {
        if self.state == UnitOfWorkState::InTransaction {
            return Err(UnitOfWorkError::NestedTransaction.into());
        }

        let transaction = self.handle.begin().await.map_err(storage_error)?;
        debug!("transaction started");

        let scoped = self.bind_transaction(transaction.clone());
        let result = work(&scoped).await;
        drop(scoped);

        match result {
            Ok(value) => {
                transaction.commit().await.map_err(storage_error)?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(error) => {
                warn!("work failed, rolling back transaction");
                Err(error)
            }
        }
    }

    fn bind_transaction(&self, transaction: H) -> UnitOfWork<H> {
        let repositories = self
            .registry
            .kinds()
            .into_iter()
            .filter_map(|kind| {
                self.registry
                    .build(kind, &transaction)
                    .map(|repository| (kind, repository))
            })
            .collect();

        UnitOfWork {
            handle: transaction,
            registry: Arc::clone(&self.registry),
            state: UnitOfWorkState::InTransaction,
            repositories: Mutex::new(repositories),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<RepositoryKind, Repository>> {
        self.repositories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A unit of work over the same handle, registry and state, with an empty
/// repository cache
///
/// Cloning a scoped unit of work inside `execute` yields another scoped
/// unit of work on the same transaction.
impl<H: DatabaseHandle> Clone for UnitOfWork<H> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            registry: Arc::clone(&self.registry),
            state: self.state,
            repositories: Mutex::new(HashMap::new()),
        }
    }
}

impl<H: DatabaseHandle + fmt::Debug> fmt::Debug for UnitOfWork<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("registry", &self.registry)
            .finish()
    }
}

fn mismatch(expected: RepositoryKind, found: &Repository) -> UnitOfWorkError {
    UnitOfWorkError::KindMismatch {
        expected,
        found: found.kind(),
    }
}

fn storage_error(error: crate::error::DatabaseError) -> UnitOfWorkError {
    UnitOfWorkError::Storage(error.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{memory_registry, MemoryHandle, MemoryPlanRepository};
    use chrono::NaiveDate;
    use domain_agreement::Plan;
    use rust_decimal_macros::dec;

    fn plan(code: &str) -> Plan {
        Plan::create(code, "Budget", dec!(10), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()).unwrap()
    }

    #[test]
    fn test_unregistered_repository_names_the_kind() {
        let registry = RepositoryRegistry::new().plans(MemoryPlanRepository::new);
        let uow = UnitOfWork::new(MemoryHandle::new(), registry);

        let err = uow.get_repository(RepositoryKind::UsersList).unwrap_err();
        assert_eq!(err.to_string(), "Repository UsersListRepository not registered");
        assert!(uow.plans().is_ok());
    }

    #[test]
    fn test_with_required_reports_every_missing_kind() {
        let registry = RepositoryRegistry::new().plans(MemoryPlanRepository::new);
        let err = UnitOfWork::with_required(
            MemoryHandle::new(),
            registry,
            &[RepositoryKind::Service, RepositoryKind::Plan, RepositoryKind::User],
        )
        .unwrap_err();

        match err {
            UnitOfWorkError::MissingRepositories(kinds) => {
                assert_eq!(kinds, vec![RepositoryKind::User, RepositoryKind::Service])
            }
            other => panic!("Expected MissingRepositories, got {:?}", other),
        }
    }

    #[test]
    fn test_idle_repositories_are_cached() {
        let uow = UnitOfWork::new(MemoryHandle::new(), memory_registry());
        let first = uow.plans().unwrap();
        let second = uow.plans().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(uow.state(), UnitOfWorkState::Idle);
    }

    #[tokio::test]
    async fn test_execute_commits_on_success() {
        let handle = MemoryHandle::new();
        let uow = UnitOfWork::new(handle.clone(), memory_registry());
        let bp25 = plan("BP25");
        let id = bp25.id();

        uow.execute(|uow| {
            Box::pin(async move {
                assert_eq!(uow.state(), UnitOfWorkState::InTransaction);
                uow.plans()?.insert(&bp25).await?;
                Ok::<_, UnitOfWorkError>(())
            })
        })
        .await
        .unwrap();

        assert!(uow.plans().unwrap().find(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_execute_rolls_back_on_error() {
        let handle = MemoryHandle::new();
        let uow = UnitOfWork::new(handle.clone(), memory_registry());
        let first = plan("BP25");
        let id = first.id();

        let result: Result<(), UnitOfWorkError> = uow
            .execute(|uow| {
                Box::pin(async move {
                    uow.plans()?.insert(&first).await?;
                    Err(UnitOfWorkError::Storage(StorageError::Query {
                        message: "synthetic failure".to_string(),
                    }))
                })
            })
            .await;

        assert!(result.is_err());
        assert!(uow.plans().unwrap().find(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transaction_repositories_are_not_the_idle_ones() {
        let uow = UnitOfWork::new(MemoryHandle::new(), memory_registry());
        let idle = uow.plans().unwrap();

        uow.execute(|scoped| {
            Box::pin(async move {
                assert!(!Arc::ptr_eq(&idle, &scoped.plans()?));
                assert!(scoped.handle().is_transaction());
                Ok::<_, UnitOfWorkError>(())
            })
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_require_passes_for_a_complete_registry() {
        let uow = UnitOfWork::new(MemoryHandle::new(), memory_registry());
        assert!(uow.require(&RepositoryKind::ALL).is_ok());
    }

    #[tokio::test]
    async fn test_clone_keeps_the_state() {
        let uow = UnitOfWork::new(MemoryHandle::new(), memory_registry());
        let idle = uow.clone();
        assert_eq!(idle.state(), UnitOfWorkState::Idle);
        assert!(!idle.handle().is_transaction());

        let result: Result<(), UnitOfWorkError> = uow
            .execute(|scoped| {
                Box::pin(async move {
                    let copy = scoped.clone();
                    assert_eq!(copy.state(), UnitOfWorkState::InTransaction);
                    assert!(copy.handle().is_transaction());
                    copy.execute(|_| Box::pin(async { Ok::<_, UnitOfWorkError>(()) }))
                        .await
                })
            })
            .await;
        assert!(matches!(result, Err(UnitOfWorkError::NestedTransaction)));
    }

    #[tokio::test]
    async fn test_nested_execute_is_rejected() {
        let uow = UnitOfWork::new(MemoryHandle::new(), memory_registry());

        let result: Result<(), UnitOfWorkError> = uow
            .execute(|outer| {
                Box::pin(async move {
                    outer
                        .execute(|_| Box::pin(async { Ok::<_, UnitOfWorkError>(()) }))
                        .await
                })
            })
            .await;

        assert!(matches!(result, Err(UnitOfWorkError::NestedTransaction)));
    }
}
