//! Shared fixtures for in-memory integration tests.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use foreman::config::CoordinatorConfig;
use foreman::orchestrator::adapters::memory::InMemoryOrchestratorDirectory;
use foreman::orchestrator::services::{OrchestratorRegistryService, RegisterOrchestratorRequest};
use foreman::registry::adapters::memory::{InMemoryFlowRegistry, InMemoryRoleRegistry};
use foreman::scheduler::LeaseReconciler;
use foreman::task::adapters::memory::InMemoryTaskStore;
use foreman::task::domain::Task;
use foreman::task::services::{CreateTaskRequest, TaskFacade};
use mockable::Clock;
use std::sync::{Arc, RwLock};

/// Deterministic clock whose instant can be advanced by tests.
#[derive(Debug, Clone)]
pub struct FrozenClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FrozenClock {
    /// Creates a clock frozen at a fixed reference instant.
    #[must_use]
    pub fn new() -> Self {
        let reference = Utc
            .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
            .single()
            .expect("valid reference instant");
        Self {
            now: Arc::new(RwLock::new(reference)),
        }
    }

    /// Advances the clock by the given number of seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut now = self.now.write().expect("clock lock");
        *now += Duration::seconds(seconds);
    }
}

impl Default for FrozenClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FrozenClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock")
    }
}

/// Facade type used by the integration harness.
pub type TestFacade =
    TaskFacade<InMemoryTaskStore, InMemoryOrchestratorDirectory, InMemoryRoleRegistry, FrozenClock>;

/// Reconciler type used by the integration harness.
pub type TestReconciler =
    LeaseReconciler<InMemoryTaskStore, InMemoryOrchestratorDirectory, FrozenClock>;

/// Fully wired in-memory coordination core.
pub struct Harness {
    pub store: Arc<InMemoryTaskStore>,
    pub directory: Arc<InMemoryOrchestratorDirectory>,
    pub roles: Arc<InMemoryRoleRegistry>,
    pub flows: Arc<InMemoryFlowRegistry>,
    pub clock: Arc<FrozenClock>,
    pub config: CoordinatorConfig,
    pub facade: TestFacade,
    pub reconciler: TestReconciler,
}

impl Harness {
    /// Wires every in-memory adapter behind a facade and reconciler.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let directory = Arc::new(InMemoryOrchestratorDirectory::new());
        let roles = Arc::new(InMemoryRoleRegistry::new());
        let flows = Arc::new(InMemoryFlowRegistry::new());
        let clock = Arc::new(FrozenClock::new());
        let config = CoordinatorConfig::default();
        let facade = TaskFacade::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&roles),
            Arc::clone(&clock),
            config.clone(),
        );
        let reconciler = LeaseReconciler::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&clock),
            config.clone(),
        );
        Self {
            store,
            directory,
            roles,
            flows,
            clock,
            config,
            facade,
            reconciler,
        }
    }

    /// Registers an orchestrator and returns its derived identifier.
    pub async fn register_orchestrator(&self, cluster: &str, machine: &str, scope: &str) -> String {
        let service =
            OrchestratorRegistryService::new(Arc::clone(&self.directory), Arc::clone(&self.clock));
        let registration = service
            .register(RegisterOrchestratorRequest::new(cluster, machine, scope))
            .await
            .expect("registration should succeed");
        registration.id().as_str().to_owned()
    }

    /// Creates a pending task with sensible defaults.
    pub async fn create_task(&self, id: &str, scope: &str) -> Task {
        self.facade
            .create_task(CreateTaskRequest::new(
                id,
                "tasks/work.md",
                "main",
                scope,
            ))
            .await
            .expect("task creation should succeed")
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
