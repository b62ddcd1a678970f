//! Shared fixtures wiring the in-memory adapters into the services.

use std::sync::Arc;

use mockable::DefaultClock;
use questbank::identity::{Principal, UserId};
use questbank::ledger::{
    adapters::memory::InMemoryLedgerRepository, services::TransactionService,
};
use questbank::settlement::TaskSettlementService;
use questbank::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::Task,
    services::{CreateTaskRequest, TaskLifecycleService},
};
use rstest::fixture;
use rust_decimal::Decimal;

/// Task service over the in-memory repository.
pub type Tasks = TaskLifecycleService<InMemoryTaskRepository, DefaultClock>;
/// Transaction service over the in-memory ledger.
pub type Transactions = TransactionService<InMemoryLedgerRepository, DefaultClock>;
/// Settlement service over both in-memory adapters.
pub type Settlements =
    TaskSettlementService<InMemoryTaskRepository, InMemoryLedgerRepository, DefaultClock>;

/// Creating administrator used across scenarios.
pub const ADMIN: Principal = Principal::admin(1);
/// Second administrator who did not create the tasks.
pub const OTHER_ADMIN: Principal = Principal::admin(2);
/// Assigned worker.
pub const WORKER: Principal = Principal::user(42);

/// Services sharing one task store and one ledger.
pub struct Stack {
    pub ledger: Arc<InMemoryLedgerRepository>,
    pub tasks: Tasks,
    pub transactions: Arc<Transactions>,
    pub settlements: Arc<Settlements>,
}

impl Stack {
    /// Builds a stack with empty stores.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let task_repository = Arc::new(InMemoryTaskRepository::new());
        let ledger = Arc::new(InMemoryLedgerRepository::new());
        let settlements = TaskSettlementService::new(
            TaskLifecycleService::new(Arc::clone(&task_repository), Arc::clone(&clock)),
            TransactionService::new(Arc::clone(&ledger), Arc::clone(&clock)),
        );
        Self {
            tasks: TaskLifecycleService::new(task_repository, Arc::clone(&clock)),
            transactions: Arc::new(TransactionService::new(Arc::clone(&ledger), clock)),
            settlements: Arc::new(settlements),
            ledger,
        }
    }

    /// Sets a user's balance.
    pub fn fund(&self, user_id: UserId, amount: Decimal) {
        self.ledger
            .seed_balance(user_id, amount)
            .expect("seed balance");
    }

    /// Returns a user's current balance amount.
    pub async fn balance(&self, user_id: UserId) -> Decimal {
        self.transactions
            .balance_of(user_id)
            .await
            .expect("balance exists")
            .amount()
    }

    /// Creates a task for `WORKER` and submits it for acceptance.
    pub async fn submitted_task(&self, name: &str, amount: Decimal) -> Task {
        let task = self
            .tasks
            .create(&ADMIN, CreateTaskRequest::for_user(name, amount, WORKER.id()))
            .await
            .expect("create task");
        self.tasks
            .request_acceptance(task.id(), &WORKER)
            .await
            .expect("request acceptance")
    }
}

/// Provides a stack where the admin holds 100 and the worker holds 0.
#[fixture]
pub fn stack() -> Stack {
    let stack = Stack::new();
    stack.fund(ADMIN.id(), Decimal::from(100));
    stack.fund(WORKER.id(), Decimal::ZERO);
    stack
}
