//! Composition root wiring repositories, services and settings together.

use crate::config::{QuestbankSettings, SettingsError};
use crate::ledger::{
    adapters::{memory::InMemoryLedgerRepository, postgres::PostgresLedgerRepository},
    ports::LedgerRepository,
    services::TransactionService,
};
use crate::settlement::TaskSettlementService;
use crate::task::{
    adapters::{memory::InMemoryTaskRepository, postgres::PostgresTaskRepository},
    ports::TaskRepository,
    services::TaskLifecycleService,
};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// The three Questbank services sharing one pair of repositories.
pub struct Questbank<R, L, C>
where
    R: TaskRepository,
    L: LedgerRepository,
    C: Clock + Send + Sync,
{
    /// Task lifecycle operations.
    pub tasks: TaskLifecycleService<R, C>,
    /// Balances, transfers and ledger queries.
    pub transactions: TransactionService<L, C>,
    /// Accept-and-pay and reconciliation.
    pub settlements: TaskSettlementService<R, L, C>,
}

/// Questbank backed by the in-memory adapters.
pub type InMemoryQuestbank =
    Questbank<InMemoryTaskRepository, InMemoryLedgerRepository, DefaultClock>;

/// Questbank backed by `PostgreSQL`.
pub type PostgresQuestbank =
    Questbank<PostgresTaskRepository, PostgresLedgerRepository, DefaultClock>;

impl<R, L, C> Questbank<R, L, C>
where
    R: TaskRepository,
    L: LedgerRepository,
    C: Clock + Send + Sync,
{
    /// Builds every service over the given repositories and clock.
    #[must_use]
    pub fn new(
        tasks: Arc<R>,
        ledger: Arc<L>,
        clock: Arc<C>,
        settings: &QuestbankSettings,
    ) -> Self {
        let transactions = || {
            TransactionService::new(Arc::clone(&ledger), Arc::clone(&clock))
                .with_leaderboard_limit(settings.leaderboard_limit)
        };
        let lifecycle = || TaskLifecycleService::new(Arc::clone(&tasks), Arc::clone(&clock));
        Self {
            tasks: lifecycle(),
            transactions: transactions(),
            settlements: TaskSettlementService::new(lifecycle(), transactions()),
        }
    }
}

impl InMemoryQuestbank {
    /// Builds a Questbank over fresh in-memory repositories.
    #[must_use]
    pub fn in_memory(settings: &QuestbankSettings) -> Self {
        Self::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::new(InMemoryLedgerRepository::new()),
            Arc::new(DefaultClock),
            settings,
        )
    }
}

impl PostgresQuestbank {
    /// Connects to the configured database and builds a Questbank over it.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingDatabaseUrl`] when no URL is set or
    /// [`SettingsError::Pool`] when the pool cannot connect.
    pub fn connect(settings: &QuestbankSettings) -> Result<Self, SettingsError> {
        let pool = settings.build_pool()?;
        Ok(Self::new(
            Arc::new(PostgresTaskRepository::new(pool.clone())),
            Arc::new(PostgresLedgerRepository::new(pool)),
            Arc::new(DefaultClock),
            settings,
        ))
    }
}
