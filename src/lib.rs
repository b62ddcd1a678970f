//! Questbank: task rewards backed by a transactional balance ledger.
//!
//! Administrators publish tasks with a reward, users submit them and the
//! creating administrator accepts them and pays the reward from their own
//! balance. The crate holds the task state machine, the ledger and the
//! services that compose them; request routing and credential handling
//! live outside it.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//! - **Services**: Orchestration with permission checks and logging
//!
//! # Modules
//!
//! - [`task`]: Task creation, lifecycle transitions and listings
//! - [`ledger`]: Balances, atomic transfers and the transaction log
//! - [`settlement`]: Accept-and-pay plus reconciliation of unpaid tasks
//! - [`identity`]: Principals and the identity resolution port
//! - [`error`]: Failure taxonomy shared by all services
//! - [`config`] and [`telemetry`]: Settings and logging bootstrap
//! - [`app`]: Wires repositories and settings into the services

pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod money;
pub mod settlement;
pub mod task;
pub mod telemetry;
