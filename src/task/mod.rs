//! Task lifecycle management.
//!
//! Administrators create tasks, users submit or decline them and the
//! creating admin accepts them. Every transition is checked against the
//! stored task and applied atomically by the repository. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
