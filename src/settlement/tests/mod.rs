//! Unit tests for task settlement.
