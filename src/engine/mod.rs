//! Core of the relay: trade state, notification delivery and the jobs that
//! drive them.

pub mod delivery;
pub mod format;
pub mod ledger;
pub mod orchestrator;
pub mod profit;
pub mod scheduler;
