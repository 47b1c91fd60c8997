//! Pure domain rules.
//!
//! # Responsibility
//! - Compute entity deltas from loaded snapshots and a requested action.
//!
//! # Invariants
//! - Rule functions never perform I/O and never mutate their inputs.
//! - Every delta returned by one call must be committed as one unit.

pub mod friendship;
pub mod position_ledger;
