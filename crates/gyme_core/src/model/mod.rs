//! Domain model for accounts, exercises, friendships, logged workouts and
//! their reactions and comments.
//!
//! # Responsibility
//! - Define plain entity snapshots shared by rules, repositories and services.
//! - Keep validation that depends only on one entity next to its type.
//!
//! # Invariants
//! - Every persisted entity is identified by a stable `Uuid`.
//! - Entities carry no storage handles; they are loaded and saved by `repo`.

pub mod exercise;
pub mod friendship;
pub mod social;
pub mod user;
pub mod workout;
