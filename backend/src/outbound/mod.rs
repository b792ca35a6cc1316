//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: mutex-guarded store for database-less runs and tests
//! - **hashing**: bcrypt credential hashing
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no lending rules.

pub mod hashing;
pub mod memory;
pub mod persistence;
