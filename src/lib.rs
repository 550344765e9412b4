//! Customer 360 read API library.
//!
//! Read-only REST API over the customer, credit application, vehicle ownership and sync audit
//! tables of the back-office database.
//!
//! # Modules
//!
//! - `aggregates`: Profile summary, KPI counters and sync health derivation.
//! - `api`: Router, fallback and middleware.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: All SQL reads, bound to an injected pool.
//! - `deadline`: Per-request deadline for storage reads.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Row and response models.
//! - `query_builder`: Whitelisted filter/sort composition for the customer list.

pub mod aggregates;
pub mod api;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod deadline;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query_builder;
