//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`store`] - In-memory [`StoreClient`](crate::port::StoreClient) with call
//!   recording, failure injection and latency.
//! - [`connector`] - Scripted [`StoreConnector`](crate::port::StoreConnector)
//!   that counts opens.
//! - [`fixtures`] - Entity metadata and seeded data for an order schema.
//! - [`config`] - Canonical test configurations.

pub mod config;
pub mod connector;
pub mod fixtures;
pub mod store;
