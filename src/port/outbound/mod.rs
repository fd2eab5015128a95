//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the store driver, the connection opener and the
//! schema registry this crate consumes but does not own.

pub mod connector;
pub mod registry;
pub mod store;
