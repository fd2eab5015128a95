//! Application services (use cases).
//!
//! [`Repository`] wires the criteria translator, the store client and the
//! relation resolver into the entry points a session calls.

pub mod repository;

pub use repository::Repository;
