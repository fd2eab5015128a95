//! Infrastructure configuration modules.

pub mod logging;
pub mod resolver;
pub mod settings;
pub mod store;
