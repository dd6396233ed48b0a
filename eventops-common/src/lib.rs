//! Shared library for the event-operations service
//!
//! Holds the pieces every crate in the workspace needs: the common error
//! type, the clock abstraction used by time-sensitive business rules, and
//! the database layer (schema initialization plus row models).

pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
