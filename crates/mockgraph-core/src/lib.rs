//! Core contracts for mockgraph.
//!
//! This crate defines the record model produced by the generation engine
//! (values, records, tables) and the error type shared by every crate in the
//! workspace.

pub mod error;
pub mod table;
pub mod value;

pub use error::{GenerationError, Result};
pub use table::{Record, Table};
pub use value::Value;
