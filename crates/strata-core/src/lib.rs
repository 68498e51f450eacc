//! Strata Core - Core types and serialization
//!
//! This crate provides the foundational types and utilities for the Strata
//! contract-execution engine.

pub mod error;
pub mod serialize;
pub mod types;

pub use error::CoreError;
pub use types::*;
