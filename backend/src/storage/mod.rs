//! # Storage Module
//!
//! Persistence for expenses, salary histories, users and the global config.
//! The domain layer only sees the traits in [`traits`]; the file-backed
//! implementation lives in [`csv`].

pub mod csv;
pub mod traits;

pub use traits::*;
