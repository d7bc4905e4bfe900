//! # CSV Storage Module
//!
//! File-based storage for the expense tracker. Each owner gets a directory
//! holding a CSV file of expenses and a YAML salary history; registered users
//! and the global config are YAML files at the root of the data directory.
//!
//! ## File Format
//!
//! ```csv
//! id,owner_id,date,category,description,amount,created_at
//! exp-1788000000000-1a2b3c4d,8f14e45f-...,2026-09-01,Food,Groceries,100,2026-09-01T18:02:11+00:00
//! ```
//!
//! All writes go to a temp file first and are then renamed over the target.

pub mod connection;
pub mod expense_repository;
pub mod global_config_repository;
pub mod salary_repository;
pub mod user_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use expense_repository::ExpenseRepository;
pub use global_config_repository::{GlobalConfig, GlobalConfigRepository, GlobalConfigStorage};
pub use salary_repository::SalaryRepository;
pub use user_repository::UserRepository;
