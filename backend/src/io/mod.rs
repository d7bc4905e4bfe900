//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services. Handles
//! request/response serialization, extracts credentials, and translates
//! domain errors into status codes.

pub mod rest;
