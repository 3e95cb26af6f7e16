//! # Studyhall Core
//!
//! The domain layer of the Studyhall backend.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod query;
pub mod sanitize;

pub use error::DomainError;
