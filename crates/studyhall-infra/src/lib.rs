//! # Studyhall Infrastructure
//!
//! Concrete implementations of the ports defined in `studyhall-core`:
//! PostgreSQL repositories via SeaORM, JWT and Argon2 auth services, the
//! in-memory background job queue, and SMTP/in-memory mail transports.

pub mod auth;
pub mod database;
pub mod jobs;
pub mod mail;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use database::{DatabaseConfig, DatabaseConnection};
pub use jobs::InMemoryJobQueue;
pub use mail::{InMemoryMailer, SmtpConfig, SmtpMailer};
