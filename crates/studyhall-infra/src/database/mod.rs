//! Database connection management and repositories.

mod connections;
pub mod entity;
mod post_repo;
mod postgres_base;
mod postgres_repo;

pub use connections::{DatabaseConfig, DatabaseConnection};
pub use post_repo::PostgresPostRepository;
pub use postgres_base::PostgresBaseRepository;
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCourseRepository, PostgresSemesterRepository,
    PostgresUserRepository,
};

#[cfg(test)]
mod tests;
