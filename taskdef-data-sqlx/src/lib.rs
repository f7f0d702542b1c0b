//! # taskdef-data-sqlx - SQLx backend for task definitions
//!
//! This crate provides the [SQLx](https://github.com/launchbadge/sqlx)-specific
//! implementation of the `taskdef-data` repository contract. It talks to the
//! database through `sqlx::AnyPool`, so one build can target any driver
//! enabled through the feature flags below.
//!
//! # What's in this crate
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SqlxTaskDefinitionRepository`] | Owner-scoped task definition repository over an `AnyPool` |
//! | [`SqlxErrorExt`] | Extension trait to convert `sqlx::Error` → `DataError` (`.into_data_error()`) |
//! | [`SqlxResult<T>`] | Type alias for `Result<T, DataError>` |
//!
//! # Feature flags
//!
//! Enable the drivers you need:
//!
//! | Feature    | Driver |
//! |------------|--------|
//! | `sqlite`   | SQLite via `sqlx/sqlite` |
//! | `postgres` | PostgreSQL via `sqlx/postgres` |
//! | `mysql`    | MySQL via `sqlx/mysql` |
//!
//! Set [`RepositoryConfig::dialect`](taskdef_data::RepositoryConfig) to match
//! the driver behind the pool; it decides the placeholder style.
//!
//! # Quick start
//!
//! ```ignore
//! use sqlx::any::AnyPoolOptions;
//! use taskdef_data_sqlx::prelude::*;
//!
//! sqlx::any::install_default_drivers();
//! let pool = AnyPoolOptions::new().connect("sqlite://dataflow.db").await?;
//! let repo = SqlxTaskDefinitionRepository::new(pool, RepositoryConfig::default());
//!
//! let alice = Principal::new("alice");
//! repo.save(Some(&alice), &TaskDefinition::new("taskA", "timestamp --format=x")).await?;
//!
//! let request = SearchPageable::new(Pageable::new(0, 10), "task").add_column("DEFINITION_NAME");
//! let page = repo.search(Some(&alice), &request).await?;
//! assert_eq!(page.total_elements, 1);
//! ```
//!
//! # Error bridging
//!
//! Storage-level unique violations surface as `DataError::DuplicateKey`; every
//! other driver failure is wrapped unchanged in `DataError::Database`.

pub mod error;
pub mod repository;

pub use error::{SqlxErrorExt, SqlxResult};
pub use repository::SqlxTaskDefinitionRepository;

/// Re-exports of the most commonly used types from both `taskdef-data` and this crate.
pub mod prelude {
    pub use crate::{SqlxErrorExt, SqlxTaskDefinitionRepository};
    pub use taskdef_data::prelude::*;
}
