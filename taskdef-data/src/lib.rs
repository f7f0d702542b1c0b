//! # taskdef-data - data layer for task definitions
//!
//! Backend-agnostic building blocks for storing named task definitions in a
//! relational table, scoped per owning principal:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`QueryBuilder`] | Parameterized SELECT / COUNT / DELETE / INSERT rendering, owner and search predicates |
//! | [`Pageable`], [`Sort`], [`SearchPageable`], [`Page`] | Paging requests and results |
//! | [`TaskDefinitionRepository`] | Async repository contract |
//! | [`Identity`], [`Principal`], [`UnauthenticatedAccess`] | Explicit caller identity and anonymous-caller policy |
//! | [`RepositoryConfig`] | Table naming, dialect and policy settings |
//! | [`DataError`] | Error type shared by every backend |
//!
//! The SQLx implementation lives in `taskdef-data-sqlx`.

pub mod config;
pub mod definition;
pub mod entity;
pub mod error;
pub mod identity;
pub mod page;
pub mod query;
pub mod repository;

pub use config::{ConfigError, RepositoryConfig};
pub use definition::TaskDefinition;
pub use entity::Entity;
pub use error::DataError;
pub use identity::{Identity, Principal, UnauthenticatedAccess};
pub use page::{Direction, Order, Page, Pageable, SearchPageable, Sort};
pub use query::{Dialect, IdentifierPolicy, QueryBuilder, QueryError};
pub use repository::TaskDefinitionRepository;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{
        DataError, Entity, Identity, Page, Pageable, Principal, QueryBuilder, RepositoryConfig,
        SearchPageable, Sort, TaskDefinition, TaskDefinitionRepository,
    };
}
