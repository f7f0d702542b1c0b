use crate::definition::TaskDefinition;
use crate::error::DataError;
use crate::identity::Identity;
use crate::page::{Page, Pageable, SearchPageable, Sort};
use std::future::Future;

/// Owner-scoped store of [`TaskDefinition`]s.
///
/// Reads are filtered to the definitions owned by `caller`; how an absent
/// caller is treated depends on the configured
/// [`UnauthenticatedAccess`](crate::UnauthenticatedAccess) policy. Names are
/// unique across all owners, so existence checks and deletes are unscoped.
///
/// Uses RPITIT (return-position `impl Trait` in traits); no `async-trait` needed.
pub trait TaskDefinitionRepository: Send + Sync {
    /// Register `definition`, owned by `caller`.
    ///
    /// Fails with [`DataError::DuplicateKey`] when the name is taken, including
    /// when a concurrent save wins the race between the existence check and
    /// the insert.
    fn save(
        &self,
        caller: Option<&dyn Identity>,
        definition: &TaskDefinition,
    ) -> impl Future<Output = Result<TaskDefinition, DataError>> + Send;

    /// Save each definition in order, stopping at the first failure.
    fn save_all(
        &self,
        caller: Option<&dyn Identity>,
        definitions: &[TaskDefinition],
    ) -> impl Future<Output = Result<Vec<TaskDefinition>, DataError>> + Send;

    fn find_by_name(
        &self,
        caller: Option<&dyn Identity>,
        name: &str,
    ) -> impl Future<Output = Result<Option<TaskDefinition>, DataError>> + Send;

    fn exists_by_name(&self, name: &str) -> impl Future<Output = Result<bool, DataError>> + Send;

    fn find_all(
        &self,
        caller: Option<&dyn Identity>,
        pageable: &Pageable,
    ) -> impl Future<Output = Result<Page<TaskDefinition>, DataError>> + Send;

    fn find_all_sorted(
        &self,
        caller: Option<&dyn Identity>,
        sort: &Sort,
    ) -> impl Future<Output = Result<Vec<TaskDefinition>, DataError>> + Send;

    fn find_all_by_names(
        &self,
        caller: Option<&dyn Identity>,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<TaskDefinition>, DataError>> + Send;

    /// Case-insensitive substring search over the requested columns.
    fn search(
        &self,
        caller: Option<&dyn Identity>,
        request: &SearchPageable,
    ) -> impl Future<Output = Result<Page<TaskDefinition>, DataError>> + Send;

    fn count(
        &self,
        caller: Option<&dyn Identity>,
    ) -> impl Future<Output = Result<u64, DataError>> + Send;

    /// Delete by name. A name that was never saved is not an error.
    fn delete(&self, definition: &TaskDefinition) -> impl Future<Output = Result<(), DataError>> + Send;

    /// Returns whether a row was removed.
    fn delete_by_name(&self, name: &str) -> impl Future<Output = Result<bool, DataError>> + Send;

    /// Returns the number of rows removed.
    fn delete_all(&self) -> impl Future<Output = Result<u64, DataError>> + Send;
}

/// Reject blank definition names before touching the store.
pub fn require_name(name: &str) -> Result<(), DataError> {
    if name.trim().is_empty() {
        return Err(DataError::invalid_argument("definition name must not be blank"));
    }
    Ok(())
}
