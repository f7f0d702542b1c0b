use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use taskdef_data::definition::{DEFINITION_COLUMN, NAME_COLUMN, OWNER_COLUMN};
use taskdef_data::repository::require_name;
use taskdef_data::{
    DataError, Entity, Identity, Page, Pageable, QueryBuilder, RepositoryConfig, SearchPageable,
    Sort, TaskDefinition, TaskDefinitionRepository,
};

use crate::error::{SqlxErrorExt, SqlxResult};

/// [`TaskDefinitionRepository`] backed by an `sqlx::AnyPool`.
///
/// The table is expected to exist with a uniqueness constraint on the name
/// column; creating it is left to the application's migrations.
///
/// # Example
///
/// ```ignore
/// sqlx::any::install_default_drivers();
/// let pool = AnyPool::connect("postgres://localhost/dataflow").await?;
/// let config = RepositoryConfig { dialect: Dialect::Postgres, ..Default::default() };
/// let repo = SqlxTaskDefinitionRepository::new(pool, config);
///
/// let alice = Principal::new("alice");
/// repo.save(Some(&alice), &TaskDefinition::new("taskA", "timestamp")).await?;
/// let page = repo.find_all(Some(&alice), &Pageable::new(0, 10)).await?;
/// ```
#[derive(Clone)]
pub struct SqlxTaskDefinitionRepository {
    pool: AnyPool,
    config: RepositoryConfig,
    table: String,
}

impl SqlxTaskDefinitionRepository {
    pub fn new(pool: AnyPool, config: RepositoryConfig) -> Self {
        let table = config.table_name::<TaskDefinition>();
        Self {
            pool,
            config,
            table,
        }
    }

    /// Get the underlying pool reference.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Builder over the table, filtered to what `caller` may read.
    fn scoped(&self, caller: Option<&dyn Identity>) -> SqlxResult<QueryBuilder> {
        let builder = self.config.query::<TaskDefinition>();
        Ok(match self.config.unauthenticated.read_owner(caller)? {
            Some(owner) => builder.where_eq(OWNER_COLUMN, &owner),
            None => builder,
        })
    }

    async fn fetch(&self, builder: &QueryBuilder) -> SqlxResult<Vec<TaskDefinition>> {
        let (sql, params) = builder.build_select(TaskDefinition::columns())?;
        tracing::debug!(table = %self.table, sql = %sql, params = params.len(), "selecting task definitions");
        let rows = bind_all(&sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        rows.iter()
            .map(definition_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(SqlxErrorExt::into_data_error)
    }

    async fn count_matching(&self, builder: &QueryBuilder) -> SqlxResult<u64> {
        let (sql, params) = builder.build_count()?;
        tracing::debug!(table = %self.table, sql = %sql, params = params.len(), "counting task definitions");
        let row = bind_all(&sql, params)
            .fetch_one(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        let count: i64 = row.try_get(0).map_err(SqlxErrorExt::into_data_error)?;
        Ok(count.max(0) as u64)
    }

    async fn execute(&self, sql: &str, params: Vec<String>) -> SqlxResult<u64> {
        tracing::debug!(table = %self.table, sql = %sql, params = params.len(), "executing statement");
        let result = bind_all(sql, params)
            .execute(&self.pool)
            .await
            .map_err(SqlxErrorExt::into_data_error)?;
        Ok(result.rows_affected())
    }

    /// Count every row matching `builder`, then fetch the requested window of them.
    async fn page(
        &self,
        builder: QueryBuilder,
        pageable: &Pageable,
    ) -> SqlxResult<Page<TaskDefinition>> {
        let sort = pageable
            .sort
            .resolve::<TaskDefinition>()?
            .or_by_id::<TaskDefinition>();
        let total = self.count_matching(&builder).await?;
        let content = if pageable.offset() >= total {
            Vec::new()
        } else {
            let window = builder.paginate(&pageable.clone().with_sort(sort));
            self.fetch(&window).await?
        };
        Ok(Page::new(content, pageable, total))
    }
}

impl TaskDefinitionRepository for SqlxTaskDefinitionRepository {
    async fn save(
        &self,
        caller: Option<&dyn Identity>,
        definition: &TaskDefinition,
    ) -> SqlxResult<TaskDefinition> {
        require_name(&definition.name)?;
        let owner = self
            .config
            .unauthenticated
            .write_owner(caller, &self.config.anonymous_owner)?;
        if self.exists_by_name(&definition.name).await? {
            return Err(DataError::duplicate_task(&definition.name));
        }

        let (sql, params) = self.config.query::<TaskDefinition>().build_insert(&[
            (NAME_COLUMN, definition.name.as_str()),
            (DEFINITION_COLUMN, definition.dsl_text.as_str()),
            (OWNER_COLUMN, owner.as_str()),
        ])?;
        match self.execute(&sql, params).await {
            // Lost the race against a concurrent save of the same name.
            Err(err) if err.is_duplicate_key() => {
                return Err(DataError::duplicate_task(&definition.name))
            }
            Err(err) => return Err(err),
            Ok(_) => {}
        }

        tracing::info!(table = %self.table, name = %definition.name, owner = %owner, "registered task definition");
        Ok(definition.clone())
    }

    async fn save_all(
        &self,
        caller: Option<&dyn Identity>,
        definitions: &[TaskDefinition],
    ) -> SqlxResult<Vec<TaskDefinition>> {
        let mut saved = Vec::with_capacity(definitions.len());
        for definition in definitions {
            saved.push(self.save(caller, definition).await?);
        }
        Ok(saved)
    }

    async fn find_by_name(
        &self,
        caller: Option<&dyn Identity>,
        name: &str,
    ) -> SqlxResult<Option<TaskDefinition>> {
        let builder = self.scoped(caller)?.where_eq(NAME_COLUMN, name).limit(1);
        Ok(self.fetch(&builder).await?.into_iter().next())
    }

    async fn exists_by_name(&self, name: &str) -> SqlxResult<bool> {
        let builder = self
            .config
            .query::<TaskDefinition>()
            .where_eq(NAME_COLUMN, name);
        Ok(self.count_matching(&builder).await? > 0)
    }

    async fn find_all(
        &self,
        caller: Option<&dyn Identity>,
        pageable: &Pageable,
    ) -> SqlxResult<Page<TaskDefinition>> {
        pageable.validate()?;
        let builder = self.scoped(caller)?;
        self.page(builder, pageable).await
    }

    async fn find_all_sorted(
        &self,
        caller: Option<&dyn Identity>,
        sort: &Sort,
    ) -> SqlxResult<Vec<TaskDefinition>> {
        let sort = sort.resolve::<TaskDefinition>()?.or_by_id::<TaskDefinition>();
        let builder = self.scoped(caller)?.sort(&sort);
        self.fetch(&builder).await
    }

    async fn find_all_by_names(
        &self,
        caller: Option<&dyn Identity>,
        names: &[String],
    ) -> SqlxResult<Vec<TaskDefinition>> {
        let builder = self.scoped(caller)?;
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let builder = builder
            .where_in(NAME_COLUMN, &names)
            .order_by(NAME_COLUMN, true);
        self.fetch(&builder).await
    }

    async fn search(
        &self,
        caller: Option<&dyn Identity>,
        request: &SearchPageable,
    ) -> SqlxResult<Page<TaskDefinition>> {
        request.validate()?;
        let columns = request.resolve_columns::<TaskDefinition>()?;
        let builder = self
            .scoped(caller)?
            .where_any_like_ignore_case(&columns, &request.search_query);
        self.page(builder, &request.pageable).await
    }

    async fn count(&self, caller: Option<&dyn Identity>) -> SqlxResult<u64> {
        let builder = self.scoped(caller)?;
        self.count_matching(&builder).await
    }

    async fn delete(&self, definition: &TaskDefinition) -> SqlxResult<()> {
        self.delete_by_name(&definition.name).await.map(|_| ())
    }

    async fn delete_by_name(&self, name: &str) -> SqlxResult<bool> {
        let (sql, params) = self
            .config
            .query::<TaskDefinition>()
            .where_eq(NAME_COLUMN, name)
            .build_delete()?;
        let removed = self.execute(&sql, params).await?;
        if removed > 0 {
            tracing::info!(table = %self.table, name = %name, "deleted task definition");
        }
        Ok(removed > 0)
    }

    async fn delete_all(&self) -> SqlxResult<u64> {
        let (sql, params) = self.config.query::<TaskDefinition>().build_delete()?;
        let removed = self.execute(&sql, params).await?;
        tracing::info!(table = %self.table, removed, "deleted all task definitions");
        Ok(removed)
    }
}

fn bind_all(sql: &str, params: Vec<String>) -> Query<'_, Any, AnyArguments<'_>> {
    params
        .into_iter()
        .fold(sqlx::query(sql), |query, param| query.bind(param))
}

/// Columns are read by position: some backends fold unquoted identifiers to lower case.
fn definition_from_row(row: &AnyRow) -> Result<TaskDefinition, sqlx::Error> {
    Ok(TaskDefinition {
        name: row.try_get(0)?,
        dsl_text: row.try_get(1)?,
    })
}
