use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::DataError;

/// Sort direction of a single [`Order`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// One `(property, direction)` entry of a sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub property: String,
    #[serde(default)]
    pub direction: Direction,
}

impl Order {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Desc,
        }
    }
}

/// Ordered sequence of sort orders; earlier entries take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Map every property onto a column of `E`, using the column's canonical spelling.
    ///
    /// Unknown properties are rejected so they never reach the SQL text.
    pub fn resolve<E: Entity>(&self) -> Result<Sort, DataError> {
        let mut orders = Vec::with_capacity(self.orders.len());
        for order in &self.orders {
            let column = E::resolve_column(&order.property).ok_or_else(|| {
                DataError::invalid_argument(format!("unknown sort property: {}", order.property))
            })?;
            orders.push(Order {
                property: column.to_string(),
                direction: order.direction,
            });
        }
        Ok(Sort { orders })
    }

    /// `self`, or ascending by the id column of `E` when unsorted.
    pub fn or_by_id<E: Entity>(self) -> Sort {
        if self.is_unsorted() {
            Sort::by(vec![Order::asc(E::id_column())])
        } else {
            self
        }
    }
}

/// Pagination parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pageable {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub size: u64,
    #[serde(default)]
    pub sort: Sort,
}

fn default_page_size() -> u64 {
    20
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
            sort: Sort::unsorted(),
        }
    }
}

impl Pageable {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            sort: Sort::unsorted(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.size == 0 {
            return Err(DataError::invalid_argument("page size must be greater than zero"));
        }
        Ok(())
    }
}

/// Pagination plus a free-text query matched against a set of columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPageable {
    pub pageable: Pageable,
    pub search_query: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl SearchPageable {
    pub fn new(pageable: Pageable, search_query: impl Into<String>) -> Self {
        Self {
            pageable,
            search_query: search_query.into(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn add_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Search text is mandatory as soon as a column is targeted.
    pub fn validate(&self) -> Result<(), DataError> {
        self.pageable.validate()?;
        if !self.columns.is_empty() && self.search_query.trim().is_empty() {
            return Err(DataError::invalid_argument(
                "search query must not be blank when search columns are given",
            ));
        }
        Ok(())
    }

    /// Canonical spellings of the targeted columns of `E`.
    pub fn resolve_columns<E: Entity>(&self) -> Result<Vec<&'static str>, DataError> {
        self.columns
            .iter()
            .map(|col| {
                E::resolve_column(col).ok_or_else(|| {
                    DataError::invalid_argument(format!("unknown search column: {col}"))
                })
            })
            .collect()
    }
}

/// A page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    /// Number of matching rows across all pages.
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: &Pageable, total_elements: u64) -> Self {
        let total_pages = if pageable.size == 0 {
            0
        } else {
            total_elements.div_ceil(pageable.size)
        };
        Self {
            content,
            page: pageable.page,
            size: pageable.size,
            total_elements,
            total_pages,
        }
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        self.page.saturating_add(1) >= self.total_pages
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}
