//! Listing module
//!
//! Server side of the admin data table: column descriptors, the filter
//! string, sorting and pagination. A list endpoint turns its query
//! parameters into a [`ListRequest`] and renders it into SQL with
//! [`ListRequest::push_where`] and [`ListRequest::push_order_and_page`].

pub mod column;
pub mod filter;
pub mod page;
pub mod sort;

pub use column::{ColumnDescriptor, ColumnFilter, ColumnSet, FilterKind, SelectOption, ValueType};
pub use filter::{CompiledFilter, FilterOperator, FilterParam, FilterSet, FilterValue};
pub use page::{clamp_page, page_window, Page, PageLimits, PageRequest};
pub use sort::{Sort, SortOrder};

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

/// Errors raised while interpreting table parameters
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Invalid table parameters: {0}")]
    InvalidQuery(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Column listed twice: {0}")]
    DuplicateColumn(String),

    #[error("Column is not filterable: {0}")]
    NotFilterable(String),

    #[error("Column is not sortable: {0}")]
    NotSortable(String),

    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),

    #[error("Malformed filter clause: {0}")]
    MalformedFilter(String),

    #[error("Operator {operator} is not allowed on {field}")]
    OperatorNotAllowed { field: String, operator: String },

    #[error("Filter on {0} requires a value")]
    MissingValue(String),

    #[error("Invalid value {value:?} for {field}")]
    InvalidValue { field: String, value: String },

    #[error("Page must be at least 1, got {0}")]
    InvalidPage(u32),

    #[error("Page size must be between 1 and {max}, got {requested}")]
    InvalidPageSize { requested: u32, max: u32 },
}

impl ListingError {
    /// Query parameter the error originates from
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ListingError::UnknownColumn(_) | ListingError::DuplicateColumn(_) => Some("columns"),
            ListingError::NotSortable(_) => Some("sort_by"),
            ListingError::NotFilterable(_)
            | ListingError::UnknownOperator(_)
            | ListingError::MalformedFilter(_)
            | ListingError::OperatorNotAllowed { .. }
            | ListingError::MissingValue(_)
            | ListingError::InvalidValue { .. } => Some("filter"),
            ListingError::InvalidPage(_) => Some("page"),
            ListingError::InvalidPageSize { .. } => Some("page_size"),
            ListingError::InvalidQuery(_) => None,
        }
    }
}

/// Raw table parameters as sent by the admin UI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub filter: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Comma separated visible column keys in display order
    pub columns: Option<String>,
}

/// Validated table parameters for one resource
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub filters: Vec<CompiledFilter>,
    pub sort: Option<Sort>,
    pub page: PageRequest,
    pub columns: ColumnSet,
}

impl ListRequest {
    pub fn from_params(
        params: &ListParams,
        mut columns: ColumnSet,
        limits: PageLimits,
    ) -> Result<Self, ListingError> {
        let filters = FilterSet::parse(params.filter.as_deref().unwrap_or_default())?
            .compile(&columns)?;

        let sort = Sort::resolve(params.sort_by.as_deref(), params.sort_order, &columns)?;
        let page = PageRequest::new(params.page, params.page_size, limits)?;

        if let Some(layout) = params.columns.as_deref() {
            let keys: Vec<&str> = layout
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .collect();
            columns.apply_layout(&keys)?;
        }

        Ok(Self {
            filters,
            sort,
            page,
            columns,
        })
    }

    /// Append the filter conditions. `has_where` tells whether the query
    /// already carries a WHERE clause.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>, has_where: bool) {
        let mut has_where = has_where;
        for filter in &self.filters {
            qb.push(if has_where { " AND " } else { " WHERE " });
            filter.push_sql(qb);
            has_where = true;
        }
    }

    /// Append ORDER BY (with `tiebreaker`) followed by LIMIT/OFFSET
    pub fn push_order_and_page(&self, qb: &mut QueryBuilder<'_, Postgres>, tiebreaker: &str) {
        sort::push_order_by(qb, self.sort, tiebreaker);
        qb.push(" LIMIT ")
            .push_bind(self.page.limit())
            .push(" OFFSET ")
            .push_bind(self.page.offset());
    }

    /// Wrap fetched rows with the paging metadata
    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        let total = u64::try_from(total).unwrap_or_default();
        Page::new(items, self.columns.descriptors().to_vec(), self.page, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> ColumnSet {
        ColumnSet::new(vec![
            ColumnDescriptor::new("id", "ID", "r.id")
                .sortable()
                .filter(ColumnFilter::new(FilterKind::Number)),
            ColumnDescriptor::new("name", "Name", "r.name")
                .sortable()
                .filter(ColumnFilter::new(FilterKind::Text)),
            ColumnDescriptor::new("created_at", "Created", "r.created_at")
                .filter(ColumnFilter::new(FilterKind::Date)),
        ])
    }

    fn params() -> ListParams {
        ListParams {
            filter: Some("name contains adm AND id gt 3".to_string()),
            sort_by: Some("name".to_string()),
            sort_order: Some(SortOrder::Desc),
            page: Some(2),
            page_size: Some(5),
            columns: Some("name,id".to_string()),
        }
    }

    #[test]
    fn test_from_params() {
        let request = ListRequest::from_params(&params(), columns(), PageLimits::default()).unwrap();

        assert_eq!(request.filters.len(), 2);
        assert_eq!(request.sort.unwrap().expr, "r.name");
        assert_eq!(request.page.offset(), 5);

        let visible: Vec<_> = request.columns.visible().map(|c| c.key).collect();
        assert_eq!(visible, ["name", "id"]);
    }

    #[test]
    fn test_defaults_from_empty_params() {
        let request =
            ListRequest::from_params(&ListParams::default(), columns(), PageLimits::default())
                .unwrap();

        assert!(request.filters.is_empty());
        assert!(request.sort.is_none());
        assert_eq!(request.page.page, 1);
        assert_eq!(request.columns, columns());
    }

    #[test]
    fn test_sql_rendering() {
        let request = ListRequest::from_params(&params(), columns(), PageLimits::default()).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM roles r WHERE r.tenant_id = ");
        qb.push_bind(1_i64);
        request.push_where(&mut qb, true);
        request.push_order_and_page(&mut qb, "r.id");

        assert_eq!(
            qb.sql(),
            "SELECT * FROM roles r WHERE r.tenant_id = $1 \
             AND r.name ILIKE $2 ESCAPE '\\' AND r.id > $3 \
             ORDER BY r.name DESC, r.id ASC LIMIT $4 OFFSET $5"
        );
    }

    #[test]
    fn test_where_without_existing_clause() {
        let params = ListParams {
            filter: Some("id eq 1".to_string()),
            ..Default::default()
        };
        let request = ListRequest::from_params(&params, columns(), PageLimits::default()).unwrap();
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM roles r");
        request.push_where(&mut qb, false);

        assert_eq!(qb.sql(), "SELECT * FROM roles r WHERE r.id = $1");
    }

    #[test]
    fn test_error_parameter() {
        let bad_page = ListParams {
            page: Some(0),
            ..Default::default()
        };
        let err = ListRequest::from_params(&bad_page, columns(), PageLimits::default()).unwrap_err();
        assert_eq!(err.parameter(), Some("page"));

        let bad_layout = ListParams {
            columns: Some("name,ghost".to_string()),
            ..Default::default()
        };
        let err =
            ListRequest::from_params(&bad_layout, columns(), PageLimits::default()).unwrap_err();
        assert_eq!(err.parameter(), Some("columns"));

        let bad_filter = ListParams {
            filter: Some("created_at on yesterday".to_string()),
            ..Default::default()
        };
        let err =
            ListRequest::from_params(&bad_filter, columns(), PageLimits::default()).unwrap_err();
        assert_eq!(err.parameter(), Some("filter"));
    }

    #[test]
    fn test_into_page() {
        let request = ListRequest::from_params(&params(), columns(), PageLimits::default()).unwrap();
        let page = request.into_page(vec![1, 2], 7);

        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page_window, vec![1, 2]);
        assert_eq!(page.columns[0].key, "name");
    }
}
