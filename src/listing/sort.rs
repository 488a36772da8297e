//! Sorting

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use super::column::ColumnSet;
use super::ListingError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Resolved ORDER BY clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub expr: &'static str,
    pub order: SortOrder,
}

impl Sort {
    /// Resolve `sort_by` against the sortable columns
    pub fn resolve(
        sort_by: Option<&str>,
        order: Option<SortOrder>,
        columns: &ColumnSet,
    ) -> Result<Option<Self>, ListingError> {
        let Some(key) = sort_by.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        let column = columns.require(key)?;
        if !column.sortable {
            return Err(ListingError::NotSortable(key.to_string()));
        }

        Ok(Some(Self {
            expr: column.expr,
            order: order.unwrap_or_default(),
        }))
    }
}

/// Append ORDER BY, always ending with `tiebreaker` so pages are stable
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: Option<Sort>, tiebreaker: &str) {
    qb.push(" ORDER BY ");
    match sort {
        Some(sort) if sort.expr != tiebreaker => {
            qb.push(format!(
                "{} {}, {} ASC",
                sort.expr,
                sort.order.as_sql(),
                tiebreaker
            ));
        }
        Some(sort) => {
            qb.push(format!("{} {}", tiebreaker, sort.order.as_sql()));
        }
        None => {
            qb.push(format!("{tiebreaker} ASC"));
        }
    }
}
