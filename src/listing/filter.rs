//! Filter parameters
//!
//! The admin table accumulates one `(field, operator, value)` triple per
//! column and sends them as a single `filter` string:
//!
//! ```text
//! name contains jo AND role_id eq 3 AND created_at between 2025-01-01,2025-02-01
//! ```
//!
//! Clauses are split on ` AND `; the first token is the field, the second
//! the operator and the remainder (spaces included) the value. Validation
//! against the resource's [`ColumnSet`] happens in [`FilterSet::compile`].

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use super::column::{ColumnSet, ValueType};
use super::ListingError;

const CLAUSE_SEPARATOR: &str = " AND ";
const LIST_SEPARATOR: char = ',';
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    // text
    Contains,
    StartsWith,
    EndsWith,
    Equals,
    NotEquals,
    Empty,
    NotEmpty,
    // number / select
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    // date
    On,
    Before,
    After,
    // boolean
    IsTrue,
    IsFalse,
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        use FilterOperator::*;
        match self {
            Contains => "contains",
            StartsWith => "startsWith",
            EndsWith => "endsWith",
            Equals => "equals",
            NotEquals => "notEquals",
            Empty => "empty",
            NotEmpty => "notEmpty",
            Eq => "eq",
            Neq => "neq",
            Gt => "gt",
            Gte => "gte",
            Lt => "lt",
            Lte => "lte",
            Between => "between",
            In => "in",
            On => "on",
            Before => "before",
            After => "after",
            IsTrue => "isTrue",
            IsFalse => "isFalse",
            IsNull => "isNull",
            IsNotNull => "isNotNull",
        }
    }

    /// Operators that ignore the value part of the clause
    pub fn is_unary(self) -> bool {
        use FilterOperator::*;
        matches!(
            self,
            Empty | NotEmpty | IsTrue | IsFalse | IsNull | IsNotNull
        )
    }

    const ALL: [FilterOperator; 22] = {
        use FilterOperator::*;
        [
            Contains, StartsWith, EndsWith, Equals, NotEquals, Empty, NotEmpty, Eq, Neq, Gt,
            Gte, Lt, Lte, Between, In, On, Before, After, IsTrue, IsFalse, IsNull, IsNotNull,
        ]
    };
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ListingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ListingError::UnknownOperator(s.to_string()))
    }
}

/// One `(field, operator, value)` triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParam {
    pub field: String,
    pub operator: FilterOperator,
    pub value: Option<String>,
}

impl FilterParam {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Option<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: if operator.is_unary() { None } else { value },
        }
    }

    fn parse(clause: &str) -> Result<Self, ListingError> {
        let clause = clause.trim();
        let mut parts = clause.splitn(3, ' ');

        let field = parts
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ListingError::MalformedFilter(clause.to_string()))?;
        let operator: FilterOperator = parts
            .next()
            .ok_or_else(|| ListingError::MalformedFilter(clause.to_string()))?
            .parse()?;
        let value = parts
            .next()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(Self::new(field, operator, value))
    }
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {}", self.field, self.operator, value),
            None => write!(f, "{} {}", self.field, self.operator),
        }
    }
}

/// Filter parameters keyed by field, one per column
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    params: Vec<FilterParam>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `filter` query string. A blank string is an empty set.
    pub fn parse(raw: &str) -> Result<Self, ListingError> {
        let mut set = Self::new();
        if raw.trim().is_empty() {
            return Ok(set);
        }
        for clause in raw.split(CLAUSE_SEPARATOR) {
            set.set(FilterParam::parse(clause)?);
        }
        Ok(set)
    }

    /// Add a filter, replacing any earlier one on the same field
    pub fn set(&mut self, param: FilterParam) {
        match self.params.iter_mut().find(|p| p.field == param.field) {
            Some(existing) => *existing = param,
            None => self.params.push(param),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<FilterParam> {
        let index = self.params.iter().position(|p| p.field == field)?;
        Some(self.params.remove(index))
    }

    pub fn params(&self) -> &[FilterParam] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Serialize back into the `filter` query string form
    pub fn to_query_string(&self) -> String {
        self.params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(CLAUSE_SEPARATOR)
    }

    /// Check every parameter against `columns` and parse its value
    pub fn compile(&self, columns: &ColumnSet) -> Result<Vec<CompiledFilter>, ListingError> {
        self.params
            .iter()
            .map(|param| CompiledFilter::compile(param, columns))
            .collect()
    }
}

/// Typed filter value ready to be bound
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    None,
    Text(String),
    Integer(i64),
    IntegerRange(i64, i64),
    IntegerList(Vec<i64>),
    Date(NaiveDate),
    DateRange(NaiveDate, NaiveDate),
}

/// A validated filter bound to a column's SQL expression
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub expr: &'static str,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl CompiledFilter {
    fn compile(param: &FilterParam, columns: &ColumnSet) -> Result<Self, ListingError> {
        let column = columns.require(&param.field)?;
        let filter = column
            .filter
            .as_ref()
            .ok_or_else(|| ListingError::NotFilterable(param.field.clone()))?;

        if !filter.allows(param.operator) {
            return Err(ListingError::OperatorNotAllowed {
                field: param.field.clone(),
                operator: param.operator.to_string(),
            });
        }

        let value = if param.operator.is_unary() {
            FilterValue::None
        } else {
            let raw = param
                .value
                .as_deref()
                .ok_or_else(|| ListingError::MissingValue(param.field.clone()))?;
            parse_value(&param.field, param.operator, filter.value_type, raw)?
        };

        Ok(Self {
            expr: column.expr,
            operator: param.operator,
            value,
        })
    }

    /// Append this condition to `qb`
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        use FilterOperator::*;
        let expr = self.expr;

        match (&self.value, self.operator) {
            (FilterValue::Text(v), Contains) => {
                qb.push(format!("{expr} ILIKE "))
                    .push_bind(format!("%{}%", escape_like(v)))
                    .push(" ESCAPE '\\'");
            }
            (FilterValue::Text(v), StartsWith) => {
                qb.push(format!("{expr} ILIKE "))
                    .push_bind(format!("{}%", escape_like(v)))
                    .push(" ESCAPE '\\'");
            }
            (FilterValue::Text(v), EndsWith) => {
                qb.push(format!("{expr} ILIKE "))
                    .push_bind(format!("%{}", escape_like(v)))
                    .push(" ESCAPE '\\'");
            }
            (FilterValue::Text(v), Equals) => {
                qb.push(format!("LOWER({expr}) = LOWER("))
                    .push_bind(v.clone())
                    .push(")");
            }
            (FilterValue::Text(v), NotEquals) => {
                qb.push(format!("LOWER({expr}) <> LOWER("))
                    .push_bind(v.clone())
                    .push(")");
            }
            (FilterValue::Text(v), Eq) => {
                qb.push(format!("{expr} = ")).push_bind(v.clone());
            }
            (FilterValue::Text(v), Neq) => {
                qb.push(format!("{expr} <> ")).push_bind(v.clone());
            }
            (_, Empty) => {
                qb.push(format!("({expr} IS NULL OR {expr} = '')"));
            }
            (_, NotEmpty) => {
                qb.push(format!("({expr} IS NOT NULL AND {expr} <> '')"));
            }
            (_, IsTrue) => {
                qb.push(format!("{expr} IS TRUE"));
            }
            (_, IsFalse) => {
                qb.push(format!("{expr} IS FALSE"));
            }
            (_, IsNull) => {
                qb.push(format!("{expr} IS NULL"));
            }
            (_, IsNotNull) => {
                qb.push(format!("{expr} IS NOT NULL"));
            }
            (FilterValue::Integer(v), op) => {
                qb.push(format!("{expr} {} ", comparison(op))).push_bind(*v);
            }
            (FilterValue::IntegerRange(lo, hi), _) => {
                qb.push(format!("{expr} BETWEEN "))
                    .push_bind(*lo)
                    .push(" AND ")
                    .push_bind(*hi);
            }
            (FilterValue::IntegerList(values), _) => {
                qb.push(format!("{expr} = ANY("))
                    .push_bind(values.clone())
                    .push(")");
            }
            (FilterValue::Date(d), op) => {
                let cmp = match op {
                    Before => "<",
                    After => ">",
                    _ => "=",
                };
                qb.push(format!("({expr})::date {cmp} ")).push_bind(*d);
            }
            (FilterValue::DateRange(from, to), _) => {
                qb.push(format!("({expr})::date BETWEEN "))
                    .push_bind(*from)
                    .push(" AND ")
                    .push_bind(*to);
            }
            // compile() never pairs a text value with a numeric operator
            (FilterValue::Text(_), _) | (FilterValue::None, _) => {
                qb.push("TRUE");
            }
        }
    }
}

fn comparison(op: FilterOperator) -> &'static str {
    match op {
        FilterOperator::Neq => "<>",
        FilterOperator::Gt => ">",
        FilterOperator::Gte => ">=",
        FilterOperator::Lt => "<",
        FilterOperator::Lte => "<=",
        _ => "=",
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_value(
    field: &str,
    operator: FilterOperator,
    value_type: ValueType,
    raw: &str,
) -> Result<FilterValue, ListingError> {
    let invalid = || ListingError::InvalidValue {
        field: field.to_string(),
        value: raw.to_string(),
    };

    let integer = |s: &str| s.trim().parse::<i64>().map_err(|_| invalid());
    let date = |s: &str| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| invalid());
    let pair = |s: &str| -> Result<(String, String), ListingError> {
        let (a, b) = s.split_once(LIST_SEPARATOR).ok_or_else(invalid)?;
        Ok((a.to_string(), b.to_string()))
    };

    let value = match (value_type, operator) {
        (ValueType::Integer, FilterOperator::Between) => {
            let (a, b) = pair(raw)?;
            let (lo, hi) = (integer(&a)?, integer(&b)?);
            if lo > hi {
                return Err(invalid());
            }
            FilterValue::IntegerRange(lo, hi)
        }
        (ValueType::Integer, FilterOperator::In) => {
            let values = raw
                .split(LIST_SEPARATOR)
                .map(integer)
                .collect::<Result<Vec<_>, _>>()?;
            FilterValue::IntegerList(values)
        }
        (ValueType::Integer, _) => FilterValue::Integer(integer(raw)?),
        (ValueType::Date, FilterOperator::Between) => {
            let (a, b) = pair(raw)?;
            let (from, to) = (date(&a)?, date(&b)?);
            if from > to {
                return Err(invalid());
            }
            FilterValue::DateRange(from, to)
        }
        (ValueType::Date, _) => FilterValue::Date(date(raw)?),
        (ValueType::Text, _) | (ValueType::Boolean, _) => FilterValue::Text(raw.to_string()),
    };

    Ok(value)
}
