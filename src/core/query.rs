//! Query filters and pagination utilities
//!
//! A LIST request is turned into a list of [`FilterFunc`]s applied, in order,
//! to a backend-neutral [`QueryBuilder`], plus an optional [`PaginationFilter`].
//!
//! ```text
//! GET /books?title=dune&sort=-year&p=2
//!        │              │          └── PaginationConfig ──▶ PaginationFilter { limit, offset }
//!        └──────────────┴── QueryFilterSet ──▶ [exact(title), order(year desc), defaults...]
//! ```

use axum::http::Uri;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;

use crate::config::PaginationSettings;
use crate::core::error::ScaffoldError;

// =============================================================================
// Query builder
// =============================================================================

/// A single condition accumulated by filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field equals value
    Exact { field: String, value: String },
    /// Field contains value
    Like { field: String, value: String },
}

impl Condition {
    /// Check a JSON record against this condition
    ///
    /// Non-string scalars are compared through their JSON text, so
    /// `exact(year, "1965")` matches `{"year": 1965}`.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Condition::Exact { field, value } => {
                field_text(record, field).is_some_and(|text| &text == value)
            }
            Condition::Like { field, value } => {
                field_text(record, field).is_some_and(|text| text.contains(value.as_str()))
            }
        }
    }
}

/// Sort instruction accumulated by filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub descending: bool,
}

/// Backend-neutral query under construction
///
/// Filters push conditions and sort orders; a data access backend then
/// translates the builder into its own query language (or evaluates it
/// directly, as the in-memory backend does).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    pub conditions: Vec<Condition>,
    pub orders: Vec<SortOrder>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from a list of filters, applied in order
    pub fn from_filters(filters: &[FilterFunc]) -> Self {
        let mut builder = Self::new();
        for filter in filters {
            filter(&mut builder);
        }
        builder
    }

    pub fn push(&mut self, condition: Condition) -> &mut Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(&mut self, field: impl Into<String>, descending: bool) -> &mut Self {
        self.orders.push(SortOrder {
            field: field.into(),
            descending,
        });
        self
    }

    /// Check a JSON record against every condition
    pub fn matches(&self, record: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Compare two JSON records following the sort orders
    pub fn compare(&self, a: &Value, b: &Value) -> CmpOrdering {
        for order in &self.orders {
            let ordering = compare_values(
                a.get(&order.field).unwrap_or(&Value::Null),
                b.get(&order.field).unwrap_or(&Value::Null),
            );
            let ordering = if order.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != CmpOrdering::Equal {
                return ordering;
            }
        }
        CmpOrdering::Equal
    }
}

fn field_text(record: &Value, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Null, Value::Null) => CmpOrdering::Equal,
        (Value::Null, _) => CmpOrdering::Less,
        (_, Value::Null) => CmpOrdering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

// =============================================================================
// Filters
// =============================================================================

/// A transformation applied to the query under construction
pub type FilterFunc = Box<dyn Fn(&mut QueryBuilder) + Send + Sync>;

/// Builds a [`FilterFunc`] from (parameter name, request value, static args)
pub type QueryFilterFn = fn(&str, &str, &Value) -> FilterFunc;

/// A filter declared for a URL query parameter
#[derive(Clone)]
pub struct QueryFilter {
    /// Query parameter name
    pub url_param: String,

    /// Filter builder
    pub func: QueryFilterFn,

    /// Static arguments passed to the builder (e.g. allowed sort fields)
    pub args: Value,

    /// Value applied when the parameter is absent from the request
    pub default_value: Option<String>,
}

impl QueryFilter {
    pub fn new(url_param: impl Into<String>, func: QueryFilterFn) -> Self {
        Self {
            url_param: url_param.into(),
            func,
            args: Value::Null,
            default_value: None,
        }
    }

    pub fn with_args(mut self, args: Value) -> Self {
        self.args = args;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Build the filter for a request value
    pub fn build(&self, value: &str) -> FilterFunc {
        (self.func)(&self.url_param, value, &self.args)
    }
}

impl std::fmt::Debug for QueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryFilter")
            .field("url_param", &self.url_param)
            .field("args", &self.args)
            .field("default_value", &self.default_value)
            .finish()
    }
}

/// Ordered set of filters declared by a resource
#[derive(Debug, Clone, Default)]
pub struct QueryFilterSet(pub Vec<QueryFilter>);

impl QueryFilterSet {
    pub fn new(filters: Vec<QueryFilter>) -> Self {
        Self(filters)
    }

    /// Returns the filter declared for a URL parameter
    pub fn get_by_param(&self, param: &str) -> Option<&QueryFilter> {
        self.0.iter().find(|f| f.url_param == param)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryFilter> {
        self.0.iter()
    }
}

/// Compose the filters of a LIST request
///
/// Query pairs are walked in request order; a repeated key only counts once
/// (first value wins) and keys listed in `reserved` (the pagination param)
/// are skipped. A key matching no declared filter fails with
/// [`ScaffoldError::UnknownFilterParam`]. Defaults are then appended, in
/// declaration order, for every filter absent from the request.
pub fn compose_filters(
    set: &QueryFilterSet,
    query: &[(String, String)],
    reserved: &[&str],
) -> Result<Vec<FilterFunc>, ScaffoldError> {
    let mut seen: Vec<&str> = Vec::new();
    let mut composed = Vec::new();

    for (key, value) in query {
        if reserved.contains(&key.as_str()) || seen.contains(&key.as_str()) {
            continue;
        }
        seen.push(key);

        let filter = set
            .get_by_param(key)
            .ok_or_else(|| ScaffoldError::UnknownFilterParam { param: key.clone() })?;
        composed.push(filter.build(value));
    }

    for filter in set.iter() {
        let Some(default) = &filter.default_value else {
            continue;
        };
        if default.is_empty() || seen.contains(&filter.url_param.as_str()) {
            continue;
        }
        composed.push(filter.build(default));
    }

    Ok(composed)
}

/// Reusable filter builders
pub mod filters {
    use super::{Condition, FilterFunc, QueryBuilder};
    use serde_json::Value;

    /// Filter: exact match on the parameter's field
    pub fn exact(param: &str, value: &str, _args: &Value) -> FilterFunc {
        let condition = Condition::Exact {
            field: param.to_string(),
            value: value.to_string(),
        };
        Box::new(move |q: &mut QueryBuilder| {
            q.push(condition.clone());
        })
    }

    /// Filter: substring match on the parameter's field
    pub fn like(param: &str, value: &str, _args: &Value) -> FilterFunc {
        let condition = Condition::Like {
            field: param.to_string(),
            value: value.to_string(),
        };
        Box::new(move |q: &mut QueryBuilder| {
            q.push(condition.clone());
        })
    }

    /// Filter: ordering, `-field` for descending, `field` or `+field` ascending
    ///
    /// `args` must be a JSON array of the fields allowed for sorting; any
    /// other field is ignored.
    pub fn order(_param: &str, value: &str, args: &Value) -> FilterFunc {
        let descending = value.starts_with('-');
        let field = value.replace(['+', '-'], "").trim().to_string();
        let allowed = args
            .as_array()
            .is_some_and(|fields| fields.iter().any(|f| f.as_str() == Some(field.as_str())));

        Box::new(move |q: &mut QueryBuilder| {
            if allowed {
                q.order_by(field.clone(), descending);
            }
        })
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination configuration of a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Query parameter carrying the 1-based page number
    pub query_param_name: String,

    /// Number of items per page
    pub per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            query_param_name: "p".to_string(),
            per_page: 20,
        }
    }
}

impl From<&PaginationSettings> for PaginationConfig {
    fn from(settings: &PaginationSettings) -> Self {
        Self {
            query_param_name: settings.query_param_name.clone(),
            per_page: settings.per_page,
        }
    }
}

/// Offset/limit pair handed to data access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationFilter {
    pub limit: usize,
    pub offset: usize,
}

/// Navigation links of a paginated collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Links {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// Body of a LIST response
#[derive(Debug, Clone, Serialize)]
pub struct CollectionItem {
    pub items: Vec<Value>,
    /// Number of items in this page
    pub count: usize,
    /// Number of items matching the filters
    pub total: usize,
    #[serde(rename = "_links", skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl PaginationConfig {
    /// Page number requested in the query, at least 1
    pub fn page_from_query(&self, query: &[(String, String)]) -> usize {
        query
            .iter()
            .find(|(key, _)| key == &self.query_param_name)
            .map(|(_, value)| page_number(value))
            .unwrap_or(1)
    }

    /// Offset/limit for a page
    pub fn filter_for_page(&self, page: usize) -> PaginationFilter {
        let per_page = self.per_page.max(1);
        PaginationFilter {
            limit: per_page,
            offset: (page.max(1) - 1).saturating_mul(per_page),
        }
    }

    /// Last page for a total count, at least 1
    pub fn last_page(&self, total: usize) -> usize {
        total.div_ceil(self.per_page.max(1)).max(1)
    }

    /// Navigation links, built by rewriting the page param of the request URI
    pub fn links(&self, uri: &Uri, total: usize) -> Links {
        let query = query_pairs(uri);
        let page = self.page_from_query(&query);
        let last = self.last_page(total);

        let link = |page: usize| Some(self.replace_page(uri, &query, page));

        Links {
            first: link(1),
            prev: if page > 1 { link(page - 1) } else { None },
            next: if page < last { link(page + 1) } else { None },
            last: link(last),
        }
    }

    fn replace_page(&self, uri: &Uri, query: &[(String, String)], page: usize) -> String {
        let page = page.to_string();
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut replaced = false;

        for (key, value) in query {
            if key == &self.query_param_name {
                if !replaced {
                    serializer.append_pair(key, &page);
                    replaced = true;
                }
            } else {
                serializer.append_pair(key, value);
            }
        }
        if !replaced {
            serializer.append_pair(&self.query_param_name, &page);
        }

        format!("{}?{}", uri.path(), serializer.finish())
    }
}

/// Decoded query pairs of a URI, in request order
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

fn page_number(raw: &str) -> usize {
    match raw.trim().parse::<i64>() {
        Ok(page) if page >= 1 => usize::try_from(page).unwrap_or(usize::MAX),
        _ => 1,
    }
}
