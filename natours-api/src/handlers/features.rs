//! Query-feature pipeline for list operations
//!
//! Translates the flat query-string mapping of a list request into a staged
//! [`ListQuery`]: filter → sort → field projection → pagination. Each stage
//! consumes the builder and returns it, so stages chain freely, compose in
//! any order, and are individually idempotent; the canonical order is
//! `filter().sort().limit_fields().paginate()`.
//!
//! The reserved parameters `page`, `sort`, `limit`, and `fields` are consumed
//! by their stages and never reach the filter stage. Every other parameter
//! becomes a typed filter condition: `price[gte]=100` a range bound,
//! `difficulty=easy` an equality match.
//!
//! The pipeline performs no I/O and raises no errors; malformed numeric
//! values fall back to their defaults.
//!
//! # Example
//!
//! ```rust
//! use natours_api::handlers::features::{QueryFeatures, QueryParams};
//!
//! let params = QueryParams::from(vec![
//!     ("price[gte]".to_string(), "100".to_string()),
//!     ("sort".to_string(), "-price,name".to_string()),
//!     ("page".to_string(), "2".to_string()),
//! ]);
//!
//! let query = QueryFeatures::new(params)
//!     .filter()
//!     .sort()
//!     .limit_fields()
//!     .paginate()
//!     .into_query();
//!
//! assert_eq!(query.filter.len(), 1);
//! assert_eq!(query.pagination.unwrap().skip, 100);
//! ```

use crate::store::query::{
    FilterCondition, FilterOperator, FilterValue, ListQuery, Pagination, Projection, SortKey,
};
use crate::store::{CREATED_AT_FIELD, ID_FIELD};

/// Query-string keys consumed by pipeline stages rather than the filter
pub const RESERVED_PARAMS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Number of documents a page holds when no `limit` is given
pub const DEFAULT_LIMIT: u64 = 100;

/// Hard ceiling on the page size a caller may request
pub const MAX_LIMIT: u64 = 500;

/// The flat query-string mapping of a list request
///
/// Keeps every `key=value` pair in arrival order; repeated keys all
/// contribute filter conditions, while the reserved stage parameters read
/// their first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Create an empty parameter mapping
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First value recorded for a key, if any
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite every occurrence of a key with a single value
    ///
    /// Used by route aliases that preset parts of the envelope (the
    /// top-5-cheap tours listing) before the pipeline runs.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.into()));
    }

    /// Iterate over all pairs in arrival order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

/// Staged builder from a request envelope to a [`ListQuery`]
///
/// Allocated per request, executed once, discarded. Stages that were never
/// invoked contribute nothing to the final query; an invoked stage whose
/// parameter is absent applies its documented default.
#[derive(Debug, Clone)]
pub struct QueryFeatures {
    params: QueryParams,
    scope: Vec<FilterCondition>,
    filter: Option<Vec<FilterCondition>>,
    sort: Option<Vec<SortKey>>,
    projection: Option<Projection>,
    pagination: Option<Pagination>,
}

impl QueryFeatures {
    /// Start a pipeline over a request envelope
    #[must_use]
    pub fn new(params: QueryParams) -> Self {
        Self::scoped(params, Vec::new())
    }

    /// Start a pipeline pre-scoped by ancestor-resource conditions
    ///
    /// The scope conditions (e.g. reviews restricted to one tour) always
    /// apply, regardless of which stages run or what the envelope holds.
    #[must_use]
    pub fn scoped(params: QueryParams, scope: Vec<FilterCondition>) -> Self {
        Self {
            params,
            scope,
            filter: None,
            sort: None,
            projection: None,
            pagination: None,
        }
    }

    /// Filter stage: non-reserved parameters become typed conditions
    ///
    /// `field[op]=value` with `op` in `gte`/`gt`/`lte`/`lt` becomes a range
    /// bound; an unknown bracketed operator drops the pair; everything else
    /// is an equality match. An envelope holding only reserved keys yields a
    /// match-all filter.
    #[must_use]
    pub fn filter(mut self) -> Self {
        let mut conditions = Vec::new();
        for (key, value) in self.params.pairs() {
            if RESERVED_PARAMS.contains(&key) {
                continue;
            }
            match parse_filter_key(key) {
                FilterKey::Plain(field) => {
                    conditions.push(FilterCondition::eq(field, FilterValue::coerce(value)));
                }
                FilterKey::Comparison(field, operator) => {
                    conditions.push(FilterCondition::new(
                        field,
                        operator,
                        FilterValue::coerce(value),
                    ));
                }
                FilterKey::Unknown => {}
            }
        }
        self.filter = Some(conditions);
        self
    }

    /// Sort stage: comma-separated field list, `-` prefix for descending
    ///
    /// Without a `sort` parameter the result is ordered by creation time
    /// descending and identifier ascending, so pagination stays
    /// deterministic even when sort fields are not unique.
    #[must_use]
    pub fn sort(mut self) -> Self {
        let keys = match self.params.get("sort") {
            Some(raw) => {
                let keys = parse_sort(raw);
                if keys.is_empty() {
                    default_sort()
                } else {
                    keys
                }
            }
            None => default_sort(),
        };
        self.sort = Some(keys);
        self
    }

    /// Projection stage: comma-separated `fields` inclusion list
    ///
    /// Without a `fields` parameter the default projection applies
    /// (everything except the internal revision field).
    #[must_use]
    pub fn limit_fields(mut self) -> Self {
        let projection = match self.params.get("fields") {
            Some(raw) => {
                let fields: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect();
                if fields.is_empty() {
                    Projection::default()
                } else {
                    Projection::Include(fields)
                }
            }
            None => Projection::default(),
        };
        self.projection = Some(projection);
        self
    }

    /// Pagination stage: `page` (default 1) and `limit` (default 100)
    ///
    /// skip = (page - 1) × limit. Non-numeric or non-positive values fall
    /// back to their defaults; `limit` is capped at [`MAX_LIMIT`]. A page
    /// past the end of the result set yields an empty page, never an error.
    #[must_use]
    pub fn paginate(mut self) -> Self {
        let page = parse_positive(self.params.get("page")).unwrap_or(1);
        let limit = parse_positive(self.params.get("limit"))
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        self.pagination = Some(Pagination::page(page, limit));
        self
    }

    /// Produce the final query descriptor
    #[must_use]
    pub fn into_query(self) -> ListQuery {
        let mut filter = self.scope;
        filter.extend(self.filter.unwrap_or_default());
        ListQuery {
            filter,
            sort: self.sort.unwrap_or_default(),
            projection: self.projection.unwrap_or_default(),
            pagination: self.pagination,
        }
    }
}

/// Stable default ordering: newest first, identifier as tie-breaker
fn default_sort() -> Vec<SortKey> {
    vec![SortKey::desc(CREATED_AT_FIELD), SortKey::asc(ID_FIELD)]
}

enum FilterKey<'a> {
    Plain(&'a str),
    Comparison(&'a str, FilterOperator),
    Unknown,
}

/// Split `field[op]` keys into their parts
fn parse_filter_key(key: &str) -> FilterKey<'_> {
    let Some((field, rest)) = key.split_once('[') else {
        return FilterKey::Plain(key);
    };
    let Some(token) = rest.strip_suffix(']') else {
        return FilterKey::Unknown;
    };
    match FilterOperator::from_token(token) {
        Some(operator) if !field.is_empty() => FilterKey::Comparison(field, operator),
        _ => FilterKey::Unknown,
    }
}

fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "-")
        .map(|part| match part.strip_prefix('-') {
            Some(field) => SortKey::desc(field),
            None => SortKey::asc(part),
        })
        .collect()
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
}
