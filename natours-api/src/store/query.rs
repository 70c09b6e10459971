//! Query descriptor types for document store reads
//!
//! This module provides the typed building blocks of a list query: filter
//! conditions, sort keys, field projection, and pagination. A [`ListQuery`]
//! bundles all four and is executed exactly once by a store.
//!
//! # Example
//!
//! ```rust
//! use natours_api::store::query::{FilterCondition, ListQuery, Pagination, SortKey};
//!
//! let query = ListQuery {
//!     filter: vec![FilterCondition::gte("price", 100_i64)],
//!     sort: vec![SortKey::desc("price"), SortKey::asc("name")],
//!     pagination: Some(Pagination::page(3, 10)),
//!     ..ListQuery::default()
//! };
//!
//! assert_eq!(query.pagination.unwrap().skip, 20);
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::{Document, ID_FIELD, REVISION_FIELD};

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// A single ordering directive: field name plus direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// The field name to order by
    pub field: String,
    /// The direction to order in
    pub order: SortOrder,
}

impl SortKey {
    /// Create an ascending sort key
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Create a descending sort key
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
}

impl FilterOperator {
    /// Parse a comparison token as it appears in a query string
    /// (`gte`, `gt`, `lte`, `lt`). Unknown tokens yield `None`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(Self::GreaterThan),
            "gte" => Some(Self::GreaterThanOrEqual),
            "lt" => Some(Self::LessThan),
            "lte" => Some(Self::LessThanOrEqual),
            _ => None,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
        }
    }
}

/// A typed value to compare document fields against
///
/// Query-string parameters arrive as strings; [`FilterValue::coerce`] turns
/// them into the most specific type so that `duration=5` matches a numeric
/// document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
}

impl FilterValue {
    /// Coerce a raw query-string value into a typed filter value
    ///
    /// Tries integer, then float, then boolean, and falls back to string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use natours_api::store::query::FilterValue;
    ///
    /// assert_eq!(FilterValue::coerce("100"), FilterValue::Integer(100));
    /// assert_eq!(FilterValue::coerce("4.5"), FilterValue::Float(4.5));
    /// assert_eq!(FilterValue::coerce("true"), FilterValue::Boolean(true));
    /// assert_eq!(FilterValue::coerce("easy"), FilterValue::String("easy".to_string()));
    /// ```
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Integer(n);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Self::Float(f);
        }
        match raw {
            "true" => Self::Boolean(true),
            "false" => Self::Boolean(false),
            _ => Self::String(raw.to_string()),
        }
    }

    /// Compare a document field value against this filter value
    ///
    /// Returns `None` when the two are not comparable (e.g. a string field
    /// against a numeric bound), which makes the enclosing condition fail.
    fn partial_cmp_value(&self, candidate: &Value) -> Option<Ordering> {
        match (candidate, self) {
            (Value::Number(n), Self::Integer(rhs)) => {
                n.as_f64().and_then(|lhs| lhs.partial_cmp(&(*rhs as f64)))
            }
            (Value::Number(n), Self::Float(rhs)) => {
                n.as_f64().and_then(|lhs| lhs.partial_cmp(rhs))
            }
            (Value::String(s), Self::String(rhs)) => Some(s.as_str().cmp(rhs.as_str())),
            (Value::Bool(b), Self::Boolean(rhs)) => Some(b.cmp(rhs)),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// A single filter condition applied to a document field
///
/// # Example
///
/// ```rust
/// use natours_api::store::query::FilterCondition;
///
/// let by_difficulty = FilterCondition::eq("difficulty", "easy");
/// let affordable = FilterCondition::lte("price", 500_i64);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The field name to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Create an equality filter (field = value)
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    /// Create a greater-than filter (field > value)
    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value)
    }

    /// Create a greater-than-or-equal filter (field >= value)
    pub fn gte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value)
    }

    /// Create a less-than filter (field < value)
    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThan, value)
    }

    /// Create a less-than-or-equal filter (field <= value)
    pub fn lte(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value)
    }

    /// Evaluate this condition against a document
    ///
    /// A missing or incomparable field fails the condition.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(candidate) = doc.get(&self.field) else {
            return false;
        };
        let Some(ordering) = self.value.partial_cmp_value(candidate) else {
            return false;
        };
        match self.operator {
            FilterOperator::Equal => ordering == Ordering::Equal,
            FilterOperator::GreaterThan => ordering == Ordering::Greater,
            FilterOperator::GreaterThanOrEqual => ordering != Ordering::Less,
            FilterOperator::LessThan => ordering == Ordering::Less,
            FilterOperator::LessThanOrEqual => ordering != Ordering::Greater,
        }
    }
}

/// Field projection applied to every document a list query returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Return only the named fields, plus the identifier
    Include(Vec<String>),
    /// Return every field except the named ones
    Exclude(Vec<String>),
}

impl Default for Projection {
    /// The default projection excludes only the internal revision field
    fn default() -> Self {
        Self::Exclude(vec![REVISION_FIELD.to_string()])
    }
}

impl Projection {
    /// Apply the projection to a document, producing the shaped copy
    #[must_use]
    pub fn apply(&self, doc: &Document) -> Document {
        match self {
            Self::Include(fields) => {
                let mut shaped = Document::new();
                if let Some(id) = doc.get(ID_FIELD) {
                    shaped.insert(ID_FIELD.to_string(), id.clone());
                }
                for field in fields {
                    if field == ID_FIELD {
                        continue;
                    }
                    if let Some(value) = doc.get(field) {
                        shaped.insert(field.clone(), value.clone());
                    }
                }
                shaped
            }
            Self::Exclude(fields) => {
                let mut shaped = doc.clone();
                for field in fields {
                    shaped.remove(field);
                }
                shaped
            }
        }
    }
}

/// Pagination window: how many documents to skip and how many to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of documents to skip
    pub skip: u64,
    /// Maximum number of documents to return
    pub limit: u64,
}

impl Pagination {
    /// Create pagination parameters from a raw skip and limit
    #[must_use]
    pub const fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }

    /// Create pagination for a 1-indexed page number
    ///
    /// # Example
    ///
    /// ```rust
    /// use natours_api::store::query::Pagination;
    ///
    /// let page3 = Pagination::page(3, 10);
    /// assert_eq!(page3.skip, 20);
    /// assert_eq!(page3.limit, 10);
    /// ```
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        Self {
            skip: page_number.saturating_sub(1) * page_size,
            limit: page_size,
        }
    }
}

/// A fully staged list query: filter, sort, projection, pagination
///
/// Built per request, executed once against a store, then discarded. The
/// default value matches every document in a collection, in store order,
/// with the default projection and no pagination window.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Conditions a document must satisfy (conjunction)
    pub filter: Vec<FilterCondition>,
    /// Ordering directives, most significant first
    pub sort: Vec<SortKey>,
    /// Field projection applied to each returned document
    pub projection: Projection,
    /// Optional pagination window
    pub pagination: Option<Pagination>,
}

impl ListQuery {
    /// Check whether a document satisfies every filter condition
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.filter.iter().all(|condition| condition.matches(doc))
    }

    /// Compare two documents according to the sort keys
    ///
    /// Documents that tie on every key compare equal; the caller's sort must
    /// be stable for deterministic pagination.
    #[must_use]
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.sort {
            let ordering = compare_field_values(a.get(&key.field), b.get(&key.field));
            let ordering = match key.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order over optional JSON values for sorting
///
/// Absent and null fields sort before everything else; mixed types order by
/// rank (bool, number, string) so the comparison is total.
fn compare_field_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
