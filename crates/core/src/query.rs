//! Query composition
//!
//! Translates a small typed constraint language into the engine's native
//! query document. All constraints are AND-ed inside a single boolean
//! `must` group:
//!
//! | Constraint | Native clause |
//! |------------|---------------|
//! | `Equality(f, v)` | `{"term": {f: v}}` |
//! | `Batch(f, [v..])` | `{"terms": {f: [v..]}}` |
//! | `Range(f, lo, hi)` | `{"range": {f: {"gte": lo, "lte": hi}}}` |
//! | `Regex(f, p)` | `{"regexp": {f: p}}` |
//!
//! # Example
//!
//! ```
//! use esmeta_core::{QueryBuilder, SortOrder};
//!
//! let doc = QueryBuilder::new()
//!     .equal("host_id", 5)
//!     .between("time_recorded", 100, 200)
//!     .sort("time_recorded", SortOrder::Desc)
//!     .size(20)
//!     .compose()
//!     .unwrap();
//! assert_eq!(doc.must_clauses().len(), 2);
//! ```

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

/// Default result size for a query.
///
/// Leaving the size unset also means "return everything": the fetcher
/// falls back to scrolling when the first page comes back short.
pub const DEFAULT_RESULT_SIZE: usize = 10_000;

/// Batch size used when scrolling through query results.
pub const DEFAULT_SCROLL_SIZE: usize = 50_000;

// ============================================================================
// Constraints
// ============================================================================

/// A single query constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Field equals value
    Equality(String, Value),
    /// Field within `[low, high]`; an absent bound is unbounded on that side
    Range(String, Option<Value>, Option<Value>),
    /// Field matches a regular expression
    Regex(String, String),
    /// Field equals one of the values
    Batch(String, Vec<Value>),
}

impl Constraint {
    /// Name of the constrained field.
    pub fn field(&self) -> &str {
        match self {
            Constraint::Equality(f, _)
            | Constraint::Range(f, _, _)
            | Constraint::Regex(f, _)
            | Constraint::Batch(f, _) => f,
        }
    }

    /// A constraint that contributes no clause.
    ///
    /// Ranges with both bounds absent and constraints on an empty field
    /// name are dropped rather than rejected.
    pub fn is_trivial(&self) -> bool {
        self.field().is_empty() || matches!(self, Constraint::Range(_, None, None))
    }

    /// Render the native clause, or `None` for a trivial constraint.
    pub fn to_clause(&self) -> Option<Value> {
        if self.is_trivial() {
            return None;
        }
        let clause = match self {
            Constraint::Equality(f, v) => json!({ "term": { f.as_str(): v } }),
            Constraint::Batch(f, values) => json!({ "terms": { f.as_str(): values } }),
            Constraint::Regex(f, pattern) => json!({ "regexp": { f.as_str(): pattern } }),
            Constraint::Range(f, low, high) => {
                let mut bounds = Map::new();
                if let Some(low) = low {
                    bounds.insert("gte".to_string(), low.clone());
                }
                if let Some(high) = high {
                    bounds.insert("lte".to_string(), high.clone());
                }
                json!({ "range": { f.as_str(): bounds } })
            }
        };
        Some(clause)
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortOrder {
    /// Wire name of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One sort key; a query holds an ordered list of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Field to sort on
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

impl SortSpec {
    /// Create a sort key.
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Render as `{field: "asc"|"desc"}`.
    pub fn to_json(&self) -> Value {
        json!({ self.field.as_str(): self.order.as_str() })
    }
}

// ============================================================================
// QueryDocument
// ============================================================================

/// A composed query, ready to be executed.
///
/// Build one with [`QueryBuilder`]. The native request body is produced by
/// [`QueryDocument::to_json`]; `Serialize` yields the same shape.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
    /// Fields to return; `None` returns the full stored record
    pub fields: Option<Vec<String>>,
    /// Non-trivial constraints in clause order
    pub constraints: Vec<Constraint>,
    /// Maximum number of hits in the first page
    pub size: usize,
    /// Sort keys, primary first
    pub sort: Option<Vec<SortSpec>>,
    /// Drain every match (via scroll) when the first page is short
    pub fetch_all: bool,
}

impl QueryDocument {
    /// The clauses of the boolean `must` group.
    pub fn must_clauses(&self) -> Vec<Value> {
        self.constraints
            .iter()
            .filter_map(Constraint::to_clause)
            .collect()
    }

    /// Native request body.
    pub fn to_json(&self) -> Value {
        self.render(Some(self.size), true)
    }

    /// Body used to re-confirm the total match count: a single-hit page.
    pub fn count_body(&self) -> Value {
        self.render(Some(1), true)
    }

    /// Body for scroll retrieval: no `size`, no `sort`.
    pub fn scan_body(&self) -> Value {
        self.render(None, false)
    }

    fn render(&self, size: Option<usize>, with_sort: bool) -> Value {
        let mut body = Map::new();
        body.insert(
            "query".to_string(),
            json!({ "bool": { "must": self.must_clauses() } }),
        );
        if let Some(fields) = &self.fields {
            body.insert("fields".to_string(), json!(fields));
        }
        if let Some(size) = size {
            body.insert("size".to_string(), json!(size));
        }
        if with_sort {
            if let Some(sort) = &self.sort {
                let specs: Vec<Value> = sort.iter().map(SortSpec::to_json).collect();
                body.insert("sort".to_string(), Value::Array(specs));
            }
        }
        Value::Object(body)
    }
}

impl Serialize for QueryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ============================================================================
// QueryBuilder
// ============================================================================

/// Fluent builder for [`QueryDocument`]
///
/// At least one equality or range constraint is required; regex and batch
/// constraints only narrow a query that already has one.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    equality: Vec<Constraint>,
    range: Vec<Constraint>,
    regex: Vec<Constraint>,
    batch: Vec<Constraint>,
    fields: Option<Vec<String>>,
    size: Option<usize>,
    sort: Vec<SortSpec>,
    fetch_all: Option<bool>,
}

impl QueryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        match constraint {
            c @ Constraint::Equality(..) => self.equality.push(c),
            c @ Constraint::Range(..) => self.range.push(c),
            c @ Constraint::Regex(..) => self.regex.push(c),
            c @ Constraint::Batch(..) => self.batch.push(c),
        }
        self
    }

    /// `field == value`
    pub fn equal(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraint(Constraint::Equality(field.into(), value.into()))
    }

    /// `low <= field <= high`, either bound optional.
    pub fn range(self, field: impl Into<String>, low: Option<Value>, high: Option<Value>) -> Self {
        self.constraint(Constraint::Range(field.into(), low, high))
    }

    /// `low <= field <= high`
    pub fn between(
        self,
        field: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.range(field, Some(low.into()), Some(high.into()))
    }

    /// `field >= low`
    pub fn at_least(self, field: impl Into<String>, low: impl Into<Value>) -> Self {
        self.range(field, Some(low.into()), None)
    }

    /// `field <= high`
    pub fn at_most(self, field: impl Into<String>, high: impl Into<Value>) -> Self {
        self.range(field, None, Some(high.into()))
    }

    /// `field` matches `pattern`.
    pub fn regex(self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.constraint(Constraint::Regex(field.into(), pattern.into()))
    }

    /// `field` equals one of `values`.
    pub fn batch<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.constraint(Constraint::Batch(field.into(), values))
    }

    /// Restrict the returned fields. An empty list returns the full record.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        self.fields = if fields.is_empty() { None } else { Some(fields) };
        self
    }

    /// Cap the number of hits.
    ///
    /// Setting a size turns off the scroll fallback unless
    /// [`fetch_all`](Self::fetch_all) is set explicitly.
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Append a sort key. Keys apply in the order they are added.
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortSpec::new(field, order));
        self
    }

    /// Force the scroll fallback on or off.
    pub fn fetch_all(mut self, fetch_all: bool) -> Self {
        self.fetch_all = Some(fetch_all);
        self
    }

    /// Validate and produce the query document.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidQuery`] when neither an equality nor a range
    /// constraint was given.
    pub fn compose(self) -> Result<QueryDocument> {
        if self.equality.is_empty() && self.range.is_empty() {
            return Err(Error::invalid_query(
                "no range or equality constraints specified",
            ));
        }

        let constraints = self
            .equality
            .into_iter()
            .chain(self.batch)
            .chain(self.range)
            .chain(self.regex)
            .filter(|c| !c.is_trivial())
            .collect();

        Ok(QueryDocument {
            fields: self.fields,
            constraints,
            size: self.size.unwrap_or(DEFAULT_RESULT_SIZE),
            sort: if self.sort.is_empty() {
                None
            } else {
                Some(self.sort)
            },
            fetch_all: self.fetch_all.unwrap_or(self.size.is_none()),
        })
    }
}
