//! # Search Query Builder
//!
//! Composes Zenodo search queries from typed filters. Filters render to the
//! Elasticsearch query-string syntax the Zenodo records endpoint accepts;
//! combinators wrap each operand in parentheses.
//!
//! ```
//! use hflav_core::query::{Combinator, QueryBuilder, SortOption};
//!
//! let query = QueryBuilder::new()
//!     .with_text("title", "tau lifetime")
//!     .with_number("version", 2, ":>=")
//!     .order_by(SortOption::MostRecent, false)
//!     .with_pagination(5, 1)
//!     .build(Combinator::And);
//!
//! assert_eq!(
//!     query.query_string(),
//!     r#"(title:"tau lifetime") AND (version:>=2)"#
//! );
//! ```

use std::fmt;

use chrono::NaiveDateTime;

/// Sort used when a query does not choose one.
pub const DEFAULT_SORT: &str = "newest";

const DEFAULT_PAGE_SIZE: u32 = 10;

/// A search filter. Leaves match one field; combinators join filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `field<op>"value"`.
    Text {
        field: String,
        value: String,
        operator: String,
    },
    /// `field:[start TO end]`.
    DateRange {
        field: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// `field<op>value`, value unquoted.
    Numeric {
        field: String,
        value: String,
        operator: String,
    },
    /// `_exists_:field` or its negation.
    Existence { field: String, exists: bool },
    /// Query-string text passed through verbatim.
    Raw(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// Every operand negated, joined with `AND`.
    Not(Vec<Filter>),
}

impl Filter {
    /// Render the query-string fragment for this filter.
    pub fn build_query(&self) -> String {
        match self {
            Self::Text {
                field,
                value,
                operator,
            } => format!("{field}{operator}\"{value}\""),
            Self::DateRange { field, start, end } => format!(
                "{field}:[{} TO {}]",
                start.format("%Y-%m-%dT%H:%M:%S"),
                end.format("%Y-%m-%dT%H:%M:%S")
            ),
            Self::Numeric {
                field,
                value,
                operator,
            } => format!("{field}{operator}{value}"),
            Self::Existence { field, exists } => {
                if *exists {
                    format!("_exists_:{field}")
                } else {
                    format!("NOT _exists_:{field}")
                }
            }
            Self::Raw(text) => text.clone(),
            Self::And(filters) => join(filters, "", " AND "),
            Self::Or(filters) => join(filters, "", " OR "),
            Self::Not(filters) => join(filters, "NOT ", " AND "),
        }
    }
}

fn join(filters: &[Filter], prefix: &str, separator: &str) -> String {
    filters
        .iter()
        .map(|f| format!("{prefix}({})", f.build_query()))
        .collect::<Vec<_>>()
        .join(separator)
}

/// How several filters are folded into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Combinator {
    #[default]
    And,
    Or,
    Not,
}

impl Combinator {
    fn combine(self, filters: Vec<Filter>) -> Filter {
        match self {
            Self::And => Filter::And(filters),
            Self::Or => Filter::Or(filters),
            Self::Not => Filter::Not(filters),
        }
    }
}

/// Sort orders supported by the Zenodo records endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOption {
    MostRecent,
    BestMatch,
}

impl SortOption {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MostRecent => "mostrecent",
            Self::BestMatch => "bestmatch",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished search request, ready to be rendered into HTTP parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub filter: Option<Filter>,
    pub sort: Option<String>,
    pub size: u32,
    pub page: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            filter: None,
            sort: None,
            size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl SearchQuery {
    /// A free-text query with default paging.
    pub fn text(q: impl Into<String>) -> Self {
        let q = q.into();
        Self {
            filter: (!q.trim().is_empty()).then_some(Filter::Raw(q)),
            ..Self::default()
        }
    }

    /// The `q` parameter. Empty when there is no filter.
    pub fn query_string(&self) -> String {
        self.filter
            .as_ref()
            .map(Filter::build_query)
            .unwrap_or_default()
    }

    /// HTTP query parameters for a search scoped to `community`.
    pub fn params(&self, community: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("communities", community.to_string()),
            ("size", self.size.to_string()),
            ("page", self.page.to_string()),
        ];
        let q = self.query_string();
        if !q.is_empty() {
            params.push(("q", q));
        }
        params.push((
            "sort",
            self.sort.clone().unwrap_or_else(|| DEFAULT_SORT.to_string()),
        ));
        params
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_string())
    }
}

/// Fluent builder for [`SearchQuery`].
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    filters: Vec<Filter>,
    sort: String,
    size: u32,
    page: u32,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            sort: SortOption::MostRecent.as_str().to_string(),
            size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }

    pub fn with_text(self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_text_op(field, value, ":")
    }

    pub fn with_text_op(
        mut self,
        field: impl Into<String>,
        value: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        self.filters.push(Filter::Text {
            field: field.into(),
            value: value.into(),
            operator: operator.into(),
        });
        self
    }

    pub fn with_date_range(
        mut self,
        field: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        self.filters.push(Filter::DateRange {
            field: field.into(),
            start,
            end,
        });
        self
    }

    pub fn with_number(
        mut self,
        field: impl Into<String>,
        value: impl ToString,
        operator: impl Into<String>,
    ) -> Self {
        self.filters.push(Filter::Numeric {
            field: field.into(),
            value: value.to_string(),
            operator: operator.into(),
        });
        self
    }

    pub fn with_existence(mut self, field: impl Into<String>, exists: bool) -> Self {
        self.filters.push(Filter::Existence {
            field: field.into(),
            exists,
        });
        self
    }

    /// Add free query-string text. Blank text adds nothing.
    pub fn with_raw(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.filters.push(Filter::Raw(text));
        }
        self
    }

    /// Sort by `field`, prefixing `-` for descending order.
    pub fn order_by(mut self, field: SortOption, desc: bool) -> Self {
        let direction = if desc { "-" } else { "" };
        self.sort = format!("{direction}{field}");
        self
    }

    pub fn with_pagination(mut self, size: u32, page: u32) -> Self {
        self.size = size;
        self.page = page;
        self
    }

    /// Append every filter of `other` to this builder.
    pub fn merge_filters(mut self, other: QueryBuilder) -> Self {
        self.filters.extend(other.filters);
        self
    }

    /// Fold the current filters into a single combined filter.
    pub fn apply_combinator(mut self, combinator: Combinator) -> Self {
        if !self.filters.is_empty() {
            let filters = std::mem::take(&mut self.filters);
            self.filters.push(combinator.combine(filters));
        }
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Finish the query, joining several filters with `default_operator`.
    pub fn build(mut self, default_operator: Combinator) -> SearchQuery {
        let filter = match self.filters.len() {
            0 => None,
            1 => self.filters.pop(),
            _ => Some(default_operator.combine(self.filters)),
        };
        SearchQuery {
            filter,
            sort: Some(self.sort),
            size: self.size,
            page: self.page,
        }
    }
}
