//! Listing query construction for `GET /customers`.
//!
//! Only values are bound as parameters. Column names and sort directions come from the fixed
//! enums below, so nothing the caller sends ever reaches an identifier position in the SQL.

use sqlx::{Postgres, QueryBuilder};

use crate::models::CustomerListParams;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 200;

const CUSTOMER_SUMMARY_COLUMNS: &str = "customer_id, nik, full_name, gender, city, province, \
     customer_segment, status, registration_date, last_updated";

/// Direction for sorting results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` case-insensitively; anything else is `Desc`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Columns the list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    LastUpdated,
    RegistrationDate,
    FullName,
}

impl SortColumn {
    /// Unknown or missing values fall back to `LastUpdated`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("registration_date") => SortColumn::RegistrationDate,
            Some("full_name") => SortColumn::FullName,
            _ => SortColumn::LastUpdated,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortColumn::LastUpdated => "last_updated",
            SortColumn::RegistrationDate => "registration_date",
            SortColumn::FullName => "full_name",
        }
    }
}

/// A permitted filter: each variant fixes its column and operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerFilter {
    /// Substring match on id, NIK and full name.
    Search(String),
    Status(String),
    Segment(String),
    Province(String),
    City(String),
    Gender(String),
}

impl CustomerFilter {
    fn push_sql(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        let (column, value) = match self {
            CustomerFilter::Search(text) => {
                let pattern = format!("%{}%", escape_like(text));
                builder.push("(customer_id LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR nik LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" OR full_name LIKE ");
                builder.push_bind(pattern);
                builder.push(")");
                return;
            }
            CustomerFilter::Status(v) => ("status", v),
            CustomerFilter::Segment(v) => ("customer_segment", v),
            CustomerFilter::Province(v) => ("province", v),
            CustomerFilter::City(v) => ("city", v),
            CustomerFilter::Gender(v) => ("gender", v),
        };
        builder.push(column);
        builder.push(" = ");
        builder.push_bind(value.clone());
    }
}

/// Escapes LIKE wildcards so the search text is matched literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Normalized listing request: clamped pagination, whitelisted filters and sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerListQuery {
    pub limit: i64,
    pub offset: i64,
    pub filters: Vec<CustomerFilter>,
    pub sort_column: SortColumn,
    pub sort_direction: SortDirection,
}

impl Default for CustomerListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            filters: Vec::new(),
            sort_column: SortColumn::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl CustomerListQuery {
    pub fn from_params(params: &CustomerListParams) -> Self {
        let limit = clamp_limit(parse_int(params.limit.as_deref()));
        let offset = clamp_offset(parse_int(params.offset.as_deref()));

        let mut filters = Vec::new();
        let candidates: [(&Option<String>, fn(String) -> CustomerFilter); 6] = [
            (&params.q, CustomerFilter::Search),
            (&params.status, CustomerFilter::Status),
            (&params.segment, CustomerFilter::Segment),
            (&params.province, CustomerFilter::Province),
            (&params.city, CustomerFilter::City),
            (&params.gender, CustomerFilter::Gender),
        ];
        for (raw, filter) in candidates {
            if let Some(value) = raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                filters.push(filter(value.to_string()));
            }
        }

        Self {
            limit,
            offset,
            filters,
            sort_column: SortColumn::parse(params.sort_by.as_deref()),
            sort_direction: SortDirection::parse(params.sort_dir.as_deref()),
        }
    }

    /// `SELECT COUNT(*)` over the same filters as the page query.
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM customers");
        self.push_where(&mut builder);
        builder
    }

    /// The page query: filters, whitelisted ORDER BY, bound LIMIT/OFFSET.
    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(CUSTOMER_SUMMARY_COLUMNS);
        builder.push(" FROM customers");
        self.push_where(&mut builder);

        let direction = self.sort_direction.as_sql();
        builder.push(" ORDER BY ");
        builder.push(self.sort_column.as_sql());
        builder.push(" ");
        builder.push(direction);
        // Stable pages when the sort column has ties.
        builder.push(", customer_id ");
        builder.push(direction);

        builder.push(" LIMIT ");
        builder.push_bind(self.limit);
        builder.push(" OFFSET ");
        builder.push_bind(self.offset);
        builder
    }

    fn push_where(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        for (i, filter) in self.filters.iter().enumerate() {
            builder.push(if i == 0 { " WHERE " } else { " AND " });
            filter.push_sql(builder);
        }
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Missing, zero or negative limits use the default; large ones are capped.
pub fn clamp_limit(raw: Option<i64>) -> i64 {
    match raw {
        Some(n) if n <= 0 => DEFAULT_LIMIT,
        Some(n) => n.min(MAX_LIMIT),
        None => DEFAULT_LIMIT,
    }
}

pub fn clamp_offset(raw: Option<i64>) -> i64 {
    raw.unwrap_or(0).max(0)
}
