//! OData query fragments.
//!
//! [`ODataQuery`] collects the `$filter`, `$select` and `$top` parts of a
//! request and renders them as `$filter=<expr>&$select=<a,b>&$top=<n>`.
//! Literal values embedded in filters must go through [`escape_literal`].

use std::fmt;

/// Query options for a read or list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    filter: Option<String>,
    select: Vec<String>,
    top: Option<u32>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Restrict the returned fields.
    pub fn with_select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Limit the page size.
    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn select(&self) -> &[String] {
        &self.select
    }

    pub fn top(&self) -> Option<u32> {
        self.top
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.select.is_empty() && self.top.is_none()
    }

    /// Render as a query string without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(filter) = &self.filter {
            parts.push(format!("$filter={}", filter));
        }
        if !self.select.is_empty() {
            parts.push(format!("$select={}", self.select.join(",")));
        }
        if let Some(top) = self.top {
            parts.push(format!("$top={}", top));
        }
        parts.join("&")
    }
}

impl fmt::Display for ODataQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Escape a string literal for use inside single quotes.
///
/// Embedded quotes are doubled: `O'Brien` becomes `O''Brien`.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Build `<attribute> eq '<escaped value>'`.
pub fn eq_filter(attribute: &str, value: &str) -> String {
    format!("{} eq '{}'", attribute, escape_literal(value))
}
