// src/index/query.rs
// =============================================================================
// Builds the CDX index query URL.
//
// The CDX server understands a handful of query parameters:
//   url       - the URL pattern (required, may contain wildcards like /*)
//   from / to - inclusive timestamp bounds, yyyyMMddhhmmss (prefixes allowed)
//   limit     - maximum number of rows; negative means the last N rows
//   filter    - field:regex filters, may be repeated
//   collapse  - drop adjacent rows sharing a field value (e.g. "digest")
//
// We always ask for JSON output and only the three fields we need.
//
// Values are appended verbatim. Percent-encoding them would mangle filter
// expressions such as "!statuscode:404" before the server ever sees them.
// =============================================================================

/// The user's search over the index, one field per CDX parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexQuery {
    pub url: String,
    pub from: Option<String>,
    pub to: Option<String>,
    /// 0 means "no limit", a negative value keeps only the last N captures
    pub limit: i64,
    pub filters: Vec<String>,
    pub collapse: Option<String>,
}

impl IndexQuery {
    /// Creates a query for a URL pattern with no other constraints.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Assembles the full query URL against the given index endpoint.
    ///
    /// Example:
    ///   index_base = "https://web.archive.org/cdx/search/cdx", url = "a.com", limit = 5
    ///   -> "https://web.archive.org/cdx/search/cdx?url=a.com&output=json&fl=timestamp,digest,length&limit=5"
    pub fn to_request_url(&self, index_base: &str) -> String {
        let mut request_url = format!(
            "{}?url={}&output=json&fl=timestamp,digest,length",
            index_base, self.url
        );

        push_param(&mut request_url, "from", self.from.as_deref());
        push_param(&mut request_url, "to", self.to.as_deref());
        if self.limit != 0 {
            request_url.push_str(&format!("&limit={}", self.limit));
        }
        push_param(&mut request_url, "collapse", self.collapse.as_deref());
        for filter in &self.filters {
            push_param(&mut request_url, "filter", Some(filter));
        }

        request_url
    }
}

// Appends "&name=value" only when the value is present and non-empty
fn push_param(request_url: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        request_url.push_str(&format!("&{}={}", name, value));
    }
}
