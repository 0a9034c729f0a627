//! Request key construction
//!
//! A request key is the fully resolved URL of a GET request. It doubles as
//! the cache key, so two requests for the same logical resource must always
//! render to the same string.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

/// Characters escaped inside the `query=` filter value
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

/// Pagination parameters of a single page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Requested number of items per page
    pub items: u32,
    /// Page number
    pub page: u32,
}

impl PageRequest {
    /// Create a page request
    pub fn new(items: u32, page: u32) -> Self {
        Self { items, page }
    }
}

/// Render a request key
///
/// `base + path [+ "?items=<n>&page=<p>"] [+ ("?"|"&") + "query=" + filter]`
pub fn request_key(base: &str, path: &str, query: Option<&str>, page: Option<PageRequest>) -> String {
    let mut key = format!("{base}{path}");
    if let Some(PageRequest { items, page }) = page {
        key.push_str(&format!("?items={items}&page={page}"));
    }
    append_query(&mut key, query);
    key
}

fn append_query(key: &mut String, query: Option<&str>) {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return;
    };
    key.push(if key.contains('?') { '&' } else { '?' });
    key.push_str("query=");
    key.extend(utf8_percent_encode(query, QUERY_VALUE));
}

/// A paginated API resource, fetched page by page until exhausted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagedResource {
    /// Resource path relative to the API base (e.g. `assignments/7/results`)
    pub path: String,
    /// Optional filter expression sent as `query=`
    pub query: Option<String>,
    /// Items requested per page
    pub page_size: u32,
    /// Number of the first page to request
    pub first_page: u32,
}

impl PagedResource {
    /// Resource starting at page 1 with the given page size
    pub fn new(path: impl Into<String>, page_size: u32) -> Self {
        Self {
            path: path.into(),
            query: None,
            page_size,
            first_page: 1,
        }
    }

    /// Attach a filter expression
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Start at a page other than 1
    pub fn with_first_page(mut self, first_page: u32) -> Self {
        self.first_page = first_page;
        self
    }

    /// Key of one concrete page of this resource
    pub fn page_key(&self, base: &str, page: u32) -> String {
        request_key(
            base,
            &self.path,
            self.query.as_deref(),
            Some(PageRequest::new(self.page_size, page)),
        )
    }

    /// Key identifying the whole flattened resource.
    ///
    /// Never sent over the wire; the open page range keeps it distinct from
    /// every real page key.
    pub fn resource_key(&self, base: &str) -> String {
        let mut key = format!(
            "{base}{}?items={}&page={}..",
            self.path, self.page_size, self.first_page
        );
        append_query(&mut key, self.query.as_deref());
        key
    }
}
