//! Multi-page accumulation
//!
//! The API reports neither a total count nor a last-page flag, so the loop
//! stops on the first of, in priority order:
//! - an absent or empty page (discarded)
//! - a page identical to one already accepted (discarded; the upstream
//!   sometimes repeats the last page instead of returning an empty one)
//! - a page shorter than the requested page size (accepted, then stop)

use serde_json::Value;
use std::future::Future;
use tracing::debug;

use crate::fetcher::request_key::PagedResource;
use crate::fetcher::FetcherResult;

/// Why a pagination run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page was absent or had no items
    EmptyPage,
    /// The page repeated an already accepted page
    DuplicatePage,
    /// The page had fewer items than requested
    ShortPage,
}

/// Normalize a page response into its items.
///
/// `null` means no page; a bare record counts as a one-item page.
pub fn page_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(items),
        other => Some(vec![other]),
    }
}

/// Fetch all pages of `resource` and return the flattened items.
///
/// `fetch_page` receives the page number and resolves to that page's decoded
/// body; it decides whether the cache or the network serves the page.
///
/// # Errors
/// The first error returned by `fetch_page`; accepted pages are discarded.
pub async fn paginate<F, Fut>(resource: &PagedResource, mut fetch_page: F) -> FetcherResult<Vec<Value>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = FetcherResult<Value>>,
{
    let page_size = resource.page_size as usize;
    let mut accepted: Vec<Vec<Value>> = Vec::new();
    let mut page = resource.first_page;

    let reason = loop {
        debug!(path = %resource.path, page, "fetching page");
        let items = match page_items(fetch_page(page).await?) {
            Some(items) if !items.is_empty() => items,
            _ => break StopReason::EmptyPage,
        };

        if accepted.contains(&items) {
            break StopReason::DuplicatePage;
        }

        let short = items.len() < page_size;
        accepted.push(items);
        if short {
            break StopReason::ShortPage;
        }
        page += 1;
    };

    let items: Vec<Value> = accepted.into_iter().flatten().collect();
    debug!(
        path = %resource.path,
        last_page = page,
        ?reason,
        items = items.len(),
        "pagination complete"
    );
    Ok(items)
}
