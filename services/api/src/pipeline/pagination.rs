//! Offset pagination over an ordered [`Query`]

use serde::Serialize;

use super::{PipelineError, Query};

/// One page of results plus the totals a client needs to navigate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Project the items while keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slice an ordered query into the requested page
///
/// `page` and `page_size` are clamped to at least 1. An empty result is page
/// 1 of 1 with no items; a page past the end returns no items.
pub fn paginate<T>(query: Query<T>, page: u64, page_size: u64) -> Result<Page<T>, PipelineError> {
    if !query.is_ordered() {
        return Err(PipelineError::Unordered);
    }

    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = query.len() as u64;
    let total_pages = total_items.div_ceil(page_size).max(1);

    let offset = (page - 1).saturating_mul(page_size);
    let skip = usize::try_from(offset).unwrap_or(usize::MAX);
    let take = usize::try_from(page_size).unwrap_or(usize::MAX);

    let items = query.into_rows().into_iter().skip(skip).take(take).collect();

    Ok(Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    })
}
