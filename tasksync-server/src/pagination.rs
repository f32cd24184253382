//! Cursor pagination over the task store.
//!
//! Pages are served newest first. To learn whether another page exists
//! without a count query, each fetch asks the store for `page_size + 1`
//! records: if the extra record comes back it is withheld from the page
//! and its id becomes the next page token, so it opens the following page.

use tasksync_proto::cursor::{self, PageToken};
use tasksync_proto::task::{ListTasksQuery, ListTasksResponse, RecordId, TaskRecord};

use crate::error::ValidationError;
use crate::store::TaskStore;

/// Page size bounds applied to list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Size used when the request gives none.
    pub default_page_size: u32,
    /// Largest accepted size.
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: tasksync_proto::task::DEFAULT_PAGE_SIZE,
            max_page_size: 100,
        }
    }
}

/// A validated list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of records to return.
    pub page_size: usize,
    /// First record of the page, or `None` for the newest.
    pub boundary: Option<RecordId>,
}

impl PageRequest {
    /// Validates a raw list query against `limits`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] on `pageSize` if it is zero or above the
    /// maximum, or on `pageToken` if the token does not decode.
    pub fn parse(query: &ListTasksQuery, limits: PageLimits) -> Result<Self, ValidationError> {
        let page_size = query.page_size.unwrap_or(limits.default_page_size);
        if page_size == 0 || page_size > limits.max_page_size {
            return Err(ValidationError::single(
                "pageSize",
                format!("must be between 1 and {}", limits.max_page_size),
            ));
        }
        let boundary = query
            .page_token
            .as_deref()
            .map(cursor::decode)
            .transpose()
            .map_err(|e| ValidationError::single("pageToken", e.to_string()))?;
        Ok(Self {
            page_size: page_size as usize,
            boundary,
        })
    }
}

/// Splits a lookahead fetch of up to `page_size + 1` records into the page
/// and the token of the record after it.
#[must_use]
pub fn split_lookahead(
    mut records: Vec<TaskRecord>,
    page_size: usize,
) -> (Vec<TaskRecord>, Option<PageToken>) {
    if records.len() > page_size {
        let next = records.get(page_size).map(|r| cursor::encode(r.id));
        records.truncate(page_size);
        (records, next)
    } else {
        (records, None)
    }
}

/// Serves one page from the store.
pub async fn fetch_page(store: &TaskStore, request: PageRequest) -> ListTasksResponse {
    let records = store
        .range_desc(request.boundary, request.page_size + 1)
        .await;
    let (items, next_page_token) = split_lookahead(records, request.page_size);
    ListTasksResponse {
        items,
        next_page_token,
    }
}
