//! Paging through provider APIs until they run out of data.

use std::{future::Future, time::Duration};

use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, info, instrument, warn};

/// Opaque continuation token handed out by a provider. Never empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Providers signal the last page with a missing or empty cursor.
    pub fn new<S: Into<String>>(cursor: S) -> Option<Self> {
        let cursor = cursor.into();
        if cursor.is_empty() {
            None
        } else {
            Some(Self(cursor))
        }
    }

    pub fn from_optional(cursor: Option<String>) -> Option<Self> {
        cursor.and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub next: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, next: Option<Cursor>) -> Self {
        Self { records, next }
    }
}

/// One upstream API that hands out its data a page at a time.
pub trait PagedSource {
    type Record: Send;

    /// Short provider name used in logs and errors.
    const NAME: &'static str;

    /// Fetches the page at `cursor`, the first page when `None`.
    fn fetch_page(
        &self,
        cursor: Option<&Cursor>,
    ) -> impl Future<Output = crate::Result<Page<Self::Record>>> + Send;
}

/// How often a single page request is re-issued after a transient failure.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryPolicy {
    pub attempts: usize,
}

impl RetryPolicy {
    pub fn new(attempts: usize) -> Self {
        Self { attempts }
    }

    /// 250ms, 500ms, 1s, ... capped at 5s.
    fn delays(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(125)
            .max_delay(Duration::from_secs(5))
            .take(self.attempts)
    }
}

async fn fetch_page_with_retries<S>(
    source: &S,
    cursor: Option<&Cursor>,
    retry: &RetryPolicy,
) -> crate::Result<Page<S::Record>>
where
    S: PagedSource + Sync,
{
    RetryIf::spawn(
        retry.delays(),
        || source.fetch_page(cursor),
        |err: &crate::Error| {
            let transient = err.is_transient();
            if transient {
                warn!(provider = S::NAME, "retrying page after transient failure: {err}");
            }
            transient
        },
    )
    .await
}

/// Walks every page of `source` and returns all records in page order.
#[instrument(skip_all, fields(provider = S::NAME))]
pub async fn collect_all<S>(source: &S, retry: &RetryPolicy) -> crate::Result<Vec<S::Record>>
where
    S: PagedSource + Sync,
{
    let mut records = Vec::new();
    let mut cursor: Option<Cursor> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_page_with_retries(source, cursor.as_ref(), retry).await?;
        pages += 1;

        let fetched = page.records.len();
        records.extend(page.records);
        info!(
            "Fetched {fetched} records from page {pages}. Total so far: {}.",
            records.len()
        );

        match page.next {
            None => {
                info!("No more pages to fetch. All data retrieved.");
                break;
            }
            Some(next) if cursor.as_ref() == Some(&next) => {
                return Err(crate::Error::PaginationStalled {
                    provider: S::NAME,
                    cursor: next.0,
                });
            }
            Some(next) => {
                debug!(cursor = next.as_str(), "next page");
                cursor = Some(next);
            }
        }
    }

    Ok(records)
}
