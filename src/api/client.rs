//! HTTP client for the object API.

use std::collections::VecDeque;

use futures_util::stream::{self, Stream};

use super::error::ApiError;
use super::types::{ObjectPage, PageInfo, RawRecord};

/// Default object endpoint of the Harvard Art Museums API.
pub const DEFAULT_BASE_URL: &str = "https://api.harvardartmuseums.org/object";

/// Client for the paginated object listing.
///
/// Cheap to clone; the inner `reqwest::Client` shares its connection
/// pool across clones.
#[derive(Clone)]
pub struct ObjectClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for ObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ObjectClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Query parameters for one page request.
    ///
    /// `hasimage=1` restricts the listing to records with at least one
    /// image, matching what the media table expects to work with.
    fn page_params(
        &self,
        classification: &str,
        page: u64,
        page_size: u32,
    ) -> [(&'static str, String); 5] {
        [
            ("classification", classification.to_string()),
            ("size", page_size.to_string()),
            ("page", page.to_string()),
            ("hasimage", "1".to_string()),
            ("apikey", self.api_key.clone()),
        ]
    }

    /// Fetch a single page of records.
    pub async fn fetch_page(
        &self,
        classification: &str,
        page: u64,
        page_size: u32,
    ) -> Result<ObjectPage, ApiError> {
        tracing::debug!(classification, page, page_size, "Fetching page");
        let response = self
            .http
            .get(&self.base_url)
            .query(&self.page_params(classification, page, page_size))
            .send()
            .await
            .map_err(|source| ApiError::Http { page, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { page, status });
        }

        response
            .json::<ObjectPage>()
            .await
            .map_err(|source| ApiError::Decode { page, source })
    }

    /// Fetch a page, retrying once immediately on a transient failure.
    async fn fetch_page_with_retry(
        &self,
        classification: &str,
        page: u64,
        page_size: u32,
    ) -> Result<ObjectPage, ApiError> {
        match self.fetch_page(classification, page, page_size).await {
            Ok(fetched) => Ok(fetched),
            Err(e) if e.is_retryable() => {
                tracing::warn!(page, error = %e, "Page fetch failed, retrying once");
                self.fetch_page(classification, page, page_size).await
            }
            Err(e) => Err(e),
        }
    }

    /// Lazy stream of raw records for one classification.
    ///
    /// Pages are fetched on demand as the consumer pulls records, never
    /// ahead of it. The stream ends cleanly once `max_records` records
    /// have been yielded or the upstream reports no further page. A page
    /// that fails its retry yields the error and terminates the stream;
    /// records yielded before that point stand.
    pub fn record_stream(
        &self,
        classification: &str,
        max_records: u64,
        page_size: u32,
    ) -> impl Stream<Item = Result<RawRecord, ApiError>> {
        struct Cursor {
            client: ObjectClient,
            classification: String,
            page_size: u32,
            max_records: u64,
            yielded: u64,
            next_page: u64,
            buffer: VecDeque<RawRecord>,
            exhausted: bool,
        }

        let cursor = Cursor {
            client: self.clone(),
            classification: classification.to_string(),
            page_size,
            max_records,
            yielded: 0,
            next_page: 1,
            buffer: VecDeque::new(),
            exhausted: false,
        };

        stream::try_unfold(cursor, |mut cur| async move {
            loop {
                if cur.yielded >= cur.max_records {
                    return Ok(None);
                }
                if let Some(record) = cur.buffer.pop_front() {
                    cur.yielded += 1;
                    return Ok(Some((record, cur)));
                }
                if cur.exhausted {
                    return Ok(None);
                }

                let page = cur.next_page;
                let fetched = cur
                    .client
                    .fetch_page_with_retry(&cur.classification, page, cur.page_size)
                    .await?;
                cur.next_page += 1;
                cur.exhausted = !has_next_page(&fetched.info, fetched.records.len());
                tracing::debug!(
                    page,
                    records = fetched.records.len(),
                    exhausted = cur.exhausted,
                    "Fetched page"
                );
                cur.buffer.extend(fetched.records);
            }
        })
    }
}

/// Whether another page should be requested after the one just fetched.
fn has_next_page(info: &PageInfo, records_on_page: usize) -> bool {
    records_on_page > 0 && info.next.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params() {
        let client = ObjectClient::new("https://example.test/object", "secret-key");
        let params = client.page_params("Vessels", 3, 100);
        assert_eq!(params[0], ("classification", "Vessels".to_string()));
        assert_eq!(params[1], ("size", "100".to_string()));
        assert_eq!(params[2], ("page", "3".to_string()));
        assert_eq!(params[3], ("hasimage", "1".to_string()));
        assert_eq!(params[4], ("apikey", "secret-key".to_string()));
    }

    #[test]
    fn test_has_next_page_with_next_url() {
        let info = PageInfo {
            next: Some("https://example.test/object?page=2".to_string()),
            ..Default::default()
        };
        assert!(has_next_page(&info, 100));
    }

    #[test]
    fn test_no_next_page_on_last_page() {
        let info = PageInfo::default();
        assert!(!has_next_page(&info, 30));
    }

    #[test]
    fn test_no_next_page_on_empty_page() {
        // A next URL with zero records would loop forever; the record
        // count wins.
        let info = PageInfo {
            next: Some("https://example.test/object?page=9".to_string()),
            ..Default::default()
        };
        assert!(!has_next_page(&info, 0));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = ObjectClient::new("https://example.test/object", "secret-key");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-key"));
    }
}
