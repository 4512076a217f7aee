//! Collect-run engine: stream records from the API, normalize each one,
//! and load it into the store as it arrives.
//!
//! Records are processed one at a time with no full-collection buffering,
//! so the first row lands in the store as soon as the first page returns.
//! Rejected and failed records are counted and logged, never fatal; a
//! fetch abort ends the run with whatever already loaded.

use std::io::IsTerminal;

use futures_util::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::{ApiError, ObjectClient, RawRecord};
use crate::store::{ArtifactStore, StoreError};
use crate::transform;

pub use crate::store::LoadRunStats as IngestStats;

/// Options for one collect run.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Classification to fetch, e.g. "Coins".
    pub classification: String,
    /// Stop after this many records even if the API has more.
    pub max_records: u64,
    /// Records requested per API page.
    pub page_size: u32,
}

/// Run one collect: fetch, transform, load, and record the run.
pub async fn collect(
    client: &ObjectClient,
    store: &dyn ArtifactStore,
    options: &CollectOptions,
) -> Result<IngestStats, StoreError> {
    let stream = client.record_stream(
        &options.classification,
        options.max_records,
        options.page_size,
    );
    run(stream, store, options).await
}

/// Drive a record stream through transform and load, bookending the run
/// with a `load_runs` row.
async fn run<S>(
    stream: S,
    store: &dyn ArtifactStore,
    options: &CollectOptions,
) -> Result<IngestStats, StoreError>
where
    S: Stream<Item = Result<RawRecord, ApiError>>,
{
    tracing::info!(
        classification = %options.classification,
        max_records = options.max_records,
        "Starting collect run"
    );
    let run_id = store.start_load_run(&options.classification).await?;

    let pb = create_progress_bar(options.max_records);
    pb.set_message(options.classification.clone());

    let stats = drain(stream, store, &pb).await;
    pb.finish_and_clear();

    store.complete_load_run(run_id, &stats).await?;
    tracing::info!(
        fetched = stats.fetched,
        loaded = stats.loaded,
        rejected = stats.rejected,
        failed = stats.failed,
        "Collect run complete"
    );
    Ok(stats)
}

/// Consume the stream one record at a time, accumulating counters.
///
/// A stream error means pagination aborted upstream; everything already
/// loaded stays loaded and the counters reflect the partial run.
async fn drain<S>(stream: S, store: &dyn ArtifactStore, pb: &ProgressBar) -> IngestStats
where
    S: Stream<Item = Result<RawRecord, ApiError>>,
{
    let mut stats = IngestStats::default();
    tokio::pin!(stream);

    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => {
                let offset = stats.fetched;
                stats.fetched += 1;
                match transform::transform(record, offset) {
                    Ok(transformed) => {
                        let id = transformed.metadata.id;
                        match store.load_record(&transformed).await {
                            Ok(()) => stats.loaded += 1,
                            Err(e) => {
                                stats.failed += 1;
                                pb.suspend(|| {
                                    tracing::warn!("Skipping artifact {}: {}", id, e);
                                });
                            }
                        }
                    }
                    Err(e) => {
                        stats.rejected += 1;
                        pb.suspend(|| tracing::warn!("Rejected record: {}", e));
                    }
                }
                pb.inc(1);
            }
            Err(e) => {
                pb.suspend(|| {
                    tracing::error!("Fetch aborted on page {}: {}", e.page(), e);
                });
                break;
            }
        }
    }

    stats
}

/// Progress bar sized to the requested record count.
///
/// Hidden when stderr is not a TTY (piped output, cron jobs) so log
/// lines stay clean.
fn create_progress_bar(total: u64) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .expect("valid template")
        .progress_chars("=> "),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use serde_json::json;

    use crate::store::SqliteArtifactStore;

    fn raw(value: serde_json::Value) -> RawRecord {
        serde_json::from_value(value).unwrap()
    }

    fn options() -> CollectOptions {
        CollectOptions {
            classification: "Coins".to_string(),
            max_records: 10,
            page_size: 5,
        }
    }

    #[tokio::test]
    async fn test_run_loads_every_valid_record() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        let records = vec![
            Ok(raw(json!({"id": 1, "title": "Drachm", "classification": "Coins"}))),
            Ok(raw(json!({"id": 2, "title": "Obol", "classification": "Coins"}))),
        ];

        let stats = run(stream::iter(records), &store, &options())
            .await
            .unwrap();
        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.failed, 0);

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.artifacts, 2);
    }

    #[tokio::test]
    async fn test_run_counts_rejected_records() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        let records = vec![
            Ok(raw(json!({"id": 1, "title": "Drachm"}))),
            Ok(raw(json!({"title": "No id here"}))),
            Ok(raw(json!({"id": 3, "title": "Obol"}))),
        ];

        let stats = run(stream::iter(records), &store, &options())
            .await
            .unwrap();
        assert_eq!(stats.fetched, 3);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_stream_error_keeping_partial_results() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        let records = vec![
            Ok(raw(json!({"id": 1, "title": "Drachm"}))),
            Err(ApiError::Status {
                page: 2,
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            }),
            Ok(raw(json!({"id": 3, "title": "Never reached"}))),
        ];

        let stats = run(stream::iter(records), &store, &options())
            .await
            .unwrap();
        assert_eq!(stats.fetched, 1);
        assert_eq!(stats.loaded, 1);

        let summary = store.summary().await.unwrap();
        assert_eq!(summary.artifacts, 1);
    }

    #[tokio::test]
    async fn test_run_records_load_run_row() {
        let store = SqliteArtifactStore::open_in_memory().unwrap();
        let records = vec![Ok(raw(json!({"id": 1})))];

        run(stream::iter(records), &store, &options())
            .await
            .unwrap();

        let runs = store.recent_load_runs(5).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].classification, "Coins");
        assert!(runs[0].completed_at.is_some());
        assert_eq!(runs[0].stats.fetched, 1);
        assert_eq!(runs[0].stats.loaded, 1);
    }

    #[test]
    fn test_create_progress_bar_respects_tty() {
        let pb = create_progress_bar(100);
        if std::io::stderr().is_terminal() {
            assert!(!pb.is_hidden());
        } else {
            assert!(pb.is_hidden());
        }
    }
}
