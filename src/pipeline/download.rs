// src/pipeline/download.rs

//! Concurrent chapter download and ordered merge.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;

use crate::error::{ChapterError, Result};
use crate::models::{
    ChapterSelectors, Config, DownloadOutcome, DownloadStatus, NovelRecord, Segment,
    SegmentFailure, SegmentResult,
};
use crate::pipeline::partition;
use crate::services::ChapterFetcher;
use crate::session::{Page, PageSession};
use crate::storage::{self, PartWriter};

/// Drives segment workers over a novel's chapter list.
pub struct DownloadCoordinator {
    session: Arc<dyn PageSession>,
    chapter_selectors: ChapterSelectors,
    output_dir: PathBuf,
    timeout: Duration,
    flush_every: usize,
}

impl DownloadCoordinator {
    pub fn new(session: Arc<dyn PageSession>, config: &Config) -> Self {
        Self {
            session,
            chapter_selectors: config.catalog.chapter.clone(),
            output_dir: config.download.output_dir.clone(),
            timeout: config.download.timeout(),
            flush_every: config.download.flush_every,
        }
    }

    /// Download every chapter of `record` with `concurrency` workers.
    ///
    /// Chapter failures are folded into the returned outcome; nothing here is
    /// fatal to the caller.
    pub async fn download(&self, record: &NovelRecord, concurrency: usize) -> DownloadOutcome {
        let started_at = Utc::now();
        let output_path = self.output_dir.join(record.file_name());

        if record.chapter_links().is_empty() {
            log::warn!("'{}' has no chapter links", record.name());
            discard(&output_path).await;
            return DownloadOutcome {
                status: DownloadStatus::Failure,
                output_path,
                chapters_written: 0,
                first_failure_index: None,
                first_failure_link: None,
                message: Some("the novel has no chapters".to_string()),
                started_at,
                finished_at: Utc::now(),
            };
        }

        let (status, chapters_written, first_failure, message) =
            match self.run(record, concurrency, &output_path).await {
                Ok(results) => summarize(&results, record.chapter_count()),
                Err(e) => {
                    log::error!("Download of '{}' aborted: {}", record.name(), e);
                    (DownloadStatus::Failure, 0, None, format!("download aborted: {e}"))
                }
            };
        if chapters_written == 0 {
            // A file at this path would belong to an earlier run.
            discard(&output_path).await;
        }

        let outcome = DownloadOutcome {
            status,
            output_path,
            chapters_written,
            first_failure_index: first_failure.as_ref().map(|f| f.index + 1),
            first_failure_link: first_failure.map(|f| f.link),
            message: Some(message),
            started_at,
            finished_at: Utc::now(),
        };
        log::info!(
            "{:?}: {} of {} chapters written to {}",
            outcome.status,
            outcome.chapters_written,
            record.chapter_count(),
            outcome.output_path.display()
        );
        outcome
    }

    async fn run(
        &self,
        record: &NovelRecord,
        concurrency: usize,
        output_path: &Path,
    ) -> Result<Vec<SegmentResult>> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let segments = partition(record.chapter_links(), concurrency);
        log::info!(
            "Downloading {} chapters of '{}' with {} worker(s)",
            record.chapter_count(),
            record.name(),
            segments.len()
        );

        let fetcher = Arc::new(ChapterFetcher::new(&self.chapter_selectors, record.name()));
        let parts: Vec<PathBuf> = segments
            .iter()
            .map(|segment| storage::part_path(output_path, segment.start))
            .collect();

        let handles = segments.into_iter().zip(&parts).map(|(segment, part)| {
            let worker = SegmentWorker {
                session: Arc::clone(&self.session),
                fetcher: Arc::clone(&fetcher),
                timeout: self.timeout,
                flush_every: self.flush_every,
                part_path: part.clone(),
            };
            let start = segment.start;
            let first_link = segment.links[0].clone();
            let handle = tokio::spawn(worker.run(segment));
            async move {
                handle.await.unwrap_or_else(|e| {
                    log::error!("Worker for segment at {} stopped: {}", start, e);
                    SegmentResult {
                        start,
                        written: 0,
                        failure: Some(SegmentFailure {
                            index: start,
                            kind: ChapterError::WorkerAborted,
                            link: first_link,
                        }),
                    }
                })
            }
        });

        // Results come back in segment order regardless of completion order.
        let results = join_all(handles).await;

        let (filled, empty): (Vec<_>, Vec<_>) = results
            .iter()
            .zip(parts)
            .partition(|(result, _)| result.written > 0);
        for (_, part) in &empty {
            discard(part).await;
        }
        if !filled.is_empty() {
            let filled: Vec<PathBuf> = filled.into_iter().map(|(_, part)| part).collect();
            if let Err(e) = storage::merge_parts(output_path, &filled).await {
                for part in &filled {
                    discard(part).await;
                }
                return Err(e);
            }
        }

        Ok(results)
    }
}

/// Best-effort removal of a file that must not outlive the run.
async fn discard(path: &Path) {
    if let Err(e) = storage::remove_if_exists(path).await {
        log::warn!("Could not remove {}: {}", path.display(), e);
    }
}

/// One worker: fetches its segment in order and stops at the first failure.
struct SegmentWorker {
    session: Arc<dyn PageSession>,
    fetcher: Arc<ChapterFetcher>,
    timeout: Duration,
    flush_every: usize,
    part_path: PathBuf,
}

impl SegmentWorker {
    /// Never fails as a whole: write errors become the segment's failure.
    async fn run(self, segment: Segment) -> SegmentResult {
        let mut writer = match PartWriter::create(&self.part_path, self.flush_every).await {
            Ok(writer) => writer,
            Err(e) => {
                log::error!("Could not create {}: {}", self.part_path.display(), e);
                return write_failure(&segment, 0);
            }
        };

        let failure = match self.session.new_page().await {
            Ok(mut page) => {
                let failure = self.drive(page.as_mut(), &segment, &mut writer).await;
                page.close().await;
                failure
            }
            Err(e) => {
                log::warn!("Could not open a page for segment at {}: {}", segment.start, e);
                Ok(Some(SegmentFailure {
                    index: segment.start,
                    kind: ChapterError::NavigationFailed,
                    link: segment.links[0].clone(),
                }))
            }
        };

        let finished = match failure {
            Ok(failure) => writer.finish().await.map(|written| (written, failure)),
            Err(e) => Err(e),
        };
        let result = match finished {
            Ok((written, failure)) => SegmentResult {
                start: segment.start,
                written,
                failure,
            },
            Err(e) => {
                log::error!("Writing {} failed: {}", self.part_path.display(), e);
                let kept = writer.salvage().await;
                write_failure(&segment, kept)
            }
        };

        log::debug!(
            "Segment {}..{} finished with {} chapter(s)",
            segment.start + 1,
            segment.start + segment.len(),
            result.written
        );
        result
    }

    async fn drive(
        &self,
        page: &mut dyn Page,
        segment: &Segment,
        writer: &mut PartWriter,
    ) -> Result<Option<SegmentFailure>> {
        for (offset, link) in segment.links.iter().enumerate() {
            match self.fetcher.fetch(page, link, self.timeout).await {
                Ok(chapter) => writer.write_chapter(&chapter).await?,
                Err(failure) => {
                    let index = segment.start + offset;
                    log::warn!(
                        "Chapter {} failed ({}): {}; stopping its segment",
                        index + 1,
                        failure.kind,
                        failure.link
                    );
                    return Ok(Some(SegmentFailure {
                        index,
                        kind: failure.kind,
                        link: failure.link,
                    }));
                }
            }
        }
        Ok(None)
    }
}

/// Result for a segment whose part file broke after `kept` durable chapters.
fn write_failure(segment: &Segment, kept: usize) -> SegmentResult {
    let Some(link) = segment.links.get(kept) else {
        return SegmentResult {
            start: segment.start,
            written: kept,
            failure: None,
        };
    };
    SegmentResult {
        start: segment.start,
        written: kept,
        failure: Some(SegmentFailure {
            index: segment.start + kept,
            kind: ChapterError::WriteFailed,
            link: link.clone(),
        }),
    }
}

fn summarize(
    results: &[SegmentResult],
    total: usize,
) -> (DownloadStatus, usize, Option<SegmentFailure>, String) {
    let status = DownloadStatus::from_results(results);
    let written: usize = results.iter().map(|r| r.written).sum();
    let first_failure = results
        .iter()
        .filter_map(|r| r.failure.as_ref())
        .min_by_key(|f| f.index)
        .cloned();

    let message = match (&status, &first_failure) {
        (DownloadStatus::Success, _) | (_, None) => format!("downloaded {written} chapters"),
        (DownloadStatus::PartialFailure, Some(f)) => format!(
            "downloaded {written} of {total} chapters; first failure at chapter {} ({}): {}",
            f.index + 1,
            f.kind,
            f.link
        ),
        (DownloadStatus::Failure, Some(f)) => format!(
            "no chapters downloaded; first failure at chapter {} ({}): {}",
            f.index + 1,
            f.kind,
            f.link
        ),
    };
    (status, written, first_failure, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NovelMetadata;
    use crate::session::HttpSession;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chapter_page(n: usize) -> ResponseTemplate {
        let body = format!(
            r#"<html><body><div class="bookname"><h1>第{n}章</h1></div>
               <div id="content">&nbsp;&nbsp;正文{n}<br/><br/>&nbsp;&nbsp;结尾{n}</div></body></html>"#
        );
        ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html; charset=utf-8")
    }

    /// Serve chapters `1..=total`; the ones in `broken` answer 404.
    async fn catalog(total: usize, broken: &[usize]) -> MockServer {
        let server = MockServer::start().await;
        for n in 1..=total {
            let template = if broken.contains(&n) {
                ResponseTemplate::new(404)
            } else {
                chapter_page(n)
            };
            Mock::given(method("GET"))
                .and(path(format!("/book/1/{n}.html")))
                .respond_with(template)
                .mount(&server)
                .await;
        }
        server
    }

    fn record(server: &MockServer, total: usize) -> NovelRecord {
        let links = (1..=total)
            .map(|n| format!("{}/book/1/{n}.html", server.uri()))
            .collect();
        let metadata = NovelMetadata {
            name: "亏成首富".to_string(),
            author: Some("陈词懒调".to_string()),
            ..Default::default()
        };
        NovelRecord::new(metadata, format!("{}/book/1/", server.uri()), links)
    }

    fn coordinator(output_dir: &Path) -> DownloadCoordinator {
        let mut config = Config::default();
        config.download.output_dir = output_dir.to_path_buf();
        config.download.timeout_secs = 5;
        DownloadCoordinator::new(
            Arc::new(HttpSession::with_client(reqwest::Client::new())),
            &config,
        )
    }

    fn titles(text: &str) -> Vec<String> {
        let separator = format!("\n\n{}\n\n", crate::models::CHAPTER_SEPARATOR);
        text.split(separator.as_str())
            .filter(|block| !block.is_empty())
            .map(|block| block.lines().next().unwrap_or_default().to_string())
            .collect()
    }

    fn leftover_parts(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".part-"))
            .collect()
    }

    #[tokio::test]
    async fn downloads_all_chapters_in_order() {
        let server = catalog(12, &[]).await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 12), 4).await;

        assert_eq!(outcome.status, DownloadStatus::Success);
        assert!(outcome.is_success());
        assert_eq!(outcome.chapters_written, 12);
        assert_eq!(outcome.first_failure_index, None);
        assert_eq!(outcome.output_path, dir.path().join("亏成首富_陈词懒调.txt"));

        let text = std::fs::read_to_string(&outcome.output_path).unwrap();
        assert!(text.starts_with("第1章\n正文1\n结尾1\n\n----------\n\n第2章\n"));
        let expected: Vec<String> = (1..=12).map(|n| format!("第{n}章")).collect();
        assert_eq!(titles(&text), expected);
        assert!(leftover_parts(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn failure_stops_only_its_segment() {
        // Four segments of ten; chapter 21 opens the third one.
        let server = catalog(40, &[21]).await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 40), 4).await;

        assert_eq!(outcome.status, DownloadStatus::PartialFailure);
        assert_eq!(outcome.chapters_written, 30);
        assert_eq!(outcome.first_failure_index, Some(21));
        assert_eq!(
            outcome.first_failure_link,
            Some(format!("{}/book/1/21.html", server.uri()))
        );

        let text = std::fs::read_to_string(&outcome.output_path).unwrap();
        let expected: Vec<String> = (1..=20)
            .chain(31..=40)
            .map(|n| format!("第{n}章"))
            .collect();
        assert_eq!(titles(&text), expected);
        assert!(leftover_parts(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn kth_failure_keeps_preceding_chapters() {
        // One worker; the fourth chapter fails, the rest are never fetched.
        let server = catalog(8, &[4]).await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 8), 1).await;

        assert_eq!(outcome.status, DownloadStatus::PartialFailure);
        assert_eq!(outcome.chapters_written, 3);
        assert_eq!(outcome.first_failure_index, Some(4));

        let text = std::fs::read_to_string(&outcome.output_path).unwrap();
        assert_eq!(titles(&text), vec!["第1章", "第2章", "第3章"]);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 4);
    }

    #[tokio::test]
    async fn reports_earliest_failure_across_segments() {
        let server = catalog(9, &[8, 2]).await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 9), 3).await;

        assert_eq!(outcome.status, DownloadStatus::PartialFailure);
        assert_eq!(outcome.first_failure_index, Some(2));
        // Segment 1..=3 keeps chapter 1, 4..=6 is complete, 7..=9 keeps chapter 7.
        assert_eq!(outcome.chapters_written, 5);
    }

    #[tokio::test]
    async fn every_segment_failing_immediately_is_failure() {
        let server = catalog(6, &[1, 3, 5]).await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 6), 3).await;

        assert_eq!(outcome.status, DownloadStatus::Failure);
        assert_eq!(outcome.chapters_written, 0);
        assert_eq!(outcome.first_failure_index, Some(1));
        assert!(!outcome.output_path.exists());
        assert!(leftover_parts(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn empty_chapter_list_is_failure() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 0), 4).await;

        assert_eq!(outcome.status, DownloadStatus::Failure);
        assert_eq!(outcome.chapters_written, 0);
        assert!(!outcome.output_path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn order_survives_first_segment_finishing_last() {
        let server = MockServer::start().await;
        for n in 1..=8 {
            let template = if n <= 2 {
                chapter_page(n).set_delay(Duration::from_millis(400))
            } else {
                chapter_page(n)
            };
            Mock::given(method("GET"))
                .and(path(format!("/book/1/{n}.html")))
                .respond_with(template)
                .mount(&server)
                .await;
        }
        let dir = tempfile::tempdir().unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 8), 4).await;

        assert_eq!(outcome.status, DownloadStatus::Success);
        let text = std::fs::read_to_string(&outcome.output_path).unwrap();
        let expected: Vec<String> = (1..=8).map(|n| format!("第{n}章")).collect();
        assert_eq!(titles(&text), expected);
    }

    #[tokio::test]
    async fn zero_chapter_run_removes_earlier_output() {
        let server = catalog(4, &[1, 3]).await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("亏成首富_陈词懒调.txt");
        std::fs::write(&output, "earlier run").unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 4), 2).await;

        assert_eq!(outcome.status, DownloadStatus::Failure);
        assert_eq!(outcome.chapters_written, 0);
        assert_eq!(outcome.output_path, output);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn empty_chapter_list_removes_earlier_output() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("亏成首富_陈词懒调.txt");
        std::fs::write(&output, "earlier run").unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 0), 4).await;

        assert_eq!(outcome.status, DownloadStatus::Failure);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn unwritable_part_fails_only_its_segment() {
        let server = catalog(8, &[]).await;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("亏成首富_陈词懒调.txt");
        // The last of four segments starts at chapter 7 and cannot create its part.
        std::fs::create_dir(storage::part_path(&output, 6)).unwrap();

        let outcome = coordinator(dir.path()).download(&record(&server, 8), 4).await;

        assert_eq!(outcome.status, DownloadStatus::PartialFailure);
        assert_eq!(outcome.chapters_written, 6);
        assert_eq!(outcome.first_failure_index, Some(7));
        assert_eq!(
            outcome.first_failure_link,
            Some(format!("{}/book/1/7.html", server.uri()))
        );
        let text = std::fs::read_to_string(&output).unwrap();
        let expected: Vec<String> = (1..=6).map(|n| format!("第{n}章")).collect();
        assert_eq!(titles(&text), expected);
    }

    #[test]
    fn write_failure_points_at_first_unstored_chapter() {
        let segment = Segment {
            start: 10,
            links: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };

        let result = write_failure(&segment, 1);
        assert_eq!(result.written, 1);
        let failure = result.failure.unwrap();
        assert_eq!(failure.index, 11);
        assert_eq!(failure.kind, ChapterError::WriteFailed);
        assert_eq!(failure.link, "b");

        assert_eq!(write_failure(&segment, 3).failure, None);
    }

    #[test]
    fn summary_message_names_first_failure() {
        let results = vec![
            SegmentResult {
                start: 0,
                written: 2,
                failure: None,
            },
            SegmentResult {
                start: 2,
                written: 0,
                failure: Some(SegmentFailure {
                    index: 2,
                    kind: ChapterError::EmptyContent,
                    link: "https://example.com/3.html".to_string(),
                }),
            },
        ];

        let (status, written, failure, message) = summarize(&results, 4);
        assert_eq!(status, DownloadStatus::PartialFailure);
        assert_eq!(written, 2);
        assert_eq!(failure.map(|f| f.index), Some(2));
        assert!(message.contains("chapter 3"));
        assert!(message.contains("https://example.com/3.html"));
    }
}
