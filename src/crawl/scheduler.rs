use std::collections::VecDeque;
use std::sync::Arc;

use scraper::Html;

use super::expand::expand_references;
use super::extract::Extractor;
use super::tracker::CrawlSession;
use super::{id, PaperRecord};
use crate::config::CrawlConfig;
use crate::fetch::Fetch;

/// Drives the fetch→extract→emit→expand cycle over a FIFO frontier of
/// pending URLs until the frontier empties or the visit budget runs out.
///
/// Per page: pop the head URL, skip it if its id was already visited,
/// fetch, extract, emit on success, mark the id visited either way, then
/// enqueue up to `fanout` newly discovered references at the tail. FIFO
/// consumption gives breadth-first order layered by discovery.
pub struct Crawler {
    fetcher: Arc<dyn Fetch>,
    extractor: Extractor,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetch>, config: CrawlConfig) -> Result<Self, super::CrawlError> {
        Ok(Self {
            fetcher,
            extractor: Extractor::new()?,
            config,
        })
    }

    /// Run the crawl to completion. Returns the emitted records in
    /// discovery order; no id appears twice. Single-page failures are
    /// logged and skipped, never fatal to the run.
    pub async fn run(&self, seeds: &[String]) -> Vec<PaperRecord> {
        let mut session = CrawlSession::new(self.config.budget);
        let mut frontier: VecDeque<String> = seeds.iter().cloned().collect();
        let mut records = Vec::new();

        while let Some(url) = frontier.pop_front() {
            if session.remaining_budget() == 0 {
                tracing::info!(
                    discarded = frontier.len() + 1,
                    "budget exhausted, discarding remaining frontier"
                );
                break;
            }

            let page_id = match id::canonicalize(&url) {
                Ok(page_id) => page_id,
                Err(e) => {
                    tracing::warn!(%url, "skipping frontier entry: {e}");
                    continue;
                }
            };
            if session.is_visited(&page_id) {
                continue;
            }

            let body = match self.fetcher.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(%url, "fetch failed, skipping page: {e}");
                    continue;
                }
            };

            // The parsed document stays inside this block; nothing borrowed
            // from it crosses an await.
            let (record, ref_ids) = {
                let doc = Html::parse_document(&body);
                let links = self.extractor.reference_links(&doc);
                let ref_ids = expand_references(&links, self.config.fanout);
                let record = self.extractor.extract_record(&page_id, &doc, ref_ids.clone());
                (record, ref_ids)
            };

            session.mark_visited(&page_id);
            match record {
                Ok(record) => {
                    tracing::info!(id = %record.id, "emitting record");
                    records.push(record);
                }
                // Reference expansion below still runs, so the traversal
                // continues past a page whose metadata failed to parse.
                Err(e) => tracing::error!(%url, "no record for page: {e}"),
            }

            for ref_id in ref_ids {
                if session.remaining_budget() == 0 {
                    break;
                }
                if session.is_visited(&ref_id) {
                    continue;
                }
                frontier.push_back(self.config.paper_url(&ref_id));
            }
        }

        records
    }
}
