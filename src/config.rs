use std::time::Duration;

pub const DEFAULT_BUDGET: usize = 2000;
pub const DEFAULT_FANOUT: usize = 5;

/// Settings for a single crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of distinct ids visited in one run.
    pub budget: usize,
    /// Maximum number of references followed from any single page.
    pub fanout: usize,
    /// Use the rendered (script-executing) fetch strategy instead of the
    /// raw static fetch.
    pub rendered: bool,
    /// Per-request fetch timeout.
    pub fetch_timeout: Duration,
    /// Total time allowed for retrying transient fetch failures on one URL.
    pub retry_max_elapsed: Duration,
    /// Base URL that discovered canonical ids are resolved against when
    /// they re-enter the frontier.
    pub base_url: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            fanout: DEFAULT_FANOUT,
            rendered: false,
            fetch_timeout: Duration::from_secs(30),
            retry_max_elapsed: Duration::from_secs(60),
            base_url: "https://www.semanticscholar.org".to_string(),
        }
    }
}

impl CrawlConfig {
    /// URL of the paper page for a canonical id.
    pub fn paper_url(&self, id: &str) -> String {
        format!("{}/paper/{}", self.base_url.trim_end_matches('/'), id)
    }
}
