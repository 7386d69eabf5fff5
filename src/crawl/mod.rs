pub mod expand;
pub mod extract;
pub mod id;
pub mod scheduler;
pub mod tracker;

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_record_type() -> String {
    "paper".to_string()
}

/// A single crawled paper. Produced once, when extraction for a page
/// succeeds, and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    #[serde(rename = "type", default = "default_record_type")]
    pub kind: String,
    pub id: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub date: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Canonical ids of the references followed from this page, in page order.
    pub references: Vec<String>,
}

// Identity is the canonical id; no other field participates in equality.
impl PartialEq for PaperRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PaperRecord {}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("url has no /paper/ segment: {url}")]
    InvalidUrl { url: String },
    #[error("metadata extraction failed: {0}")]
    Extraction(String),
    #[error("page interaction failed: {0}")]
    Interaction(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("browser session failed: {0}")]
    Browser(String),
}
