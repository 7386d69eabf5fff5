use scraper::{ElementRef, Html, Selector};

use super::{CrawlError, PaperRecord};

/// Pulls bibliographic metadata and reference links out of a parsed paper
/// page. Selectors target the citation meta tags and the references
/// section of the repository's page markup.
pub struct Extractor {
    title: Selector,
    abstract_text: Selector,
    authors: Selector,
    date: Selector,
    reference_links: Selector,
}

impl Extractor {
    pub fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            title: parse_selector("meta[name='citation_title']")?,
            abstract_text: parse_selector("meta[name='description']")?,
            authors: parse_selector("meta[name='citation_author']")?,
            date: parse_selector("meta[name='citation_publication_date']")?,
            reference_links: parse_selector(
                "#references .citation .result-meta [data-selenium-selector='title-link']",
            )?,
        })
    }

    /// Build the full metadata bundle for a page.
    ///
    /// The bundle is guarded: a page without a title meta tag fails as a
    /// whole and emits no record. Abstract, date, and authors degrade
    /// gracefully, so a truncated static fetch still yields a usable
    /// record. `references` are the already-canonicalized ids for the page.
    pub fn extract_record(
        &self,
        id: &str,
        doc: &Html,
        references: Vec<String>,
    ) -> Result<PaperRecord, CrawlError> {
        let title = meta_content_first(doc, &self.title)
            .ok_or_else(|| CrawlError::Extraction(format!("no title meta tag for {id}")))?;

        Ok(PaperRecord {
            kind: "paper".to_string(),
            id: id.to_string(),
            title: Some(title),
            authors: doc
                .select(&self.authors)
                .filter_map(|el| meta_content(el))
                .collect(),
            date: meta_content_first(doc, &self.date),
            abstract_text: meta_content_first(doc, &self.abstract_text),
            references,
        })
    }

    /// Raw reference hrefs in page order. Attempted independently of the
    /// metadata bundle so a page whose metadata fails to parse still feeds
    /// the traversal.
    pub fn reference_links(&self, doc: &Html) -> Vec<String> {
        doc.select(&self.reference_links)
            .filter_map(|el| el.value().attr("href"))
            .map(str::to_string)
            .collect()
    }
}

fn parse_selector(css: &str) -> Result<Selector, CrawlError> {
    Selector::parse(css).map_err(|e| CrawlError::Extraction(format!("bad selector {css}: {e:?}")))
}

fn meta_content(el: ElementRef<'_>) -> Option<String> {
    el.value()
        .attr("content")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn meta_content_first(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector).next().and_then(meta_content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper_page() -> Html {
        Html::parse_document(
            r#"<html><head>
            <meta name="citation_title" content="Domino Temporal Data Prefetcher">
            <meta name="description" content="A lookahead prefetcher for servers.">
            <meta name="citation_author" content="M. Bakhshalipour">
            <meta name="citation_author" content="P. Lotfi-Kamran">
            <meta name="citation_publication_date" content="2018-02-01">
            </head><body>
            <div id="references">
              <div class="citation"><div class="result-meta">
                <a data-selenium-selector="title-link" href="/paper/First-Ref/aaa111">First</a>
              </div></div>
              <div class="citation"><div class="result-meta">
                <a data-selenium-selector="title-link" href="/paper/Second-Ref/bbb222">Second</a>
              </div></div>
            </div>
            </body></html>"#,
        )
    }

    #[test]
    fn extracts_full_bundle() {
        let extractor = Extractor::new().unwrap();
        let record = extractor
            .extract_record("Domino/123", &paper_page(), vec!["First-Ref/aaa111".into()])
            .unwrap();

        assert_eq!(record.id, "Domino/123");
        assert_eq!(record.title.as_deref(), Some("Domino Temporal Data Prefetcher"));
        assert_eq!(record.authors, vec!["M. Bakhshalipour", "P. Lotfi-Kamran"]);
        assert_eq!(record.date.as_deref(), Some("2018-02-01"));
        assert_eq!(
            record.abstract_text.as_deref(),
            Some("A lookahead prefetcher for servers.")
        );
        assert_eq!(record.references, vec!["First-Ref/aaa111".to_string()]);
    }

    #[test]
    fn missing_title_fails_the_bundle() {
        let extractor = Extractor::new().unwrap();
        let doc = Html::parse_document("<html><head></head><body></body></html>");
        let err = extractor.extract_record("X/1", &doc, Vec::new()).unwrap_err();
        assert!(matches!(err, CrawlError::Extraction(_)));
    }

    #[test]
    fn optional_fields_degrade_gracefully() {
        let extractor = Extractor::new().unwrap();
        let doc = Html::parse_document(
            r#"<html><head><meta name="citation_title" content="Bare"></head></html>"#,
        );
        let record = extractor.extract_record("X/2", &doc, Vec::new()).unwrap();
        assert_eq!(record.title.as_deref(), Some("Bare"));
        assert!(record.authors.is_empty());
        assert!(record.date.is_none());
        assert!(record.abstract_text.is_none());
    }

    #[test]
    fn reference_links_preserve_page_order() {
        let extractor = Extractor::new().unwrap();
        let links = extractor.reference_links(&paper_page());
        assert_eq!(
            links,
            vec!["/paper/First-Ref/aaa111", "/paper/Second-Ref/bbb222"]
        );
    }

    #[test]
    fn reference_links_of_bad_page_are_independent_of_metadata() {
        let extractor = Extractor::new().unwrap();
        let doc = Html::parse_document(
            r#"<html><body><div id="references">
              <div class="citation"><div class="result-meta">
                <a data-selenium-selector="title-link" href="/paper/Only-Ref/ccc333">Only</a>
              </div></div>
            </div></body></html>"#,
        );
        assert!(extractor.extract_record("X/3", &doc, Vec::new()).is_err());
        assert_eq!(extractor.reference_links(&doc), vec!["/paper/Only-Ref/ccc333"]);
    }
}
