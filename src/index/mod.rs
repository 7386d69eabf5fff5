use std::ops::Bound;
use std::path::Path;

use anyhow::{Context, Result};
use tantivy::{
    collector::TopDocs,
    doc,
    query::{AllQuery, BooleanQuery, BoostQuery, Occur, Query, QueryParser, RangeQuery},
    schema::*,
    Index, IndexReader, IndexWriter, ReloadPolicy, Term,
};

use crate::crawl::PaperRecord;

/// Weighted multi-clause query. Clauses present are combined with OR
/// ("should") semantics; with no clause at all the query matches every
/// document unboosted.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub title: Option<String>,
    pub title_weight: f32,
    pub abstract_text: Option<String>,
    pub abstract_weight: f32,
    pub min_year: Option<i64>,
    pub year_weight: f32,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            title: None,
            title_weight: 1.0,
            abstract_text: None,
            abstract_weight: 1.0,
            min_year: None,
            year_weight: 1.0,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub title: Option<String>,
}

/// Tantivy-based search index over crawled paper records.
pub struct PaperIndex {
    index: Index,
    reader: IndexReader,
    writer: IndexWriter,
    // Field handles
    f_id: Field,
    f_title: Field,
    f_abstract: Field,
    f_authors: Field,
    f_year: Field,
}

impl PaperIndex {
    /// Create or open an index at the given directory.
    pub fn create_or_open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path).context("Failed to create index directory")?;

        let mut schema_builder = Schema::builder();
        let f_id = schema_builder.add_text_field("id", STRING | STORED);
        let f_title = schema_builder.add_text_field("title", TEXT | STORED);
        let f_abstract = schema_builder.add_text_field("abstract", TEXT);
        let f_authors = schema_builder.add_text_field("authors", TEXT);
        let f_year = schema_builder.add_i64_field(
            "year",
            NumericOptions::default().set_stored().set_indexed(),
        );
        let schema = schema_builder.build();

        let dir = tantivy::directory::MmapDirectory::open(path)
            .context("Failed to open MmapDirectory")?;
        let index =
            Index::open_or_create(dir, schema).context("Failed to open or create index")?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .context("Failed to create index reader")?;

        let writer = index.writer(50_000_000).context("Failed to create index writer")?;

        Ok(Self {
            index,
            reader,
            writer,
            f_id,
            f_title,
            f_abstract,
            f_authors,
            f_year,
        })
    }

    /// Destructive rebuild: wipe whatever the index currently holds
    /// (a previously absent index is fine) and bulk-insert every record,
    /// keyed by canonical id.
    pub fn rebuild(&mut self, records: &[PaperRecord]) -> Result<()> {
        self.writer
            .delete_all_documents()
            .context("Failed to clear index")?;
        for record in records {
            self.add_record(record)?;
        }
        self.commit()
    }

    fn add_record(&mut self, record: &PaperRecord) -> Result<()> {
        // Keep one document per id even within a single batch.
        self.writer
            .delete_term(Term::from_field_text(self.f_id, &record.id));

        let mut doc = doc!(self.f_id => record.id.as_str());
        if let Some(title) = &record.title {
            doc.add_text(self.f_title, title);
        }
        if let Some(abstract_text) = &record.abstract_text {
            doc.add_text(self.f_abstract, abstract_text);
        }
        if !record.authors.is_empty() {
            doc.add_text(self.f_authors, record.authors.join(", "));
        }
        if let Some(year) = record.date.as_deref().and_then(parse_year) {
            doc.add_i64(self.f_year, year);
        }

        self.writer.add_document(doc).context("Failed to add document")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.writer.commit().context("Failed to commit")?;
        self.reader.reload().context("Failed to reload reader")?;
        Ok(())
    }

    /// Search the index. Returns hits ranked by the boosted should-clauses.
    pub fn query(&self, params: &QueryParams, limit: usize) -> Result<Vec<SearchHit>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if let Some(phrase) = &params.title {
            let parser = QueryParser::for_index(&self.index, vec![self.f_title]);
            let parsed = parser.parse_query(phrase).context("Failed to parse title clause")?;
            clauses.push((
                Occur::Should,
                Box::new(BoostQuery::new(parsed, params.title_weight)),
            ));
        }
        if let Some(phrase) = &params.abstract_text {
            let parser = QueryParser::for_index(&self.index, vec![self.f_abstract]);
            let parsed = parser
                .parse_query(phrase)
                .context("Failed to parse abstract clause")?;
            clauses.push((
                Occur::Should,
                Box::new(BoostQuery::new(parsed, params.abstract_weight)),
            ));
        }
        if let Some(min_year) = params.min_year {
            let range = RangeQuery::new(
                Bound::Included(Term::from_field_i64(self.f_year, min_year)),
                Bound::Unbounded,
            );
            clauses.push((
                Occur::Should,
                Box::new(BoostQuery::new(Box::new(range), params.year_weight)),
            ));
        }

        let query: Box<dyn Query> = if clauses.is_empty() {
            Box::new(AllQuery)
        } else {
            Box::new(BooleanQuery::new(clauses))
        };

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .context("Search failed")?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(doc_address)
                .context("Failed to retrieve document")?;
            let Some(id) = doc.get_first(self.f_id).and_then(|v| v.as_str()) else {
                continue;
            };
            hits.push(SearchHit {
                id: id.to_string(),
                score,
                title: doc
                    .get_first(self.f_title)
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            });
        }
        Ok(hits)
    }

    /// Total number of indexed documents.
    pub fn count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Publication year from the record's raw date string ("2018" or
/// "2018-02-01" forms).
fn parse_year(date: &str) -> Option<i64> {
    let digits: String = date.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, title: &str, abstract_text: &str, date: &str) -> PaperRecord {
        PaperRecord {
            kind: "paper".to_string(),
            id: id.to_string(),
            title: Some(title.to_string()),
            authors: vec!["A. Author".to_string()],
            date: Some(date.to_string()),
            abstract_text: Some(abstract_text.to_string()),
            references: Vec::new(),
        }
    }

    fn sample() -> Vec<PaperRecord> {
        vec![
            record(
                "Ricci/r1",
                "The Comparison Geometry of Ricci Curvature",
                "A survey of comparison theorems.",
                "1998-01-01",
            ),
            record(
                "Loss/l1",
                "Optimizing Deep Networks",
                "We study the curvature of the loss landscape.",
                "2015",
            ),
        ]
    }

    #[test]
    fn rebuild_twice_keeps_one_document_per_id() {
        let tmp = TempDir::new().unwrap();
        let mut index = PaperIndex::create_or_open(tmp.path()).unwrap();

        index.rebuild(&sample()).unwrap();
        index.rebuild(&sample()).unwrap();

        assert_eq!(index.count(), 2);
    }

    #[test]
    fn no_clause_matches_everything() {
        let tmp = TempDir::new().unwrap();
        let mut index = PaperIndex::create_or_open(tmp.path()).unwrap();
        index.rebuild(&sample()).unwrap();

        let hits = index.query(&QueryParams::default(), 10).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn title_weight_dominates_ranking() {
        let tmp = TempDir::new().unwrap();
        let mut index = PaperIndex::create_or_open(tmp.path()).unwrap();
        index.rebuild(&sample()).unwrap();

        let params = QueryParams {
            title: Some("curvature".to_string()),
            title_weight: 50.0,
            abstract_text: Some("curvature".to_string()),
            abstract_weight: 1.0,
            ..QueryParams::default()
        };
        let hits = index.query(&params, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "Ricci/r1");
    }

    #[test]
    fn min_year_clause_selects_recent_papers() {
        let tmp = TempDir::new().unwrap();
        let mut index = PaperIndex::create_or_open(tmp.path()).unwrap();
        index.rebuild(&sample()).unwrap();

        let params = QueryParams {
            min_year: Some(2000),
            ..QueryParams::default()
        };
        let hits = index.query(&params, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "Loss/l1");
    }

    #[test]
    fn parses_year_prefixes() {
        assert_eq!(parse_year("2018-02-01"), Some(2018));
        assert_eq!(parse_year("2018"), Some(2018));
        assert_eq!(parse_year("Feb 2018"), None);
    }
}
