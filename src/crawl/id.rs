use super::CrawlError;

/// Path marker that precedes the id segment on every paper page URL.
const PAPER_MARKER: &str = "/paper/";

/// Derive the canonical paper id from a page URL.
///
/// The repository encodes a human-readable slug plus a stable hash after
/// `/paper/`; that whole combination is the deduplication key. Query
/// strings, fragments, and a trailing slash are not part of the id.
pub fn canonicalize(url: &str) -> Result<String, CrawlError> {
    let (_, after) = url
        .split_once(PAPER_MARKER)
        .ok_or_else(|| CrawlError::InvalidUrl {
            url: url.to_string(),
        })?;

    let id = after
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_end_matches('/');

    if id.is_empty() {
        return Err(CrawlError::InvalidUrl {
            url: url.to_string(),
        });
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_slug_and_hash() {
        let url = "https://www.semanticscholar.org/paper/Domino-Temporal-Data-Prefetcher-Bakhshalipour-Lotfi-Kamran/665c0dde22c2f8598869d690d59c9b6d84b07c01";
        assert_eq!(
            canonicalize(url).unwrap(),
            "Domino-Temporal-Data-Prefetcher-Bakhshalipour-Lotfi-Kamran/665c0dde22c2f8598869d690d59c9b6d84b07c01"
        );
    }

    #[test]
    fn deterministic_for_same_url() {
        let url = "https://example.org/paper/Some-Title/abc123";
        assert_eq!(canonicalize(url).unwrap(), canonicalize(url).unwrap());
    }

    #[test]
    fn relative_links_work() {
        assert_eq!(canonicalize("/paper/A-Title/deadbeef").unwrap(), "A-Title/deadbeef");
    }

    #[test]
    fn strips_query_fragment_and_trailing_slash() {
        assert_eq!(
            canonicalize("https://x.org/paper/T/1234/?utm=1#refs").unwrap(),
            "T/1234"
        );
    }

    #[test]
    fn missing_marker_is_invalid() {
        let err = canonicalize("https://example.org/author/Jane-Doe").unwrap_err();
        assert!(matches!(err, CrawlError::InvalidUrl { .. }));
    }

    #[test]
    fn empty_segment_is_invalid() {
        assert!(canonicalize("https://example.org/paper/").is_err());
    }
}
