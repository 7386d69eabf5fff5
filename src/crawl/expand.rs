use super::id;

/// Canonicalize raw reference links and cap the result at `fanout` entries.
///
/// Links without a canonical id are logged and dropped; they do not count
/// toward the cap, so a page with a few malformed links still contributes
/// its full fanout of valid references. Page order is preserved.
pub fn expand_references(links: &[String], fanout: usize) -> Vec<String> {
    links
        .iter()
        .filter_map(|link| match id::canonicalize(link) {
            Ok(ref_id) => Some(ref_id),
            Err(e) => {
                tracing::warn!(%link, "dropping reference link: {e}");
                None
            }
        })
        .take(fanout)
        .collect()
}
