/// Seam for the external similarity-search add-on.
///
/// The add-on indexes the text the scanner writes to the log cache and
/// answers similarity queries; its internals live outside this codebase.
/// The scanner only tells it when the cache changed.
pub trait SearchIndex: Send + Sync {
    /// Called after a scan pass refreshed the cache.
    fn rebuild(&self);
}

/// Placeholder used when no search add-on is wired up.
#[derive(Debug, Default)]
pub struct DisabledIndex;

impl SearchIndex for DisabledIndex {
    fn rebuild(&self) {
        tracing::debug!("search index rebuild requested, no index configured");
    }
}
