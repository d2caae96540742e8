use crate::{PollError, RawSearchResult};
use async_trait::async_trait;

/// The three remote calls a search goes through.
#[async_trait]
pub trait SearchBackend {
    async fn index_ready(&self) -> Result<bool, PollError>;

    async fn start_search(&self, keywords: &str) -> Result<(), PollError>;

    async fn fetch_result(&self) -> Result<RawSearchResult, PollError>;
}

/// Destination for the rendered HTML; every call replaces what was shown before.
pub trait ContentRegion {
    fn replace(&self, html: &str);
}

impl<R> ContentRegion for std::sync::Arc<R>
where
    R: ContentRegion + ?Sized,
{
    fn replace(&self, html: &str) {
        (**self).replace(html)
    }
}
