pub mod http;
pub mod seed;

use crate::domain::supplement::SupplementCandidate;

pub use http::HttpJsonCatalog;
pub use seed::StaticCatalog;

/// Read-only source of supplement candidates with current prices.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    async fn list_candidates(&self) -> anyhow::Result<Vec<SupplementCandidate>>;
}
