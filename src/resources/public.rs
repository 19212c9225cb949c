//! Anonymous package feed for the landing page.

use tracing::debug;

use crate::api::{endpoints, ApiClient, ApiRequest, Scope};
use crate::models::Package;

/// Best-effort: bounded by the soft timeout and empty on any failure, so the
/// page renders either way.
pub async fn featured_packages(client: &ApiClient) -> Vec<Package> {
    let packages = client
        .fetch_or(
            ApiRequest::get(Scope::Public, endpoints::PUBLIC_PACKAGES),
            Vec::new(),
        )
        .await;
    debug!(count = packages.len(), "Public packages loaded");
    packages
}
