//! List Loader.
//!
//! One `GET` per load, bearer token attached, results cached in a shared
//! [`Collection`]. Query parameters are passed through unchanged and the
//! server's pagination block is stored verbatim.

mod collection;
pub mod filter;

pub use collection::{Collection, LoadState};
pub use filter::{
    filter_items, view, FilterCriteria, Filterable, ListView, NO_DATA_MESSAGE, NO_MATCH_MESSAGE,
};

use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, ApiRequest, Scope};
use crate::models::{Entity, Pagination};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("invalid sort order: {} (expected asc or desc)", s)),
        }
    }
}

/// Optional list parameters. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_order: Option<SortOrder>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder".to_string(), order.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("status".to_string(), status.to_string()));
        }
        pairs
    }
}

pub struct ListLoader<T> {
    client: ApiClient,
    scope: Scope,
    path: String,
    collection: Collection<T>,
}

impl<T: Entity + DeserializeOwned> ListLoader<T> {
    pub fn new(client: ApiClient, scope: Scope, path: impl Into<String>) -> Self {
        Self {
            client,
            scope,
            path: path.into(),
            collection: Collection::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Shared handle to the cache this loader fills.
    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.collection.pagination()
    }

    /// Fetch the collection. `token` is required for role-scoped endpoints;
    /// without one no request is sent.
    ///
    /// The cache only takes this result if no newer load started meanwhile.
    pub async fn load(&self, token: Option<&str>, query: &ListQuery) -> Result<Vec<T>, ApiError> {
        let mut request = ApiRequest::get(self.scope, self.path.as_str()).query(query.to_pairs());
        if let Scope::Role(_) = self.scope {
            let token = token.ok_or(ApiError::MissingToken)?;
            request = request.bearer(token);
        }

        let seq = self.collection.begin_load();
        debug!(path = %self.path, seq, "Loading collection");

        match self.client.send::<Vec<T>>(request).await {
            Ok(response) => {
                let items = response.data.unwrap_or_default();
                let count = items.len();
                if self
                    .collection
                    .finish_load(seq, Ok((items.clone(), response.pagination)))
                {
                    debug!(path = %self.path, count, "Collection loaded");
                } else {
                    debug!(path = %self.path, seq, "Discarding stale load");
                }
                Ok(items)
            }
            Err(e) => {
                warn!(path = %self.path, error = %e, "Failed to load collection");
                self.collection.finish_load(seq, Err(e.banner_message()));
                Err(e)
            }
        }
    }

    pub fn view(&self, criteria: &FilterCriteria) -> ListView<T>
    where
        T: Filterable,
    {
        view(&self.collection.state(), criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeTransport;
    use crate::api::Method;
    use crate::config::ApiSettings;
    use crate::models::{Package, Review};
    use crate::session::Role;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(fake: &Arc<FakeTransport>) -> ApiClient {
        ApiClient::with_transport(ApiSettings::default(), fake.clone())
    }

    fn package(id: &str, name: &str) -> serde_json::Value {
        json!({"_id": id, "name": name, "price": 300000, "durationInDays": 30,
               "category": "Gym", "status": "Active"})
    }

    #[tokio::test]
    async fn test_load_fills_collection() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Get,
            "/admin/get-all-packages",
            200,
            json!({"success": true, "data": [package("p1", "Gói tháng"), package("p2", "Gói năm")]}),
        );
        let loader: ListLoader<Package> =
            ListLoader::new(client(&fake), Scope::Role(Role::Admin), "/get-all-packages");

        assert_eq!(loader.collection().state(), LoadState::Idle);
        let items = loader.load(Some("tok"), &ListQuery::default()).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(loader.collection().items()[1].name, "Gói năm");
        assert!(fake.calls()[0].query.is_empty());
        assert_eq!(fake.calls()[0].bearer.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_missing_token_sends_nothing() {
        let fake = Arc::new(FakeTransport::new());
        let loader: ListLoader<Package> =
            ListLoader::new(client(&fake), Scope::Role(Role::Admin), "/get-all-packages");
        let err = loader.load(None, &ListQuery::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::MissingToken));
        assert_eq!(fake.call_count(), 0);
        assert_eq!(loader.collection().state(), LoadState::Idle);
    }

    #[tokio::test]
    async fn test_query_and_pagination_pass_through() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Get,
            "/admin/get-all-reviews",
            200,
            json!({"success": true, "data": [],
                   "pagination": {"currentPage": 2, "totalPages": 4, "totalResults": 31}}),
        );
        let loader: ListLoader<Review> =
            ListLoader::new(client(&fake), Scope::Role(Role::Admin), "/get-all-reviews");
        let query = ListQuery {
            sort_order: Some(SortOrder::Desc),
            search: Some("tốt".into()),
            status: Some("pending".into()),
            ..ListQuery::page(2, 10)
        };
        loader.load(Some("tok"), &query).await.unwrap();

        let sent = &fake.calls()[0].query;
        let expected: Vec<(String, String)> = [
            ("page", "2"),
            ("limit", "10"),
            ("sortOrder", "desc"),
            ("search", "tốt"),
            ("status", "pending"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(sent, &expected);
        assert_eq!(
            loader.pagination(),
            Some(Pagination {
                current_page: 2,
                total_pages: 4,
                total_results: 31
            })
        );
        assert_eq!(loader.view(&FilterCriteria::default()), ListView::NoData);
    }

    #[tokio::test]
    async fn test_failure_is_terminal_and_refresh_reenters_loading() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_once(
            Method::Get,
            "/admin/get-all-packages",
            200,
            json!({"success": false, "message": "Không có quyền"}),
        );
        fake.respond(
            Method::Get,
            "/admin/get-all-packages",
            200,
            json!({"success": true, "data": [package("p1", "Gói tháng")]}),
        );
        let loader: ListLoader<Package> =
            ListLoader::new(client(&fake), Scope::Role(Role::Admin), "/get-all-packages");

        assert!(loader.load(Some("tok"), &ListQuery::default()).await.is_err());
        assert_eq!(
            loader.collection().state(),
            LoadState::Failed("Không có quyền".into())
        );

        loader.load(Some("tok"), &ListQuery::default()).await.unwrap();
        assert_eq!(loader.collection().items().len(), 1);
    }

    #[tokio::test]
    async fn test_slow_earlier_load_does_not_overwrite_newer() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_after(
            Method::Get,
            "/admin/get-all-packages",
            Duration::from_millis(80),
            200,
            json!({"success": true, "data": [package("old", "Cũ")]}),
        );
        fake.respond_once(
            Method::Get,
            "/admin/get-all-packages",
            200,
            json!({"success": true, "data": [package("new", "Mới")]}),
        );
        let loader: ListLoader<Package> =
            ListLoader::new(client(&fake), Scope::Role(Role::Admin), "/get-all-packages");

        let query = ListQuery::default();
        let (slow, fast) = tokio::join!(loader.load(Some("tok"), &query), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.load(Some("tok"), &query).await
        });
        assert!(slow.is_ok() && fast.is_ok());

        let ids: Vec<_> = loader
            .collection()
            .items()
            .iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(ids, vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_public_scope_needs_no_token() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Get,
            "/public/packages",
            200,
            json!({"success": true, "data": [package("p1", "Gói tháng")]}),
        );
        let loader: ListLoader<Package> = ListLoader::new(client(&fake), Scope::Public, "/packages");
        loader.load(None, &ListQuery::default()).await.unwrap();
        assert_eq!(fake.calls()[0].bearer, None);
    }
}
