//! Mutation Controller.
//!
//! Sends one state-changing `POST` and reconciles the cached collection:
//! - [`commit`](MutationController::commit): touch the cache only after the
//!   server agreed, with the returned record or a local patch
//! - [`optimistic`](MutationController::optimistic): patch one field first,
//!   put that field back if the server refuses
//!
//! A record can have at most one mutation in flight; a second one for the
//! same id is refused without a request.

mod patch;

pub use patch::patch_by_id;

use dashmap::DashSet;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::endpoints::ResourcePaths;
use crate::api::{ApiClient, ApiError, ApiRequest, ErrorKind, Scope, ValidationError};
use crate::loader::Collection;
use crate::models::{AccountHolder, AccountStatus, Entity, EntityId, WireStatus};

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("a change to {0} is already in progress")]
    InFlight(EntityId),

    #[error("{0} is not in the loaded list")]
    NotFound(EntityId),

    #[error("{0} is banned and can no longer change status")]
    Banned(EntityId),

    #[error("{id} is {status} and can no longer change status")]
    Final { id: EntityId, status: String },

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ValidationError> for MutationError {
    fn from(err: ValidationError) -> Self {
        MutationError::Api(ApiError::Validation(err))
    }
}

impl MutationError {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            MutationError::Api(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        self.api().map_or(false, ApiError::is_auth)
    }

    /// Refused on the client, before any request.
    pub fn is_client_side(&self) -> bool {
        match self {
            MutationError::Api(e) => {
                e.kind() == ErrorKind::Validation || matches!(e, ApiError::MissingToken)
            }
            _ => true,
        }
    }

    pub fn banner_message(&self) -> String {
        match self {
            MutationError::InFlight(_) => "Thao tác trước đó vẫn đang được xử lý.".to_string(),
            MutationError::NotFound(_) => {
                "Không tìm thấy bản ghi. Vui lòng tải lại danh sách.".to_string()
            }
            MutationError::Banned(_) => {
                "Tài khoản đã bị cấm, không thể thay đổi trạng thái.".to_string()
            }
            MutationError::Final { .. } => {
                "Đơn hàng đã kết thúc, không thể thay đổi trạng thái.".to_string()
            }
            MutationError::Api(e) => e.banner_message(),
        }
    }
}

/// Releases the in-flight claim on drop.
struct Claim {
    set: Arc<DashSet<EntityId>>,
    id: EntityId,
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

pub struct MutationController<T> {
    client: ApiClient,
    scope: Scope,
    paths: ResourcePaths,
    collection: Collection<T>,
    in_flight: Arc<DashSet<EntityId>>,
}

impl<T: Entity + DeserializeOwned> MutationController<T> {
    pub fn new(
        client: ApiClient,
        scope: Scope,
        paths: ResourcePaths,
        collection: Collection<T>,
    ) -> Self {
        Self {
            client,
            scope,
            paths,
            collection,
            in_flight: Arc::new(DashSet::new()),
        }
    }

    pub fn collection(&self) -> &Collection<T> {
        &self.collection
    }

    pub fn paths(&self) -> ResourcePaths {
        self.paths
    }

    pub fn is_in_flight(&self, id: &EntityId) -> bool {
        self.in_flight.contains(id)
    }

    /// Authenticated `POST` under this controller's scope.
    pub fn post(&self, token: &str, path: impl Into<String>) -> ApiRequest {
        ApiRequest::post(self.scope, path).bearer(token)
    }

    fn claim(&self, id: &EntityId) -> Result<Claim, MutationError> {
        if !self.in_flight.insert(id.clone()) {
            debug!(%id, "Mutation refused, another one is in flight");
            return Err(MutationError::InFlight(id.clone()));
        }
        Ok(Claim {
            set: Arc::clone(&self.in_flight),
            id: id.clone(),
        })
    }

    fn current(&self, id: &EntityId) -> Result<T, MutationError> {
        self.collection
            .get(id)
            .ok_or_else(|| MutationError::NotFound(id.clone()))
    }

    /// Server record from a response `data`, if it is one and has the right id.
    fn server_entity(&self, data: Option<Value>, id: Option<&EntityId>) -> Option<T> {
        let value = data?;
        match serde_json::from_value::<T>(value) {
            Ok(entity) if id.map_or(true, |id| entity.id() == id) => Some(entity),
            Ok(entity) => {
                warn!(expected = ?id, got = %entity.id(), "Server returned a different record");
                None
            }
            Err(e) => {
                debug!(error = %e, "Response data is not a full record");
                None
            }
        }
    }

    /// Confirm-then-commit: send `request`, then patch the cache.
    ///
    /// On success the cached record is replaced by the server's copy when one
    /// is returned, otherwise `local` is applied to the record as it is at
    /// that moment, so a refresh that landed meanwhile is kept. On failure
    /// the cache is not touched.
    pub async fn commit(
        &self,
        id: &EntityId,
        request: ApiRequest,
        local: impl FnOnce(&mut T),
    ) -> Result<T, MutationError> {
        let _claim = self.claim(id)?;
        let mut snapshot = self.current(id)?;

        let response = self.client.send::<Value>(request).await?;

        let updated = match self.server_entity(response.data, Some(id)) {
            Some(server) => {
                if !self.collection.replace(server.clone()) {
                    debug!(%id, "Record left the list before the mutation resolved");
                }
                server
            }
            None => {
                let mut local = Some(local);
                let patched = self.collection.patch(id, |item| {
                    if let Some(apply) = local.take() {
                        apply(item)
                    }
                });
                match (patched, local.take()) {
                    (Some(patched), _) => patched,
                    (None, apply) => {
                        debug!(%id, "Record left the list before the mutation resolved");
                        if let Some(apply) = apply {
                            apply(&mut snapshot);
                        }
                        snapshot
                    }
                }
            }
        };
        info!(%id, path = %self.paths.slug, "Mutation committed");
        Ok(updated)
    }

    /// Optimistic-then-reconcile for one field.
    ///
    /// `set` writes `value` into the cached record before the request. If the
    /// request fails, `set` writes back what `get` read beforehand; the rest
    /// of the record is left as it is by then.
    pub async fn optimistic<V>(
        &self,
        id: &EntityId,
        request: ApiRequest,
        get: impl Fn(&T) -> V,
        set: impl Fn(&mut T, V),
        value: V,
    ) -> Result<T, MutationError> {
        let _claim = self.claim(id)?;
        let previous = get(&self.current(id)?);

        let optimistic = self
            .collection
            .patch(id, |item| set(item, value))
            .ok_or_else(|| MutationError::NotFound(id.clone()))?;

        match self.client.send::<Value>(request).await {
            Ok(response) => match self.server_entity(response.data, Some(id)) {
                Some(server) => {
                    self.collection.replace(server.clone());
                    Ok(server)
                }
                None => Ok(self.collection.get(id).unwrap_or(optimistic)),
            },
            Err(e) => {
                warn!(%id, error = %e, "Optimistic update failed, reverting");
                self.collection.patch(id, |item| set(item, previous));
                Err(e.into())
            }
        }
    }

    /// `POST /create-{slug}`. The created record is appended when the server
    /// returns it; `None` means the caller should reload.
    pub async fn create(&self, request: ApiRequest) -> Result<Option<T>, MutationError> {
        let response = self.client.send::<Value>(request).await?;
        let created = self.server_entity(response.data, None);
        if let Some(entity) = &created {
            info!(id = %entity.id(), path = %self.paths.slug, "Record created");
            self.collection.push(entity.clone());
        }
        Ok(created)
    }

    /// `POST /delete-{slug}/:id`, then drop the record from the cache.
    pub async fn delete(&self, token: &str, id: &EntityId) -> Result<T, MutationError> {
        let _claim = self.claim(id)?;
        let current = self.current(id)?;

        self.client
            .send::<Value>(self.post(token, self.paths.delete(id)))
            .await?;

        self.collection.remove(id);
        info!(%id, path = %self.paths.slug, "Record deleted");
        Ok(current)
    }
}

/// The request for moving an account from `current` to `target`.
///
/// `Banned` goes to the no-body ban endpoint; every other target goes to the
/// lock/unlock endpoint with `{ newStatus }`. A banned account gets no
/// request at all.
pub fn account_status_request(
    paths: &ResourcePaths,
    scope: Scope,
    id: &EntityId,
    current: AccountStatus,
    target: AccountStatus,
) -> Result<ApiRequest, MutationError> {
    if current.is_terminal() {
        return Err(MutationError::Banned(id.clone()));
    }
    if target == AccountStatus::Banned {
        return Ok(ApiRequest::post(scope, paths.ban(id)));
    }
    ApiRequest::post(scope, paths.lock_open(id))
        .json(&json!({ "newStatus": target.to_wire() }))
        .map_err(MutationError::from)
}

impl<T: Entity + AccountHolder + DeserializeOwned> MutationController<T> {
    /// Lock, unlock or ban an account. Confirm-then-commit.
    pub async fn change_account_status(
        &self,
        token: &str,
        id: &EntityId,
        target: AccountStatus,
    ) -> Result<T, MutationError> {
        let current = self.current(id)?.account_status();
        let request =
            account_status_request(&self.paths, self.scope, id, current, target)?.bearer(token);
        self.commit(id, request, |item| item.set_account_status(target))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::endpoints::{CUSTOMERS, PACKAGES};
    use crate::api::fake::FakeTransport;
    use crate::api::Method;
    use crate::config::ApiSettings;
    use crate::models::{Member, Package, PackageStatus};
    use crate::session::Role;
    use std::time::Duration;

    const ADMIN: Scope = Scope::Role(Role::Admin);

    fn client(fake: &Arc<FakeTransport>) -> ApiClient {
        ApiClient::with_transport(ApiSettings::default(), fake.clone())
    }

    fn member(id: &str, status: i8) -> Member {
        serde_json::from_value(json!({"_id": id, "fullName": "Hội viên", "status": status}))
            .unwrap()
    }

    fn package(id: &str, status: &str) -> Package {
        serde_json::from_value(json!({"_id": id, "name": "Gói", "price": 100000,
                                      "durationInDays": 30, "status": status}))
        .unwrap()
    }

    fn members(fake: &Arc<FakeTransport>, list: Vec<Member>) -> MutationController<Member> {
        MutationController::new(client(fake), ADMIN, CUSTOMERS, Collection::loaded(list))
    }

    #[test]
    fn test_ban_routes_to_ban_endpoint_without_body() {
        let id = EntityId::from("42");
        let req = account_status_request(
            &CUSTOMERS,
            ADMIN,
            &id,
            AccountStatus::Active,
            AccountStatus::Banned,
        )
        .unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/ban-customer/42");
        assert_eq!(req.body, None);
    }

    #[test]
    fn test_lock_and_unlock_route_to_lock_open_with_new_status() {
        let id = EntityId::from("42");
        for (current, target, wire) in [
            (AccountStatus::Inactive, AccountStatus::Active, 1),
            (AccountStatus::Active, AccountStatus::Inactive, 0),
        ] {
            let req = account_status_request(&CUSTOMERS, ADMIN, &id, current, target).unwrap();
            assert_eq!(req.path, "/lock-open-customer/42");
            assert_eq!(req.body, Some(json!({ "newStatus": wire })));
        }
    }

    #[tokio::test]
    async fn test_banned_account_is_refused_before_any_request() {
        let fake = Arc::new(FakeTransport::new());
        let ctl = members(&fake, vec![member("9", -1)]);
        let id = EntityId::from("9");

        for target in [AccountStatus::Active, AccountStatus::Inactive, AccountStatus::Banned] {
            let err = ctl.change_account_status("tok", &id, target).await.unwrap_err();
            assert!(matches!(err, MutationError::Banned(_)));
            assert!(err.is_client_side());
        }
        assert_eq!(fake.call_count(), 0);
        assert_eq!(ctl.collection().get(&id).unwrap().status, AccountStatus::Banned);
    }

    #[tokio::test]
    async fn test_unlock_success_patches_cached_status() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, "/admin/lock-open-customer/42", 200, json!({"success": true}));
        let ctl = members(&fake, vec![member("41", 1), member("42", 0)]);
        let id = EntityId::from("42");

        let updated = ctl
            .change_account_status("tok", &id, AccountStatus::Active)
            .await
            .unwrap();
        assert_eq!(updated.status, AccountStatus::Active);
        assert_eq!(ctl.collection().get(&id).unwrap().status, AccountStatus::Active);
        assert_eq!(
            ctl.collection().get(&EntityId::from("41")).unwrap().status,
            AccountStatus::Active
        );

        let call = &fake.calls()[0];
        assert_eq!(call.body, Some(json!({"newStatus": 1})));
        assert_eq!(call.bearer.as_deref(), Some("tok"));
        assert!(!ctl.is_in_flight(&id));
    }

    #[tokio::test]
    async fn test_commit_keeps_fields_from_refresh_during_request() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_after(
            Method::Post,
            "/admin/lock-open-customer/42",
            Duration::from_millis(50),
            200,
            json!({"success": true}),
        );
        let old: Member =
            serde_json::from_value(json!({"_id": "42", "fullName": "Old", "status": 0})).unwrap();
        let ctl = members(&fake, vec![old]);
        let id = EntityId::from("42");

        let refresh = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let renamed: Member =
                serde_json::from_value(json!({"_id": "42", "fullName": "Renamed", "status": 0}))
                    .unwrap();
            let seq = ctl.collection().begin_load();
            assert!(ctl.collection().finish_load(seq, Ok((vec![renamed], None))));
        };
        let (result, _) = tokio::join!(
            ctl.change_account_status("tok", &id, AccountStatus::Active),
            refresh
        );

        let updated = result.unwrap();
        assert_eq!(updated.full_name, "Renamed");
        let cached = ctl.collection().get(&id).unwrap();
        assert_eq!(cached.full_name, "Renamed");
        assert_eq!(cached.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn test_rejected_commit_leaves_cache_untouched() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Post,
            "/admin/lock-open-customer/42",
            200,
            json!({"success": false, "message": "Đã hết quyền truy cập"}),
        );
        let ctl = members(&fake, vec![member("42", 0)]);
        let id = EntityId::from("42");

        let err = ctl
            .change_account_status("tok", &id, AccountStatus::Active)
            .await
            .unwrap_err();
        assert_eq!(err.banner_message(), "Đã hết quyền truy cập");
        assert_eq!(ctl.collection().get(&id).unwrap().status, AccountStatus::Inactive);
    }

    #[tokio::test]
    async fn test_commit_prefers_server_record() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Post,
            "/admin/ban-customer/42",
            200,
            json!({"success": true, "data": {"_id": "42", "fullName": "Tên mới", "status": -1}}),
        );
        let ctl = members(&fake, vec![member("42", 1)]);
        let updated = ctl
            .change_account_status("tok", &EntityId::from("42"), AccountStatus::Banned)
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Tên mới");
        assert_eq!(ctl.collection().items()[0].full_name, "Tên mới");
        assert_eq!(fake.calls()[0].body, None);
    }

    #[tokio::test]
    async fn test_optimistic_toggle_reverts_field_on_failure() {
        let fake = Arc::new(FakeTransport::new());
        fake.fail_network(Method::Post, "/admin/change-status-package/p1");
        let ctl = MutationController::new(
            client(&fake),
            ADMIN,
            PACKAGES,
            Collection::loaded(vec![package("p1", "Active")]),
        );
        let id = EntityId::from("p1");
        let request = ctl
            .post("tok", PACKAGES.change_status(&id))
            .json(&json!({"status": "Inactive"}))
            .unwrap();

        let err = ctl
            .optimistic(
                &id,
                request,
                |p: &Package| p.status,
                |p, s| p.status = s,
                PackageStatus::Inactive,
            )
            .await
            .unwrap_err();
        assert_eq!(err.api().unwrap().kind(), ErrorKind::Network);
        assert_eq!(ctl.collection().get(&id).unwrap().status, PackageStatus::Active);
    }

    #[tokio::test]
    async fn test_optimistic_value_visible_while_in_flight() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_after(
            Method::Post,
            "/admin/change-status-package/p1",
            Duration::from_millis(30),
            200,
            json!({"success": true}),
        );
        let collection = Collection::loaded(vec![package("p1", "Active")]);
        let observed = collection.clone();
        let ctl = MutationController::new(client(&fake), ADMIN, PACKAGES, collection);
        let id = EntityId::from("p1");

        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_in_hook = seen.clone();
        let probe = EntityId::from("p1");
        fake.on_request(move |_| {
            *seen_in_hook.lock() = observed.get(&probe).map(|p| p.status);
        });

        let updated = ctl
            .optimistic(
                &id,
                ctl.post("tok", PACKAGES.change_status(&id)),
                |p: &Package| p.status,
                |p, s| p.status = s,
                PackageStatus::Inactive,
            )
            .await
            .unwrap();
        assert_eq!(*seen.lock(), Some(PackageStatus::Inactive));
        assert_eq!(updated.status, PackageStatus::Inactive);
    }

    #[tokio::test]
    async fn test_second_mutation_for_same_id_is_refused() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond_after(
            Method::Post,
            "/admin/lock-open-customer/42",
            Duration::from_millis(50),
            200,
            json!({"success": true}),
        );
        let ctl = members(&fake, vec![member("42", 0)]);
        let id = EntityId::from("42");

        let (first, second) = tokio::join!(
            ctl.change_account_status("tok", &id, AccountStatus::Active),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                ctl.change_account_status("tok", &id, AccountStatus::Banned).await
            }
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(MutationError::InFlight(_))));
        assert_eq!(fake.call_count(), 1);
        assert!(!ctl.is_in_flight(&id));
    }

    #[tokio::test]
    async fn test_delete_and_create() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, "/admin/delete-package/p1", 200, json!({"success": true}));
        fake.respond(
            Method::Post,
            "/admin/create-package",
            200,
            json!({"success": true, "data": {"_id": "p9", "name": "Gói mới", "price": 1,
                   "durationInDays": 7, "status": "Active"}}),
        );
        let ctl = MutationController::new(
            client(&fake),
            ADMIN,
            PACKAGES,
            Collection::loaded(vec![package("p1", "Active"), package("p2", "Inactive")]),
        );

        let removed = ctl.delete("tok", &EntityId::from("p1")).await.unwrap();
        assert_eq!(removed.id.as_str(), "p1");
        assert_eq!(fake.calls()[0].method, Method::Post);

        let created = ctl
            .create(ctl.post("tok", PACKAGES.create()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.name, "Gói mới");
        let ids: Vec<_> = ctl.collection().items().iter().map(|p| p.id.to_string()).collect();
        assert_eq!(ids, vec!["p2".to_string(), "p9".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_id_sends_nothing() {
        let fake = Arc::new(FakeTransport::new());
        let ctl = members(&fake, vec![member("1", 1)]);
        let err = ctl
            .change_account_status("tok", &EntityId::from("404"), AccountStatus::Inactive)
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::NotFound(_)));
        assert_eq!(fake.call_count(), 0);
    }
}
