//! Membership package management.

use serde_json::json;
use std::sync::Arc;

use super::{Labelled, Resource};
use crate::api::endpoints::PACKAGES;
use crate::api::validation;
use crate::models::{EntityId, Package, PackageDraft, PackageStatus};
use crate::mutation::MutationError;
use crate::session::SessionGuard;

impl Labelled for Package {
    const NOUN: &'static str = "gói tập";

    fn label(&self) -> String {
        self.name.clone()
    }
}

pub fn packages(session: Arc<SessionGuard>) -> Resource<Package> {
    Resource::new(session, PACKAGES)
}

impl PackageDraft {
    fn apply_to(&self, package: &mut Package) {
        package.name = self.name.trim().to_string();
        package.price = self.price;
        package.duration_in_days = self.duration_in_days;
        package.category = self.category.trim().to_string();
        package.features = self.features.clone();
        package.description = self.description.clone();
        package.status = self.status;
    }
}

impl Resource<Package> {
    pub async fn create_package(&self, draft: &PackageDraft) -> Result<Option<Package>, MutationError> {
        validation::validate_package_draft(draft)?;
        let token = self.token()?;
        let request = self
            .controller()
            .post(&token, PACKAGES.create())
            .json(draft)?;
        self.observe(self.controller().create(request).await)
    }

    pub async fn update_package(
        &self,
        id: &EntityId,
        draft: &PackageDraft,
    ) -> Result<Package, MutationError> {
        validation::validate_package_draft(draft)?;
        let token = self.token()?;
        let request = self
            .controller()
            .post(&token, PACKAGES.update(id))
            .json(draft)?;
        self.observe(
            self.controller()
                .commit(id, request, |package| draft.apply_to(package))
                .await,
        )
    }

    /// Flip Active/Inactive. The new value is shown at once and put back if
    /// the server refuses.
    pub async fn toggle_status(&self, id: &EntityId) -> Result<Package, MutationError> {
        let target = self.find(id)?.status.inverted();
        let token = self.token()?;
        let request = self
            .controller()
            .post(&token, PACKAGES.change_status(id))
            .json(&json!({ "status": target }))?;
        self.observe(
            self.controller()
                .optimistic(
                    id,
                    request,
                    |package| package.status,
                    |package, status| package.status = status,
                    target,
                )
                .await,
        )
    }
}

/// Distinct categories in list order, for the category filter.
pub fn categories(packages: &[Package]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for package in packages {
        let category = package.category.trim();
        if !category.is_empty() && !seen.iter().any(|c| c.eq_ignore_ascii_case(category)) {
            seen.push(category.to_string());
        }
    }
    seen
}

pub fn active_only(packages: &[Package]) -> Vec<Package> {
    packages
        .iter()
        .filter(|p| p.status == PackageStatus::Active)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeTransport;
    use crate::api::{ApiClient, ErrorCode, Method};
    use crate::config::ApiSettings;
    use crate::confirm::{FixedDecision, GateOutcome, UserDecision};
    use crate::loader::{FilterCriteria, ListQuery, ListView, NO_DATA_MESSAGE, NO_MATCH_MESSAGE};
    use crate::session::Role;
    use crate::storage::{KeyValueStore, MemoryStore};

    fn resource(fake: &Arc<FakeTransport>) -> Resource<Package> {
        let store = Arc::new(MemoryStore::new());
        store.set("tokenAdmin", "tok").unwrap();
        let client = ApiClient::with_transport(ApiSettings::default(), fake.clone());
        packages(Arc::new(SessionGuard::new(client, store, Role::Admin)))
    }

    fn list(fake: &FakeTransport, data: serde_json::Value) {
        fake.respond(
            Method::Get,
            "/admin/get-all-packages",
            200,
            json!({"success": true, "data": data}),
        );
    }

    fn gym_month() -> serde_json::Value {
        json!({"_id": "p1", "name": "Gói 1 tháng", "price": 300000, "durationInDays": 30,
               "category": "Gym", "features": ["Tủ đồ"], "status": "Active"})
    }

    fn draft() -> PackageDraft {
        PackageDraft {
            name: "Gói 3 tháng".into(),
            price: 800000.0,
            duration_in_days: 90,
            category: "Gym".into(),
            features: vec![],
            description: None,
            status: PackageStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_empty_list_then_no_match() {
        let fake = Arc::new(FakeTransport::new());
        list(&fake, json!([]));
        let res = resource(&fake);
        res.load(&ListQuery::default()).await.unwrap();
        let v = res.view(&FilterCriteria::default());
        assert_eq!(v, ListView::NoData);
        assert_eq!(v.message(), Some(NO_DATA_MESSAGE));

        let fake = Arc::new(FakeTransport::new());
        list(&fake, json!([gym_month()]));
        let res = resource(&fake);
        res.load(&ListQuery::default()).await.unwrap();
        let v = res.view(&FilterCriteria::search("yoga"));
        assert_eq!(v.message(), Some(NO_MATCH_MESSAGE));

        let calls = fake.call_count();
        let _ = res.view(&FilterCriteria::search("yoga"));
        assert_eq!(fake.call_count(), calls);
    }

    #[tokio::test]
    async fn test_toggle_reverts_on_server_failure() {
        let fake = Arc::new(FakeTransport::new());
        list(&fake, json!([gym_month()]));
        fake.respond(
            Method::Post,
            "/admin/change-status-package/p1",
            500,
            json!("Internal Server Error"),
        );
        let res = resource(&fake);
        res.load(&ListQuery::default()).await.unwrap();
        let id = EntityId::from("p1");

        let err = res.toggle_status(&id).await.unwrap_err();
        assert_eq!(err.api().unwrap().code(), ErrorCode::ServerError);
        assert_eq!(res.find(&id).unwrap().status, PackageStatus::Active);
        assert_eq!(
            fake.calls()[1].body,
            Some(json!({"status": "Inactive"}))
        );
    }

    #[tokio::test]
    async fn test_toggle_keeps_optimistic_value_on_success() {
        let fake = Arc::new(FakeTransport::new());
        list(&fake, json!([gym_month()]));
        fake.respond(Method::Post, "/admin/change-status-package/p1", 200, json!({"success": true}));
        let res = resource(&fake);
        res.load(&ListQuery::default()).await.unwrap();

        let updated = res.toggle_status(&EntityId::from("p1")).await.unwrap();
        assert_eq!(updated.status, PackageStatus::Inactive);
        assert!(active_only(&res.collection().items()).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_blocks_request() {
        let fake = Arc::new(FakeTransport::new());
        let res = resource(&fake);
        let mut bad = draft();
        bad.price = 0.0;

        let err = res.create_package(&bad).await.unwrap_err();
        assert_eq!(err.api().unwrap().code(), ErrorCode::ValidationError);
        assert!(err.is_client_side());
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_update_patches_locally_without_server_record() {
        let fake = Arc::new(FakeTransport::new());
        list(&fake, json!([gym_month()]));
        fake.respond(Method::Post, "/admin/update-package/p1", 200, json!({"success": true}));
        let res = resource(&fake);
        res.load(&ListQuery::default()).await.unwrap();

        let updated = res.update_package(&EntityId::from("p1"), &draft()).await.unwrap();
        assert_eq!(updated.name, "Gói 3 tháng");
        assert_eq!(updated.duration_in_days, 90);
        let body = fake.calls()[1].body.clone().unwrap();
        assert_eq!(body["durationInDays"], 90);
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let fake = Arc::new(FakeTransport::new());
        list(&fake, json!([gym_month()]));
        fake.respond(Method::Post, "/admin/delete-package/p1", 200, json!({"success": true}));
        let res = resource(&fake);
        res.load(&ListQuery::default()).await.unwrap();
        let id = EntityId::from("p1");

        let cancelled = res.delete(&id, &FixedDecision(UserDecision::Cancel)).await.unwrap();
        assert!(cancelled.is_cancelled());
        assert_eq!(fake.call_count(), 1);

        let done = res.delete(&id, &FixedDecision(UserDecision::Confirm)).await.unwrap();
        assert!(matches!(done, GateOutcome::Completed(_)));
        let deletes: Vec<_> = fake
            .calls()
            .into_iter()
            .filter(|c| c.path == "/admin/delete-package/p1")
            .collect();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].method, Method::Post);
        assert!(res.collection().items().is_empty());
    }

    #[test]
    fn test_categories_dedup_case_insensitive() {
        let a: Package = serde_json::from_value(gym_month()).unwrap();
        let mut b = a.clone();
        b.category = "gym".into();
        let mut c = a.clone();
        c.category = "Yoga".into();
        assert_eq!(categories(&[a, b, c]), vec!["Gym".to_string(), "Yoga".to_string()]);
    }
}
