//! Orders: status and payment changes, both confirm-then-commit.

use serde_json::json;
use std::sync::Arc;

use super::{Labelled, Resource};
use crate::api::endpoints::ORDERS;
use crate::confirm::{ConfirmPrompt, Decider, GateError, GateOutcome};
use crate::models::{EntityId, Order, OrderStatus, PaymentStatus};
use crate::mutation::MutationError;
use crate::session::SessionGuard;

impl Labelled for Order {
    const NOUN: &'static str = "đơn hàng";

    fn label(&self) -> String {
        match self.client_name() {
            Some(name) => format!("#{} ({})", self.id, name),
            None => format!("#{}", self.id),
        }
    }
}

pub fn orders(session: Arc<SessionGuard>) -> Resource<Order> {
    Resource::new(session, ORDERS)
}

impl Resource<Order> {
    /// Completed and cancelled orders are refused before the prompt.
    pub async fn change_order_status(
        &self,
        id: &EntityId,
        target: OrderStatus,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Order>, GateError> {
        match self.find(id) {
            Ok(order) if order.status.is_final() => {
                return Ok(GateOutcome::Failed(MutationError::Final {
                    id: id.clone(),
                    status: order.status.to_string(),
                }))
            }
            Ok(_) => {}
            Err(e) => return Ok(GateOutcome::Failed(e)),
        }
        self.change_status(id, target, decider, |order| order.status = target)
            .await
    }

    pub async fn change_payment_status(
        &self,
        id: &EntityId,
        target: PaymentStatus,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Order>, GateError> {
        let order = match self.find(id) {
            Ok(order) => order,
            Err(e) => return Ok(GateOutcome::Failed(e)),
        };
        let prompt = ConfirmPrompt::new(
            format!("Chuyển thanh toán sang \"{}\"", target),
            order.label(),
        );
        self.confirmed(prompt, decider, move || async move {
            let token = self.token()?;
            let request = self
                .controller()
                .post(&token, ORDERS.action("change-payment-status", id))
                .json(&json!({ "paymentStatus": target }))?;
            self.controller()
                .commit(id, request, |order| order.payment_status = target)
                .await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeTransport;
    use crate::api::{ApiClient, Method};
    use crate::config::ApiSettings;
    use crate::confirm::{FixedDecision, UserDecision};
    use crate::loader::{FilterCriteria, ListQuery, ListView};
    use crate::session::Role;
    use crate::storage::{KeyValueStore, MemoryStore};

    async fn loaded(fake: &Arc<FakeTransport>) -> Resource<Order> {
        fake.respond(
            Method::Get,
            "/admin/get-all-orders",
            200,
            json!({"success": true, "data": [
                {"_id": "o1", "client": {"_id": "c1", "fullName": "Lan"}, "totalAmount": 300000,
                 "orderDate": "2024-05-01T08:00:00Z", "status": "Pending", "paymentStatus": "Unpaid",
                 "paymentMethod": "Cash"},
                {"_id": "o2", "client": "c2", "totalAmount": 500000, "status": "Completed",
                 "paymentStatus": "Paid", "paymentMethod": "Transfer"}
            ]}),
        );
        let store = Arc::new(MemoryStore::new());
        store.set("tokenAdmin", "tok").unwrap();
        let client = ApiClient::with_transport(ApiSettings::default(), fake.clone());
        let res = orders(Arc::new(SessionGuard::new(client, store, Role::Admin)));
        res.load(&ListQuery::default()).await.unwrap();
        res
    }

    #[tokio::test]
    async fn test_confirm_order_patches_status() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(Method::Post, "/admin/change-status-order/o1", 200, json!({"success": true}));
        let res = loaded(&fake).await;
        let id = EntityId::from("o1");

        let outcome = res
            .change_order_status(&id, OrderStatus::Confirmed, &FixedDecision(UserDecision::Confirm))
            .await
            .unwrap();
        assert!(matches!(outcome, GateOutcome::Completed(_)));
        assert_eq!(res.find(&id).unwrap().status, OrderStatus::Confirmed);
        assert_eq!(fake.calls()[1].body, Some(json!({"status": "Confirmed"})));
    }

    #[tokio::test]
    async fn test_final_order_is_refused_without_request() {
        let fake = Arc::new(FakeTransport::new());
        let res = loaded(&fake).await;

        let outcome = res
            .change_order_status(
                &EntityId::from("o2"),
                OrderStatus::Pending,
                &FixedDecision(UserDecision::Confirm),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, GateOutcome::Failed(MutationError::Final { .. })));
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_payment_status_uses_its_own_endpoint() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Post,
            "/admin/change-payment-status-order/o1",
            200,
            json!({"success": true}),
        );
        let res = loaded(&fake).await;
        let id = EntityId::from("o1");

        res.change_payment_status(&id, PaymentStatus::Paid, &FixedDecision(UserDecision::Confirm))
            .await
            .unwrap();
        assert_eq!(res.find(&id).unwrap().payment_status, PaymentStatus::Paid);
        assert_eq!(fake.calls()[1].body, Some(json!({"paymentStatus": "Paid"})));
    }

    #[tokio::test]
    async fn test_filter_by_either_status_and_method() {
        let fake = Arc::new(FakeTransport::new());
        let res = loaded(&fake).await;

        match res.view(&FilterCriteria::default().with_status("paid")) {
            ListView::Rows(rows) => assert_eq!(rows[0].id.as_str(), "o2"),
            other => panic!("unexpected view {:?}", other),
        }
        match res.view(&FilterCriteria::search("lan").with_category("cash")) {
            ListView::Rows(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].label(), "#o1 (Lan)");
            }
            other => panic!("unexpected view {:?}", other),
        }
    }
}
