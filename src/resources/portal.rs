//! Client self-service: the signed-in client's own orders.

use std::sync::Arc;

use super::Resource;
use crate::api::endpoints::{self, ORDERS};
use crate::models::{Order, OrderStatus, PaymentStatus};
use crate::session::SessionGuard;

/// Orders placed by the signed-in client. Read-only from this side.
pub fn my_orders(session: Arc<SessionGuard>) -> Resource<Order> {
    Resource::with_list_path(session, ORDERS, endpoints::MY_ORDERS)
}

/// Sum still owed across unpaid, non-cancelled orders.
pub fn outstanding_balance(orders: &[Order]) -> f64 {
    orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Unpaid)
        .filter(|o| o.status != OrderStatus::Cancelled)
        .map(|o| o.total_amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeTransport;
    use crate::api::{ApiClient, Method};
    use crate::config::ApiSettings;
    use crate::loader::ListQuery;
    use crate::session::Role;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;

    #[tokio::test]
    async fn test_my_orders_uses_client_namespace() {
        let fake = Arc::new(FakeTransport::new());
        fake.respond(
            Method::Get,
            "/client/get-my-orders",
            200,
            json!({"success": true, "data": [
                {"_id": "o1", "totalAmount": 300000, "status": "Pending", "paymentStatus": "Unpaid"},
                {"_id": "o2", "totalAmount": 100000, "status": "Cancelled", "paymentStatus": "Unpaid"},
                {"_id": "o3", "totalAmount": 900000, "status": "Completed", "paymentStatus": "Paid"}
            ]}),
        );
        let store = Arc::new(MemoryStore::new());
        store.set("tokenClient", "client-tok").unwrap();
        store.set("tokenAdmin", "admin-tok").unwrap();
        let client = ApiClient::with_transport(ApiSettings::default(), fake.clone());
        let orders = my_orders(Arc::new(SessionGuard::new(client, store, Role::Client)));

        let loaded = orders.load(&ListQuery::default()).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(fake.calls()[0].bearer.as_deref(), Some("client-tok"));
        assert_eq!(outstanding_balance(&loaded), 300000.0);
    }

    #[tokio::test]
    async fn test_my_orders_without_client_token() {
        let fake = Arc::new(FakeTransport::new());
        let store = Arc::new(MemoryStore::new());
        store.set("tokenAdmin", "admin-tok").unwrap();
        let client = ApiClient::with_transport(ApiSettings::default(), fake.clone());
        let orders = my_orders(Arc::new(SessionGuard::new(client, store, Role::Client)));

        let err = orders.load(&ListQuery::default()).await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(fake.call_count(), 0);
    }
}
