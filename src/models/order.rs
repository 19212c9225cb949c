//! Orders and their payment state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::common::string_wire_serde;
use super::{Entity, EntityId, Linked, RecordRef, WireStatus};
use crate::loader::Filterable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl WireStatus for OrderStatus {
    type Wire = &'static str;

    const TABLE: &'static [(Self, &'static str)] = &[
        (OrderStatus::Pending, "Pending"),
        (OrderStatus::Confirmed, "Confirmed"),
        (OrderStatus::Completed, "Completed"),
        (OrderStatus::Cancelled, "Cancelled"),
    ];

    fn to_wire(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

string_wire_serde!(OrderStatus, "order status");

impl OrderStatus {
    /// Completed and cancelled orders accept no further status change.
    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl WireStatus for PaymentStatus {
    type Wire = &'static str;

    const TABLE: &'static [(Self, &'static str)] = &[
        (PaymentStatus::Unpaid, "Unpaid"),
        (PaymentStatus::Paid, "Paid"),
        (PaymentStatus::Refunded, "Refunded"),
    ];

    fn to_wire(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Refunded => "Refunded",
        }
    }
}

string_wire_serde!(PaymentStatus, "payment status");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(default)]
    pub package: Option<Linked<RecordRef>>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub price: f64,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub client: Option<Linked<RecordRef>>,
    pub total_amount: f64,
    #[serde(default)]
    pub order_date: Option<String>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub details: Vec<OrderDetail>,
}

impl Order {
    pub fn client_name(&self) -> Option<&str> {
        self.client
            .as_ref()
            .and_then(Linked::populated)
            .and_then(|c| c.name.as_deref())
    }

    /// Parses `orderDate`, which arrives either as RFC 3339 or as a bare date.
    pub fn order_date_parsed(&self) -> Option<DateTime<Utc>> {
        let raw = self.order_date.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }
}

impl Entity for Order {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Filterable for Order {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.id.as_str()];
        if let Some(client) = self.client.as_ref().and_then(Linked::populated) {
            fields.extend(client.name.as_deref());
            fields.extend(client.email.as_deref());
            fields.extend(client.phone.as_deref());
        }
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        OrderStatus::from_str(wanted).map_or(false, |s| s == self.status)
            || PaymentStatus::from_str(wanted).map_or(false, |s| s == self.payment_status)
    }

    fn category(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }
}
