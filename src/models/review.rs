//! Package reviews awaiting moderation.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::common::string_wire_serde;
use super::{Entity, EntityId, Linked, RecordRef, WireStatus};
use crate::loader::Filterable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl WireStatus for ReviewStatus {
    type Wire = &'static str;

    const TABLE: &'static [(Self, &'static str)] = &[
        (ReviewStatus::Pending, "pending"),
        (ReviewStatus::Approved, "approved"),
        (ReviewStatus::Rejected, "rejected"),
    ];

    fn to_wire(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

string_wire_serde!(ReviewStatus, "review status");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub client: Option<Linked<RecordRef>>,
    #[serde(default)]
    pub package: Option<Linked<RecordRef>>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Review {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Filterable for Review {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.comment.as_str()];
        for linked in [&self.client, &self.package].into_iter().flatten() {
            if let Some(r) = linked.populated() {
                fields.extend(r.name.as_deref());
            }
        }
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        ReviewStatus::from_str(wanted).map_or(false, |s| s == self.status)
    }
}

/// Body of `create-review`, sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub package_id: EntityId,
    pub rating: u8,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_is_lowercase_on_wire() {
        let r: Review = serde_json::from_str(
            r#"{"_id":"r1","client":{"_id":"c1","name":"An"},"package":{"_id":"p1","name":"VIP"},
                "rating":5,"comment":"Tuyệt vời","status":"pending"}"#,
        )
        .unwrap();
        assert_eq!(r.status, ReviewStatus::Pending);
        assert_eq!(r.search_fields(), vec!["Tuyệt vời", "An", "VIP"]);
        assert_eq!(
            serde_json::to_value(ReviewStatus::Approved).unwrap(),
            serde_json::json!("approved")
        );
        assert!(serde_json::from_str::<ReviewStatus>("\"Approved\"").is_err());
    }
}
