//! Membership packages.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::common::string_wire_serde;
use super::{Entity, EntityId, WireStatus};
use crate::loader::Filterable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStatus {
    Active,
    Inactive,
}

impl WireStatus for PackageStatus {
    type Wire = &'static str;

    const TABLE: &'static [(Self, &'static str)] = &[
        (PackageStatus::Active, "Active"),
        (PackageStatus::Inactive, "Inactive"),
    ];

    fn to_wire(self) -> &'static str {
        match self {
            PackageStatus::Active => "Active",
            PackageStatus::Inactive => "Inactive",
        }
    }
}

string_wire_serde!(PackageStatus, "package status");

impl PackageStatus {
    /// The client, not the server, decides the inverse before sending it.
    pub fn inverted(self) -> Self {
        match self {
            PackageStatus::Active => PackageStatus::Inactive,
            PackageStatus::Inactive => PackageStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    pub price: f64,
    pub duration_in_days: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: PackageStatus,
}

impl Entity for Package {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Filterable for Package {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        PackageStatus::from_str(wanted).map_or(false, |s| s == self.status)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }
}

/// Body of `create-package` / `update-package`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDraft {
    pub name: String,
    pub price: f64,
    pub duration_in_days: u32,
    pub category: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: PackageStatus,
}

impl From<&Package> for PackageDraft {
    fn from(p: &Package) -> Self {
        Self {
            name: p.name.clone(),
            price: p.price,
            duration_in_days: p.duration_in_days,
            category: p.category.clone(),
            features: p.features.clone(),
            description: p.description.clone(),
            status: p.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(serde_json::to_string(&PackageStatus::Active).unwrap(), "\"Active\"");
        let s: PackageStatus = serde_json::from_str("\"Inactive\"").unwrap();
        assert_eq!(s, PackageStatus::Inactive);
        assert!(serde_json::from_str::<PackageStatus>("\"active\"").is_err());
        assert_eq!("active".parse::<PackageStatus>().unwrap(), PackageStatus::Active);
    }

    #[test]
    fn test_inverted_is_involution() {
        for (status, _) in PackageStatus::TABLE {
            assert_ne!(status.inverted(), *status);
            assert_eq!(status.inverted().inverted(), *status);
        }
    }

    #[test]
    fn test_package_camel_case_fields() {
        let p: Package = serde_json::from_str(
            r#"{"_id":"p1","name":"Gói 3 tháng","price":1500000,"durationInDays":90,
                "category":"Gym","features":["Locker"],"status":"Active"}"#,
        )
        .unwrap();
        assert_eq!(p.duration_in_days, 90);
        assert_eq!(p.category(), Some("Gym"));

        let draft = PackageDraft::from(&p);
        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["durationInDays"], 90);
        assert!(body.get("description").is_none());
    }
}
