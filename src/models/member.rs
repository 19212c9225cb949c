//! Gym members (the backend calls them customers) and coaches.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{AccountHolder, AccountStatus, Entity, EntityId};
use crate::loader::Filterable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(alias = "name")]
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    pub status: AccountStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Entity for Member {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl AccountHolder for Member {
    fn account_status(&self) -> AccountStatus {
        self.status
    }

    fn set_account_status(&mut self, status: AccountStatus) {
        self.status = status;
    }
}

impl Filterable for Member {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str()];
        fields.extend(self.email.as_deref());
        fields.extend(self.phone.as_deref());
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        AccountStatus::from_str(wanted).map_or(false, |s| s == self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coach {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(alias = "name")]
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "specialization")]
    pub specialty: Option<String>,
    #[serde(default)]
    pub experience: Option<u32>,
    pub status: AccountStatus,
}

impl Entity for Coach {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl AccountHolder for Coach {
    fn account_status(&self) -> AccountStatus {
        self.status
    }

    fn set_account_status(&mut self, status: AccountStatus) {
        self.status = status;
    }
}

impl Filterable for Coach {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.full_name.as_str()];
        fields.extend(self.email.as_deref());
        fields.extend(self.phone.as_deref());
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        AccountStatus::from_str(wanted).map_or(false, |s| s == self.status)
    }

    fn category(&self) -> Option<&str> {
        self.specialty.as_deref()
    }
}
