//! Rooms and the facilities placed in them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::common::string_wire_serde;
use super::{Entity, EntityId, Linked, RecordRef, WireStatus};
use crate::loader::Filterable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomStatus {
    Available,
    Unavailable,
    Maintenance,
}

impl WireStatus for RoomStatus {
    type Wire = &'static str;

    const TABLE: &'static [(Self, &'static str)] = &[
        (RoomStatus::Available, "available"),
        (RoomStatus::Unavailable, "unavailable"),
        (RoomStatus::Maintenance, "maintenance"),
    ];

    fn to_wire(self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Unavailable => "unavailable",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

string_wire_serde!(RoomStatus, "room status");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacilityStatus {
    Operational,
    Maintenance,
    Broken,
}

impl WireStatus for FacilityStatus {
    type Wire = &'static str;

    const TABLE: &'static [(Self, &'static str)] = &[
        (FacilityStatus::Operational, "Operational"),
        (FacilityStatus::Maintenance, "Maintenance"),
        (FacilityStatus::Broken, "Broken"),
    ];

    fn to_wire(self) -> &'static str {
        match self {
            FacilityStatus::Operational => "Operational",
            FacilityStatus::Maintenance => "Maintenance",
            FacilityStatus::Broken => "Broken",
        }
    }
}

string_wire_serde!(FacilityStatus, "facility status");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(alias = "roomName")]
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: RoomStatus,
}

impl Entity for Room {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Filterable for Room {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.location.as_deref());
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        RoomStatus::from_str(wanted).map_or(false, |s| s == self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    #[serde(alias = "_id")]
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub room: Option<Linked<RecordRef>>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: FacilityStatus,
}

impl Entity for Facility {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Filterable for Facility {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        if let Some(room) = self.room.as_ref().and_then(Linked::populated) {
            fields.extend(room.name.as_deref());
        }
        fields
    }

    fn matches_status(&self, wanted: &str) -> bool {
        FacilityStatus::from_str(wanted).map_or(false, |s| s == self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: FacilityStatus,
}
