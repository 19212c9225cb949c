//! Rooms and the facilities inside them.

use std::sync::Arc;

use super::{Labelled, Resource};
use crate::api::endpoints::{FACILITIES, ROOMS};
use crate::api::validation;
use crate::confirm::{Decider, GateError, GateOutcome};
use crate::models::{
    EntityId, Facility, FacilityDraft, FacilityStatus, Linked, RecordRef, Room, RoomDraft,
    RoomStatus,
};
use crate::mutation::MutationError;
use crate::session::SessionGuard;

impl Labelled for Room {
    const NOUN: &'static str = "phòng tập";

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Labelled for Facility {
    const NOUN: &'static str = "thiết bị";

    fn label(&self) -> String {
        self.name.clone()
    }
}

pub fn rooms(session: Arc<SessionGuard>) -> Resource<Room> {
    Resource::new(session, ROOMS)
}

pub fn facilities(session: Arc<SessionGuard>) -> Resource<Facility> {
    Resource::new(session, FACILITIES)
}

impl Resource<Room> {
    pub async fn create_room(&self, draft: &RoomDraft) -> Result<Option<Room>, MutationError> {
        validation::validate_room_draft(draft)?;
        let token = self.token()?;
        let request = self.controller().post(&token, ROOMS.create()).json(draft)?;
        self.observe(self.controller().create(request).await)
    }

    pub async fn update_room(&self, id: &EntityId, draft: &RoomDraft) -> Result<Room, MutationError> {
        validation::validate_room_draft(draft)?;
        let token = self.token()?;
        let request = self.controller().post(&token, ROOMS.update(id)).json(draft)?;
        self.observe(
            self.controller()
                .commit(id, request, |room| {
                    room.name = draft.name.trim().to_string();
                    room.capacity = draft.capacity;
                    room.location = draft.location.clone();
                    room.description = draft.description.clone();
                    room.status = draft.status;
                })
                .await,
        )
    }

    pub async fn change_room_status(
        &self,
        id: &EntityId,
        target: RoomStatus,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Room>, GateError> {
        self.change_status(id, target, decider, |room| room.status = target)
            .await
    }
}

impl Resource<Facility> {
    pub async fn create_facility(
        &self,
        draft: &FacilityDraft,
    ) -> Result<Option<Facility>, MutationError> {
        validation::validate_facility_draft(draft)?;
        let token = self.token()?;
        let request = self
            .controller()
            .post(&token, FACILITIES.create())
            .json(draft)?;
        self.observe(self.controller().create(request).await)
    }

    pub async fn update_facility(
        &self,
        id: &EntityId,
        draft: &FacilityDraft,
    ) -> Result<Facility, MutationError> {
        validation::validate_facility_draft(draft)?;
        let token = self.token()?;
        let request = self
            .controller()
            .post(&token, FACILITIES.update(id))
            .json(draft)?;
        self.observe(
            self.controller()
                .commit(id, request, |facility| {
                    facility.name = draft.name.trim().to_string();
                    facility.quantity = draft.quantity;
                    facility.description = draft.description.clone();
                    facility.status = draft.status;
                    let same_room = matches!(
                        (&facility.room, &draft.room_id),
                        (Some(current), Some(wanted)) if linked_id(current) == wanted
                    );
                    if !same_room {
                        facility.room = draft.room_id.clone().map(Linked::Id);
                    }
                })
                .await,
        )
    }

    pub async fn change_facility_status(
        &self,
        id: &EntityId,
        target: FacilityStatus,
        decider: &dyn Decider,
    ) -> Result<GateOutcome<Facility>, GateError> {
        self.change_status(id, target, decider, |facility| facility.status = target)
            .await
    }
}

fn linked_id(linked: &Linked<RecordRef>) -> &EntityId {
    match linked {
        Linked::Populated(record) => &record.id,
        Linked::Id(id) => id,
    }
}

/// Facilities located in `room`, in list order.
pub fn facilities_in<'a>(facilities: &'a [Facility], room: &EntityId) -> Vec<&'a Facility> {
    facilities
        .iter()
        .filter(|f| f.room.as_ref().map_or(false, |r| linked_id(r) == room))
        .collect()
}
