use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::{
    fanout,
    outbox::Outbox,
    role::{AttachError, Presence, RegisterError, Registry, RoleId, RoomKind, RoomRef},
    room::{GroupId, Rooms},
};

/// Registry and rooms together; only reachable through [`ChatHub`]'s lock.
#[derive(Debug, Default)]
pub struct ChatState {
    pub(crate) registry: Registry,
    pub(crate) rooms: Rooms,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("no registered role with id {0}")]
    UnknownRole(RoleId),
    #[error("no group with id {0}")]
    UnknownGroup(GroupId),
    #[error("role {0} is already in a room")]
    AlreadyJoined(RoleId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreateGroupError {
    #[error("no registered role with id {0}")]
    UnknownRole(RoleId),
}

/// A role bound to one live connection, as seen by that connection's task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: RoleId,
    pub name: String,
    pub room: RoomRef,
    pub session: Uuid,
}

/// Shared chat state. Every mutation and every fanout happens under one lock,
/// which gives each room a single total order of log appends and deliveries.
#[derive(Debug, Clone, Default)]
pub struct ChatHub {
    state: Arc<Mutex<ChatState>>,
}

impl ChatHub {
    pub fn new() -> ChatHub {
        ChatHub::default()
    }

    pub fn register(&self, id: RoleId, name: &str, kind: Option<RoomKind>) -> Result<(), RegisterError> {
        let mut state = self.state.lock();
        let role = state.registry.register(id, name, kind)?;
        info!(id, name, ?kind, joined_at = role.joined_at.unix_timestamp(), "registered role");
        Ok(())
    }

    pub fn create_group(&self, leader_id: RoleId, name: &str) -> Result<GroupId, CreateGroupError> {
        let mut state = self.state.lock();
        let known = state
            .registry
            .lookup(leader_id)
            .is_some_and(|role| !matches!(role.presence, Presence::Departed));
        if !known {
            return Err(CreateGroupError::UnknownRole(leader_id));
        }

        let id = state.rooms.create_group(name, leader_id);
        info!(group = id, leader = leader_id, name, "created group");
        Ok(id)
    }

    pub fn list_groups(&self) -> Vec<(GroupId, String)> {
        self.state
            .lock()
            .rooms
            .list_groups()
            .map(|(id, name)| (id, name.to_owned()))
            .collect()
    }

    /// Attaches `outbox` to a registered role and enters `room`.
    ///
    /// The joiner receives the roster and the room history, everyone already
    /// in the room receives a roster addition. All of it happens in one
    /// critical section, so the joiner neither misses nor repeats a message
    /// that is posted concurrently.
    pub fn join(&self, id: RoleId, room: RoomRef, outbox: Outbox) -> Result<Member, JoinError> {
        let mut state = self.state.lock();
        let state = &mut *state;

        match state.registry.lookup(id).map(|role| &role.presence) {
            None | Some(Presence::Departed) => return Err(JoinError::UnknownRole(id)),
            Some(Presence::Online(_)) => return Err(JoinError::AlreadyJoined(id)),
            Some(Presence::Pending) => {}
        }
        if let RoomRef::Group(group_id) = room {
            if !state.rooms.join_group(group_id, id) {
                return Err(JoinError::UnknownGroup(group_id));
            }
        }

        let session = outbox.id();
        let (name, kind) = match state.registry.attach(id, room, outbox.clone()) {
            Ok(role) => (role.name.clone(), role.kind),
            Err(AttachError::UnknownId(id)) => return Err(JoinError::UnknownRole(id)),
            Err(AttachError::AlreadyJoined(id)) => return Err(JoinError::AlreadyJoined(id)),
        };

        fanout::send_roster_snapshot(state, &outbox, room);
        fanout::send_history(state, &outbox, room);
        fanout::notify_roster_add(state, room, id, &name);
        info!(id, %name, registered_for = ?kind, ?room, %session, "role joined");

        Ok(Member { id, name, room, session })
    }

    /// Renders and logs a message, then delivers it to the rest of the room.
    /// Returns `None` if `member` is no longer attached.
    pub fn post(&self, member: &Member, body: &str) -> Option<String> {
        let mut state = self.state.lock();
        let attached = state
            .registry
            .lookup(member.id)
            .and_then(|role| role.outbox())
            .is_some_and(|outbox| outbox.id() == member.session);
        if !attached {
            return None;
        }

        let rendered = format!("{} : {}", member.name, body);
        if !state.rooms.append_message(member.room, rendered.clone()) {
            return None;
        }
        fanout::broadcast_message(&state, member.room, member.id, &rendered);
        Some(rendered)
    }

    /// Detaches `member`'s session, drops its group membership and tells the
    /// room. Repeated calls for the same session do nothing and return false.
    pub fn leave(&self, member: &Member) -> bool {
        let mut state = self.state.lock();
        let Some(room) = state.registry.detach(member.id, member.session) else {
            return false;
        };
        if let RoomRef::Group(group_id) = room {
            state.rooms.leave_group(group_id, member.id);
        }
        fanout::notify_roster_remove(&state, room, member.id);
        info!(id = member.id, name = %member.name, ?room, "role left");
        true
    }

    #[cfg(test)]
    pub(crate) fn group_members(&self, group_id: GroupId) -> Option<Vec<RoleId>> {
        self.state
            .lock()
            .rooms
            .group(group_id)
            .map(|group| group.member_ids.clone())
    }

    #[cfg(test)]
    pub(crate) fn history(&self, room: RoomRef) -> Option<Vec<String>> {
        self.state.lock().rooms.log(room).map(<[String]>::to_vec)
    }
}
