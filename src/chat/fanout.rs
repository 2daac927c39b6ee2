//! Delivery of server events to the sessions attached to a room.
//!
//! Everything here runs with the hub lock held, so a room's log and the set
//! of sessions that see it change together. Pushing into an outbox never
//! blocks; sessions whose connection already closed are skipped.

use tracing::{trace, warn};

use super::{
    event::Event,
    hub::ChatState,
    outbox::Outbox,
    role::{Role, RoleId, RoomRef},
};

/// Online roles attached to `room`. Group rooms go through the member list.
fn participants(state: &ChatState, room: RoomRef) -> Vec<&Role> {
    match room {
        RoomRef::Global => state.registry.list_by_room(room).collect(),
        RoomRef::Group(group_id) => state
            .rooms
            .group(group_id)
            .into_iter()
            .flat_map(|group| group.member_ids.iter())
            .filter_map(|id| state.registry.lookup(*id))
            .filter(|role| role.room == room && role.is_online())
            .collect(),
    }
}

/// Sends `event` to everyone in `room` except `skip`. Returns how many sessions took it.
fn fan_out(state: &ChatState, room: RoomRef, skip: RoleId, event: &Event) -> usize {
    let frame = match event.encode() {
        Ok(frame) => frame,
        Err(err) => {
            warn!(?room, "failed to encode event: {err}");
            return 0;
        }
    };

    let mut delivered = 0;
    for role in participants(state, room) {
        if role.id == skip {
            continue;
        }
        let Some(outbox) = role.outbox() else {
            continue;
        };
        if outbox.push(frame.clone()) {
            delivered += 1;
        } else {
            trace!(role = role.id, "skipping detached session");
        }
    }
    delivered
}

pub(crate) fn notify_roster_add(state: &ChatState, room: RoomRef, id: RoleId, name: &str) -> usize {
    fan_out(state, room, id, &Event::roster_add(id, name))
}

pub(crate) fn notify_roster_remove(state: &ChatState, room: RoomRef, id: RoleId) -> usize {
    fan_out(state, room, id, &Event::RosterRemoved(id))
}

pub(crate) fn send_roster_snapshot(state: &ChatState, outbox: &Outbox, room: RoomRef) -> bool {
    let roles = participants(state, room)
        .into_iter()
        .map(|role| (role.id, role.name.clone()))
        .collect();
    outbox.send(&Event::Roster(roles))
}

pub(crate) fn send_history(state: &ChatState, outbox: &Outbox, room: RoomRef) -> bool {
    let log = state.rooms.log(room).unwrap_or_default();
    outbox.send(&Event::Messages(log.to_vec()))
}

/// The sender gets no echo; clients render their own outgoing text.
pub(crate) fn broadcast_message(state: &ChatState, room: RoomRef, sender: RoleId, rendered: &str) -> usize {
    fan_out(state, room, sender, &Event::Messages(vec![rendered.to_owned()]))
}
