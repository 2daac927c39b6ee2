use std::collections::BTreeMap;

use super::role::{RoleId, RoomRef};

pub type GroupId = u32;

#[derive(Debug)]
pub struct Group {
    pub id: GroupId,
    /// Creator. Carries no privileges.
    pub leader_id: RoleId,
    pub name: String,
    pub member_ids: Vec<RoleId>,
    pub log: Vec<String>,
}

/// The global room and every group, with their message logs.
#[derive(Debug, Default)]
pub struct Rooms {
    global_log: Vec<String>,
    groups: BTreeMap<GroupId, Group>,
    last_group_id: GroupId,
}

impl Rooms {
    pub fn log(&self, room: RoomRef) -> Option<&[String]> {
        match room {
            RoomRef::Global => Some(&self.global_log),
            RoomRef::Group(id) => self.groups.get(&id).map(|group| group.log.as_slice()),
        }
    }

    /// Returns false if `room` is a group that does not exist.
    pub fn append_message(&mut self, room: RoomRef, rendered: String) -> bool {
        match room {
            RoomRef::Global => self.global_log.push(rendered),
            RoomRef::Group(id) => match self.groups.get_mut(&id) {
                Some(group) => group.log.push(rendered),
                None => return false,
            },
        }
        true
    }

    pub fn create_group(&mut self, name: &str, leader_id: RoleId) -> GroupId {
        self.last_group_id += 1;
        let id = self.last_group_id;
        self.groups.insert(
            id,
            Group {
                id,
                leader_id,
                name: name.to_owned(),
                member_ids: Vec::new(),
                log: Vec::new(),
            },
        );
        id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn list_groups(&self) -> impl Iterator<Item = (GroupId, &str)> {
        self.groups.values().map(|group| (group.id, group.name.as_str()))
    }

    /// Adds `role_id` to the group once; joining twice keeps a single entry.
    pub fn join_group(&mut self, group_id: GroupId, role_id: RoleId) -> bool {
        let Some(group) = self.groups.get_mut(&group_id) else {
            return false;
        };
        if !group.member_ids.contains(&role_id) {
            group.member_ids.push(role_id);
        }
        true
    }

    pub fn leave_group(&mut self, group_id: GroupId, role_id: RoleId) {
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.member_ids.retain(|id| *id != role_id);
        }
    }
}
