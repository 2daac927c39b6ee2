use std::collections::BTreeMap;

use thiserror::Error;
use time::OffsetDateTime;

use super::{outbox::Outbox, room::GroupId};

pub type RoleId = u32;

/// Room a role asked for at registration time (`room_type` on the intake form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Global,
    Group,
}

impl RoomKind {
    pub fn from_code(code: i64) -> Option<RoomKind> {
        match code {
            1 => Some(RoomKind::Global),
            2 => Some(RoomKind::Group),
            _ => None,
        }
    }
}

/// A concrete room a session is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomRef {
    Global,
    Group(GroupId),
}

#[derive(Debug)]
pub enum Presence {
    /// Registered over HTTP, no live connection yet.
    Pending,
    Online(Outbox),
    /// Left or disconnected. The name is free again and the id must be re-registered.
    Departed,
}

#[derive(Debug)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub kind: Option<RoomKind>,
    pub room: RoomRef,
    pub joined_at: OffsetDateTime,
    pub presence: Presence,
}

impl Role {
    pub fn outbox(&self) -> Option<&Outbox> {
        match &self.presence {
            Presence::Online(outbox) => Some(outbox),
            _ => None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.outbox().is_some()
    }

    fn is_departed(&self) -> bool {
        matches!(self.presence, Presence::Departed)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("role {0} is already registered")]
    DuplicateId(RoleId),
    #[error("name {0:?} is taken")]
    DuplicateName(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttachError {
    #[error("no role with id {0}")]
    UnknownId(RoleId),
    #[error("role {0} already has a live session")]
    AlreadyJoined(RoleId),
}

#[derive(Debug, Default)]
pub struct Registry {
    roles: BTreeMap<RoleId, Role>,
}

impl Registry {
    /// Reserves `id` and `name`. A departed id can be registered again; its old record is replaced.
    pub fn register(&mut self, id: RoleId, name: &str, kind: Option<RoomKind>) -> Result<&Role, RegisterError> {
        if self.roles.get(&id).is_some_and(|role| !role.is_departed()) {
            return Err(RegisterError::DuplicateId(id));
        }
        if self.name_exists(name) {
            return Err(RegisterError::DuplicateName(name.to_owned()));
        }

        let role = Role {
            id,
            name: name.to_owned(),
            kind,
            room: RoomRef::Global,
            joined_at: OffsetDateTime::now_utc(),
            presence: Presence::Pending,
        };
        self.roles.insert(id, role);
        Ok(&self.roles[&id])
    }

    pub fn attach(&mut self, id: RoleId, room: RoomRef, outbox: Outbox) -> Result<&Role, AttachError> {
        let role = self.roles.get_mut(&id).ok_or(AttachError::UnknownId(id))?;
        match role.presence {
            Presence::Departed => return Err(AttachError::UnknownId(id)),
            Presence::Online(_) => return Err(AttachError::AlreadyJoined(id)),
            Presence::Pending => {}
        }

        role.room = room;
        role.presence = Presence::Online(outbox);
        Ok(role)
    }

    /// Marks the role departed if `session` is the one attached to it.
    /// Returns the room it was in, or `None` when there was nothing to detach.
    pub fn detach(&mut self, id: RoleId, session: uuid::Uuid) -> Option<RoomRef> {
        let role = self.roles.get_mut(&id)?;
        match &role.presence {
            Presence::Online(outbox) if outbox.id() == session => {
                role.presence = Presence::Departed;
                Some(role.room)
            }
            _ => None,
        }
    }

    pub fn lookup(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(&id)
    }

    /// Online roles in `room`, ordered by id.
    pub fn list_by_room(&self, room: RoomRef) -> impl Iterator<Item = &Role> {
        self.roles
            .values()
            .filter(move |role| role.room == room && role.is_online())
    }

    pub fn name_exists(&self, name: &str) -> bool {
        self.roles
            .values()
            .any(|role| role.name == name && !role.is_departed())
    }
}
