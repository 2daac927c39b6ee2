use std::collections::BTreeMap;

use serde::{ser::SerializeMap, Serialize, Serializer};

use super::role::RoleId;

/// Server to client websocket events. Encoded as `{"type": <tag>, ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `type: 1`, a batch of rendered messages (full history or one new message).
    Messages(Vec<String>),
    /// `type: 2`, roster snapshot or a single roster addition.
    Roster(BTreeMap<RoleId, String>),
    /// `type: 3`, a participant left.
    RosterRemoved(RoleId),
    /// `type: 10`, client must go back to the given page.
    Redirect(String),
}

impl Event {
    pub fn roster_add(id: RoleId, name: &str) -> Event {
        Event::Roster(BTreeMap::from([(id, name.to_owned())]))
    }

    pub fn tag(&self) -> u8 {
        match self {
            Event::Messages(_) => 1,
            Event::Roster(_) => 2,
            Event::RosterRemoved(_) => 3,
            Event::Redirect(_) => 10,
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", &self.tag())?;
        match self {
            Event::Messages(msgs) => map.serialize_entry("msg", msgs)?,
            Event::Roster(roles) => map.serialize_entry("roles", roles)?,
            Event::RosterRemoved(id) => map.serialize_entry("roles", &BTreeMap::from([(*id, "")]))?,
            Event::Redirect(url) => map.serialize_entry("url", url)?,
        }
        map.end()
    }
}
