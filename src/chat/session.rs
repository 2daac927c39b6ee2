use tracing::{debug, warn};

use super::{
    event::Event,
    frame::Frame,
    hub::{ChatHub, JoinError, Member},
    outbox::Outbox,
    role::RoomRef,
};

/// Which websocket endpoint the connection came in on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Global,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joined(Member),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

/// Protocol handler for one live connection.
///
/// Dropping a joined session leaves its room, so a connection task that ends
/// for any reason cleans up exactly once.
#[derive(Debug)]
pub struct ChatSession {
    hub: ChatHub,
    outbox: Outbox,
    endpoint: Endpoint,
    login_url: String,
    state: SessionState,
}

impl ChatSession {
    pub fn new(hub: ChatHub, endpoint: Endpoint, outbox: Outbox, login_url: impl Into<String>) -> ChatSession {
        ChatSession {
            hub,
            outbox,
            endpoint,
            login_url: login_url.into(),
            state: SessionState::Unjoined,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn handle(&mut self, raw: &str) -> Flow {
        let frame = Frame::parse(raw);
        debug!(session = %self.outbox.id(), ?frame, "inbound frame");

        match &self.state {
            SessionState::Closed => Flow::Close,
            SessionState::Unjoined => self.join(raw, frame),
            SessionState::Joined(member) => match frame {
                Frame::Message(body) => {
                    self.hub.post(member, &body);
                    Flow::Continue
                }
                Frame::Leave => {
                    self.disconnect();
                    Flow::Close
                }
                Frame::Join { .. } | Frame::Unknown => Flow::Continue,
            },
        }
    }

    fn join(&mut self, raw: &str, frame: Frame) -> Flow {
        let Frame::Join { role_id, group_id } = frame else {
            return self.force_quit(raw);
        };
        let room = match (self.endpoint, group_id) {
            (Endpoint::Global, _) => RoomRef::Global,
            (Endpoint::Group, Some(group_id)) => RoomRef::Group(group_id),
            (Endpoint::Group, None) => return self.force_quit(raw),
        };

        match self.hub.join(role_id, room, self.outbox.clone()) {
            Ok(member) => {
                self.state = SessionState::Joined(member);
                Flow::Continue
            }
            Err(JoinError::UnknownGroup(group_id)) => {
                debug!(role_id, group_id, "join for missing group ignored");
                Flow::Continue
            }
            Err(err) => {
                warn!("join refused: {err}");
                self.force_quit(raw)
            }
        }
    }

    /// Transport closed or errored. Same cleanup as an explicit leave.
    pub fn disconnect(&mut self) {
        if let SessionState::Joined(member) = std::mem::replace(&mut self.state, SessionState::Closed) {
            self.hub.leave(&member);
        }
    }

    fn force_quit(&mut self, raw: &str) -> Flow {
        warn!(session = %self.outbox.id(), frame = raw, "force quit");
        self.outbox.send(&Event::Redirect(self.login_url.clone()));
        self.state = SessionState::Closed;
        Flow::Close
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tokio::sync::mpsc::Receiver;

    use super::*;
    use crate::chat::role::RoomKind;

    const LOGIN: &str = "login.html";

    fn open(hub: &ChatHub, endpoint: Endpoint) -> (ChatSession, Receiver<String>) {
        let (outbox, rx) = Outbox::new();
        (ChatSession::new(hub.clone(), endpoint, outbox, LOGIN), rx)
    }

    fn drain(rx: &mut Receiver<String>) -> Vec<Value> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|frame| serde_json::from_str(&frame).unwrap())
            .collect()
    }

    fn redirect() -> Value {
        json!({"type": 10, "url": LOGIN})
    }

    #[test]
    fn global_room_scenario() {
        let hub = ChatHub::new();
        hub.register(1, "alice", Some(RoomKind::Global)).unwrap();
        hub.register(2, "bob", Some(RoomKind::Global)).unwrap();

        let (mut alice, mut alice_rx) = open(&hub, Endpoint::Global);
        let (mut bob, mut bob_rx) = open(&hub, Endpoint::Global);

        assert_eq!(alice.handle("1001=1"), Flow::Continue);
        assert_eq!(
            drain(&mut alice_rx),
            vec![json!({"type": 2, "roles": {"1": "alice"}}), json!({"type": 1, "msg": []})]
        );

        assert_eq!(bob.handle("1001=2"), Flow::Continue);
        assert_eq!(drain(&mut alice_rx), vec![json!({"type": 2, "roles": {"2": "bob"}})]);
        assert_eq!(drain(&mut bob_rx)[0], json!({"type": 2, "roles": {"1": "alice", "2": "bob"}}));

        assert_eq!(alice.handle("1002=hi"), Flow::Continue);
        assert_eq!(drain(&mut bob_rx), vec![json!({"type": 1, "msg": ["alice : hi"]})]);
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[test]
    fn unjoined_garbage_forces_a_redirect() {
        let hub = ChatHub::new();
        for input in ["", "1002=hi", "1003", "hello", "1001=abc"] {
            let (mut session, mut rx) = open(&hub, Endpoint::Global);
            assert_eq!(session.handle(input), Flow::Close);
            assert_eq!(session.state(), &SessionState::Closed);
            assert_eq!(drain(&mut rx), vec![redirect()]);
        }
    }

    #[test]
    fn unknown_role_is_force_quit() {
        let hub = ChatHub::new();
        let (mut session, mut rx) = open(&hub, Endpoint::Global);
        assert_eq!(session.handle("1001=42"), Flow::Close);
        assert_eq!(drain(&mut rx), vec![redirect()]);
    }

    #[test]
    fn second_connection_for_a_joined_role_is_refused() {
        let hub = ChatHub::new();
        hub.register(1, "alice", Some(RoomKind::Global)).unwrap();
        let (mut first, _first_rx) = open(&hub, Endpoint::Global);
        first.handle("1001=1");

        let (mut second, mut second_rx) = open(&hub, Endpoint::Global);
        assert_eq!(second.handle("1001=1"), Flow::Close);
        assert_eq!(drain(&mut second_rx), vec![redirect()]);
        drop(second);

        assert!(matches!(first.state(), SessionState::Joined(member) if member.id == 1));
    }

    #[test]
    fn missing_group_keeps_the_session_unjoined() {
        let hub = ChatHub::new();
        hub.register(1, "alice", Some(RoomKind::Group)).unwrap();
        let (mut session, mut rx) = open(&hub, Endpoint::Group);

        assert_eq!(session.handle("1001=1=9"), Flow::Continue);
        assert_eq!(session.state(), &SessionState::Unjoined);
        assert!(drain(&mut rx).is_empty());

        let group = hub.create_group(1, "g").unwrap();
        assert_eq!(session.handle(&format!("1001=1={group}")), Flow::Continue);
        assert!(matches!(session.state(), SessionState::Joined(_)));
        assert_eq!(hub.group_members(group), Some(vec![1]));
    }

    #[test]
    fn group_endpoint_needs_a_group_id() {
        let hub = ChatHub::new();
        hub.register(1, "alice", Some(RoomKind::Group)).unwrap();
        let (mut session, mut rx) = open(&hub, Endpoint::Group);
        assert_eq!(session.handle("1001=1"), Flow::Close);
        assert_eq!(drain(&mut rx), vec![redirect()]);
    }

    #[test]
    fn joined_session_ignores_unknown_frames() {
        let hub = ChatHub::new();
        hub.register(1, "alice", Some(RoomKind::Global)).unwrap();
        let (mut session, mut rx) = open(&hub, Endpoint::Global);
        session.handle("1001=1");
        drain(&mut rx);

        assert_eq!(session.handle("hello"), Flow::Continue);
        assert_eq!(session.handle("1001=1"), Flow::Continue);
        assert!(drain(&mut rx).is_empty());
        assert!(matches!(session.state(), SessionState::Joined(_)));
    }

    #[test]
    fn leave_and_disconnect_broadcast_one_removal() {
        let hub = ChatHub::new();
        let group = {
            hub.register(1, "alice", Some(RoomKind::Group)).unwrap();
            hub.register(2, "bob", Some(RoomKind::Group)).unwrap();
            hub.register(3, "carol", Some(RoomKind::Group)).unwrap();
            hub.create_group(1, "g").unwrap()
        };
        let join = |id: u32| format!("1001={id}={group}");
        let (mut alice, mut alice_rx) = open(&hub, Endpoint::Group);
        let (mut bob, _bob_rx) = open(&hub, Endpoint::Group);
        let (mut carol, _carol_rx) = open(&hub, Endpoint::Group);
        alice.handle(&join(1));
        bob.handle(&join(2));
        carol.handle(&join(3));
        drain(&mut alice_rx);

        assert_eq!(bob.handle("1003"), Flow::Close);
        assert_eq!(bob.state(), &SessionState::Closed);
        bob.disconnect();
        assert_eq!(bob.handle("1002=late"), Flow::Close);

        carol.disconnect();
        carol.disconnect();
        drop(carol);

        assert_eq!(
            drain(&mut alice_rx),
            vec![
                json!({"type": 3, "roles": {"2": ""}}),
                json!({"type": 3, "roles": {"3": ""}}),
            ]
        );
        assert_eq!(hub.group_members(group), Some(vec![1]));
    }

    #[test]
    fn dropping_a_joined_session_cleans_up() {
        let hub = ChatHub::new();
        hub.register(1, "alice", Some(RoomKind::Global)).unwrap();
        hub.register(2, "bob", Some(RoomKind::Global)).unwrap();
        let (mut alice, mut alice_rx) = open(&hub, Endpoint::Global);
        let (mut bob, _bob_rx) = open(&hub, Endpoint::Global);
        alice.handle("1001=1");
        bob.handle("1001=2");
        drain(&mut alice_rx);

        drop(bob);
        assert_eq!(drain(&mut alice_rx), vec![json!({"type": 3, "roles": {"2": ""}})]);
    }
}
