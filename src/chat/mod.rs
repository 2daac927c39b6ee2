mod event;
mod fanout;
mod frame;
mod hub;
mod intake;
mod outbox;
mod role;
mod room;
mod session;
mod ws;

use axum::{routing::get, Router};

use crate::AppState;

pub use event::Event;
pub use frame::Frame;
pub use hub::{ChatHub, CreateGroupError, JoinError, Member};
pub use intake::{IntakeError, Reply};
pub use outbox::{Outbox, Overflow, OUTBOX_CAPACITY};
pub use role::{Presence, RegisterError, Role, RoleId, RoomKind, RoomRef};
pub use room::{Group, GroupId};
pub use session::{ChatSession, Endpoint, Flow, SessionState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/join", get(intake::join).post(intake::join))
        .route("/get_group_chat", get(intake::list_groups).post(intake::list_groups))
        .route("/add_group_chat", get(intake::create_group).post(intake::create_group))
        .route("/all_chat", get(ws::all_chat_ws))
        .route("/group_chat", get(ws::group_chat_ws))
}
