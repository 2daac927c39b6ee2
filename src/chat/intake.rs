use std::{collections::BTreeMap, sync::Arc};

use axum::{debug_handler, extract::State, Form, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Config, AppResult, AppState};

use super::{
    hub::ChatHub,
    role::{RegisterError, RoleId, RoomKind},
    room::GroupId,
};

/// Body of every intake response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<GroupId, String>>,
}

impl Reply {
    fn status(kind: u8) -> Reply {
        Reply { kind, ..Reply::default() }
    }

    fn redirect(url: String) -> Reply {
        Reply { kind: 1, url: Some(url), ..Reply::default() }
    }
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("id must be a positive integer")]
    InvalidId,
    #[error("name must not be empty")]
    EmptyName,
    #[error("group_name must not be empty")]
    EmptyGroupName,
}

fn check_id(id: RoleId) -> Result<RoleId, IntakeError> {
    if id == 0 {
        return Err(IntakeError::InvalidId);
    }
    Ok(id)
}

#[derive(Debug, Deserialize)]
pub(crate) struct JoinForm {
    id: RoleId,
    name: String,
    #[serde(default)]
    room_type: i64,
}

#[debug_handler(state = AppState)]
pub(crate) async fn join(
    State(hub): State<ChatHub>,
    State(config): State<Arc<Config>>,
    Form(JoinForm { id, name, room_type }): Form<JoinForm>,
) -> AppResult<Json<Reply>> {
    let id = check_id(id)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(IntakeError::EmptyName.into());
    }

    let kind = RoomKind::from_code(room_type);
    let reply = match hub.register(id, name, kind) {
        Err(RegisterError::DuplicateId(_)) => Reply::status(2),
        Err(RegisterError::DuplicateName(_)) => Reply::status(3),
        Ok(()) => match kind {
            Some(RoomKind::Global) => Reply::redirect(format!("{}?id={id}", config.global_room_url)),
            Some(RoomKind::Group) => Reply::redirect(format!("{}?id={id}", config.group_lobby_url)),
            None => Reply::status(0),
        },
    };
    Ok(Json(reply))
}

#[debug_handler(state = AppState)]
pub(crate) async fn list_groups(State(hub): State<ChatHub>) -> Json<Reply> {
    let groups: BTreeMap<_, _> = hub.list_groups().into_iter().collect();
    if groups.is_empty() {
        return Json(Reply::status(0));
    }
    Json(Reply { kind: 1, groups: Some(groups), ..Reply::default() })
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateGroupForm {
    id: RoleId,
    group_name: String,
}

#[debug_handler(state = AppState)]
pub(crate) async fn create_group(
    State(hub): State<ChatHub>,
    State(config): State<Arc<Config>>,
    Form(CreateGroupForm { id, group_name }): Form<CreateGroupForm>,
) -> AppResult<Json<Reply>> {
    let id = check_id(id)?;
    let group_name = group_name.trim();
    if group_name.is_empty() {
        return Err(IntakeError::EmptyGroupName.into());
    }

    let reply = match hub.create_group(id, group_name) {
        Ok(group_id) => Reply::redirect(format!("{}?id={id}&group_id={group_id}", config.group_room_url)),
        Err(_) => Reply { kind: 0, msg: Some("not this role".to_owned()), ..Reply::default() },
    };
    Ok(Json(reply))
}
