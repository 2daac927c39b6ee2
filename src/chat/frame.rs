use super::{role::RoleId, room::GroupId};

pub const JOIN: &str = "1001";
pub const MESSAGE: &str = "1002";
pub const LEAVE: &str = "1003";

/// Inbound text frame, `<code>=<arg>[=<arg>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Join { role_id: RoleId, group_id: Option<GroupId> },
    Message(String),
    Leave,
    Unknown,
}

impl Frame {
    pub fn parse(raw: &str) -> Frame {
        let raw = raw.trim();
        let (code, rest) = raw.split_once('=').unwrap_or((raw, ""));

        match code {
            JOIN => {
                let mut args = rest.split('=');
                let Some(Ok(role_id)) = args.next().map(str::parse::<RoleId>) else {
                    return Frame::Unknown;
                };
                let group_id = args.next().and_then(|arg| arg.parse().ok());
                Frame::Join { role_id, group_id }
            }
            // the body is everything after the code, '=' included
            MESSAGE => Frame::Message(rest.to_owned()),
            LEAVE => Frame::Leave,
            _ => Frame::Unknown,
        }
    }
}
