use std::{sync::Arc, time::Duration};

use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::{config::Config, AppState};

use super::{
    hub::ChatHub,
    outbox::Outbox,
    session::{ChatSession, Endpoint, Flow},
};

/// How long queued frames (a final redirect, say) may take to flush after the session ends.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[debug_handler(state = AppState)]
pub(crate) async fn all_chat_ws(
    State(hub): State<ChatHub>,
    State(config): State<Arc<Config>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let login_url = config.login_url.clone();
    ws.on_upgrade(move |socket| serve(socket, hub, Endpoint::Global, login_url))
}

#[debug_handler(state = AppState)]
pub(crate) async fn group_chat_ws(
    State(hub): State<ChatHub>,
    State(config): State<Arc<Config>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let login_url = config.login_url.clone();
    ws.on_upgrade(move |socket| serve(socket, hub, Endpoint::Group, login_url))
}

async fn serve(socket: WebSocket, hub: ChatHub, endpoint: Endpoint, login_url: String) {
    let (outbox, mut rx) = Outbox::new();
    let session_id = outbox.id();
    let overflow = outbox.overflow();
    let (mut sender, mut receiver) = socket.split();
    debug!(session = %session_id, ?endpoint, "connection opened");

    // ends once every copy of the outbox is gone, after flushing what was queued
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    });

    let mut session = ChatSession::new(hub, endpoint, outbox, login_url);
    let mut stalled = false;
    loop {
        let msg = tokio::select! {
            msg = receiver.next() => msg,
            _ = overflow.wait() => {
                stalled = true;
                break;
            }
        };
        let text = match msg {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                debug!(session = %session_id, "transport error: {err}");
                break;
            }
        };
        if session.handle(text.as_str()) == Flow::Close {
            break;
        }
    }
    drop(session);

    if stalled {
        send_task.abort();
    } else if tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        warn!(session = %session_id, "peer stopped reading, dropping its queue");
        send_task.abort();
    }
    debug!(session = %session_id, stalled, "connection closed");
}
