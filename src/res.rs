use axum::{debug_handler, http::header, response::{Html, IntoResponse}, routing::get, Router};

use crate::AppState;

#[macro_export]
macro_rules! include_res {
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Thin browser client for the chat protocol.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(login_page))
        .route("/login.html", get(login_page))
        .route("/all_chat_room.html", get(global_room_page))
        .route("/group_chat.html", get(group_lobby_page))
        .route("/group_chat_room.html", get(group_room_page))
        .route("/chat.js", get(chat_script))
}

#[debug_handler]
pub(crate) async fn login_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/login.html"))
}

#[debug_handler]
pub(crate) async fn global_room_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/all_chat_room.html"))
}

#[debug_handler]
pub(crate) async fn group_lobby_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/group_chat.html"))
}

#[debug_handler]
pub(crate) async fn group_room_page() -> impl IntoResponse {
    Html(include_res!(str, "/pages/group_chat_room.html"))
}

#[debug_handler]
pub(crate) async fn chat_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript")],
        include_res!(str, "/pages/chat.js"),
    )
}
