use anyhow::Context;

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Where clients are sent after a forced quit.
    pub login_url: String,
    pub global_room_url: String,
    /// Group picker page a group-room registration redirects to.
    pub group_lobby_url: String,
    pub group_room_url: String,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            host: "localhost".to_owned(),
            port: 8081,
            login_url: "login.html".to_owned(),
            global_room_url: "all_chat_room.html".to_owned(),
            group_lobby_url: "group_chat.html".to_owned(),
            group_room_url: "group_chat_room.html".to_owned(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Config> {
        Config::from_vars(|key| dotenv::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
        let defaults = Config::default();
        let port = match var("CHAT_PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("CHAT_PORT={port:?} is not a port number"))?,
            None => defaults.port,
        };

        Ok(Config {
            host: var("CHAT_HOST").unwrap_or(defaults.host),
            port,
            login_url: var("CHAT_LOGIN_URL").unwrap_or(defaults.login_url),
            global_room_url: var("CHAT_GLOBAL_ROOM_URL").unwrap_or(defaults.global_room_url),
            group_lobby_url: var("CHAT_GROUP_LOBBY_URL").unwrap_or(defaults.group_lobby_url),
            group_room_url: var("CHAT_GROUP_ROOM_URL").unwrap_or(defaults.group_room_url),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
