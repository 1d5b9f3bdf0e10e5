use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use serde::Deserialize;
use teloxide::prelude::*;
use teloxide::types::{MessageId, UserId};
use tokio::sync::Mutex;

mod callback_handlers;
mod helpers;
mod integrations;
mod message_handlers;
#[cfg(test)]
mod tests;

const PAGE_SIZE: usize = 5;
const MAX_PAGE: usize = 3;
const SEARCH_LIMIT: usize = 20;

#[derive(Debug, Deserialize, Clone, Default)]
struct FileConfig {
    token: Option<String>,
    download_dir: Option<PathBuf>,
    cookies_path: Option<PathBuf>,
    ytdlp_bin: Option<String>,
}

#[derive(Debug, Clone)]
struct Config {
    token: String,
    download_dir: PathBuf,
    cookies_path: Option<PathBuf>,
    ytdlp_bin: String,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One in-progress search per user. `ui_message_id` points at the single
/// status-or-results message; it may go stale if the message is deleted,
/// in which case callers send a new one and overwrite it.
#[derive(Clone, Debug)]
struct SearchSession {
    query: String,
    page: usize,
    ui_message_id: Option<MessageId>,
}

#[derive(Default)]
struct SessionStore {
    sessions: Mutex<HashMap<UserId, SearchSession>>,
}

impl SessionStore {
    fn new() -> Self {
        Self::default()
    }

    async fn create(&self, user_id: UserId, query: &str) {
        let session = SearchSession {
            query: query.to_string(),
            page: 0,
            ui_message_id: None,
        };
        self.sessions.lock().await.insert(user_id, session);
    }

    async fn get(&self, user_id: UserId) -> Option<SearchSession> {
        self.sessions.lock().await.get(&user_id).cloned()
    }

    async fn set_page(&self, user_id: UserId, page: usize) {
        if let Some(session) = self.sessions.lock().await.get_mut(&user_id) {
            session.page = page;
        }
    }

    async fn set_ui_message(&self, user_id: UserId, message_id: MessageId) {
        if let Some(session) = self.sessions.lock().await.get_mut(&user_id) {
            session.ui_message_id = Some(message_id);
        }
    }

    async fn remove(&self, user_id: UserId) -> Option<SearchSession> {
        self.sessions.lock().await.remove(&user_id)
    }
}

struct AppState {
    config: Config,
    sessions: SessionStore,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    fs::create_dir_all(&config.download_dir).with_context(|| {
        format!("create download dir {}", config.download_dir.display())
    })?;
    if let Some(cookies) = &config.cookies_path {
        if !cookies.exists() {
            warn!("cookies file not found: {}", cookies.display());
        }
    }

    let state = std::sync::Arc::new(AppState {
        sessions: SessionStore::new(),
        config: config.clone(),
    });

    let bot = Bot::new(config.token.clone());

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(message_handlers::handle_message))
        .branch(Update::filter_callback_query().endpoint(callback_handlers::handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("read config {}", path.display()))?;
            toml::from_str::<FileConfig>(&contents).context("parse config")?
        }
        None => FileConfig::default(),
    };

    let token = match file.token {
        Some(token) => token,
        None => std::env::var("BOT_TOKEN")
            .context("BOT_TOKEN is not set and the config file provides no token")?,
    };

    Ok(Config {
        token,
        download_dir: file
            .download_dir
            .unwrap_or_else(|| PathBuf::from("downloads")),
        cookies_path: file.cookies_path,
        ytdlp_bin: file.ytdlp_bin.unwrap_or_else(|| "yt-dlp".to_string()),
    })
}

fn chat_id_for_user(user_id: UserId) -> ChatId {
    ChatId(user_id.0 as i64)
}
