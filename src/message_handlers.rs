use super::*;
use crate::helpers::{
    build_results_keyboard, choose_text, edit_or_send, page_window, searching_text, UiUpdate,
};
use crate::integrations::search_tracks;

const HELP_TEXT: &str =
    "Use /song <name> to search for a track, then pick one to get its audio.";

pub(super) async fn handle_message(
    bot: Bot,
    msg: Message,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    let user_id = match msg.from() {
        Some(user) => user.id,
        None => return Ok(()),
    };
    let text = match msg.text() {
        Some(text) => text,
        None => return Ok(()),
    };
    let Some((cmd, rest)) = parse_command(text) else {
        return Ok(());
    };

    match cmd {
        "start" | "help" => {
            bot.send_message(msg.chat.id, HELP_TEXT).await?;
        }
        "song" => {
            if rest.is_empty() {
                bot.send_message(msg.chat.id, "❗ Please type a song name after /song.")
                    .reply_to_message_id(msg.id)
                    .await?;
                return Ok(());
            }
            state.sessions.create(user_id, rest).await;
            show_page(&bot, msg.chat.id, user_id, &state, rest, 0).await?;
        }
        _ => {}
    }

    Ok(())
}

/// Splits `/cmd rest` into the bare command name and trimmed argument.
/// Strips a `@BotName` suffix so group-addressed commands still match.
pub(super) fn parse_command(text: &str) -> Option<(&str, &str)> {
    let rest = text.trim().strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let cmd = parts.next()?;
    let arg = parts.next().unwrap_or("").trim();
    let cmd = cmd.split('@').next().unwrap_or(cmd);
    if cmd.is_empty() {
        return None;
    }
    Some((cmd, arg))
}

/// Renders one result page into the session's UI message: a status line
/// first, then either the button list, a "no more results" notice, or the
/// search error. A failed search leaves the session untouched so the user
/// can retry by pressing the same button again.
pub(super) async fn show_page(
    bot: &Bot,
    chat_id: ChatId,
    user_id: UserId,
    state: &std::sync::Arc<AppState>,
    query: &str,
    page: usize,
) -> Result<()> {
    update_ui(bot, chat_id, user_id, state, &searching_text(query, page), None).await?;

    let hits = match search_tracks(&state.config, query).await {
        Ok(hits) => hits,
        Err(err) => {
            log::warn!("search failed for {:?}: {:#}", query, err);
            let text = format!("❌ Search failed: {}", err);
            update_ui(bot, chat_id, user_id, state, &text, None).await?;
            return Ok(());
        }
    };

    let window = page_window(&hits, page);
    if window.is_empty() {
        update_ui(bot, chat_id, user_id, state, "❌ No more results found.", None).await?;
        return Ok(());
    }

    let keyboard = build_results_keyboard(window, hits.len(), page, user_id);
    update_ui(
        bot,
        chat_id,
        user_id,
        state,
        &choose_text(page),
        Some(keyboard),
    )
    .await?;
    Ok(())
}

/// Edit-or-send against the session's current UI message, recording the new
/// message id when the send path was taken. Sessionless callers still get a
/// plain send.
pub(super) async fn update_ui(
    bot: &Bot,
    chat_id: ChatId,
    user_id: UserId,
    state: &std::sync::Arc<AppState>,
    text: &str,
    markup: Option<teloxide::types::InlineKeyboardMarkup>,
) -> Result<()> {
    let existing = state
        .sessions
        .get(user_id)
        .await
        .and_then(|session| session.ui_message_id);
    match edit_or_send(bot, chat_id, existing, text, markup).await? {
        UiUpdate::Edited => {}
        UiUpdate::Sent(message_id) => {
            state.sessions.set_ui_message(user_id, message_id).await;
        }
    }
    Ok(())
}
