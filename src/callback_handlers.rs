use super::*;
use crate::integrations::download_track;
use crate::message_handlers::show_page;
use teloxide::types::InputFile;

pub(super) async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };

    if let Some(page) = data.strip_prefix("advance:") {
        handle_advance(bot, q, state, page).await?;
    } else if data.starts_with("cancel:") {
        handle_cancel(bot, q, state).await?;
    } else if let Some(track_id) = data.strip_prefix("select:") {
        handle_select(bot, q, state, track_id).await?;
    } else {
        bot.answer_callback_query(q.id).await?;
    }

    Ok(())
}

async fn handle_advance(
    bot: Bot,
    q: CallbackQuery,
    state: std::sync::Arc<AppState>,
    page_str: &str,
) -> Result<()> {
    let user_id = q.from.id;
    let page = match page_str.parse::<usize>() {
        Ok(page) => page.min(MAX_PAGE),
        Err(_) => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        }
    };

    let Some(session) = state.sessions.get(user_id).await else {
        bot.answer_callback_query(q.id)
            .text("❌ Search session expired. Please start a new search.")
            .await?;
        return Ok(());
    };

    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat.id)
        .unwrap_or_else(|| chat_id_for_user(user_id));

    state.sessions.set_page(user_id, page).await;
    bot.answer_callback_query(q.id).await?;
    show_page(&bot, chat_id, user_id, &state, &session.query, page).await?;
    Ok(())
}

async fn handle_cancel(
    bot: Bot,
    q: CallbackQuery,
    state: std::sync::Arc<AppState>,
) -> Result<()> {
    let user_id = q.from.id;
    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat.id)
        .unwrap_or_else(|| chat_id_for_user(user_id));

    if let Some(session) = state.sessions.remove(user_id).await {
        if let Some(message_id) = session.ui_message_id {
            let _ = bot.delete_message(chat_id, message_id).await;
        }
    }

    bot.answer_callback_query(q.id).await?;
    bot.send_message(
        chat_id,
        format!("{} cancelled the search.", q.from.first_name),
    )
    .await?;
    Ok(())
}

async fn handle_select(
    bot: Bot,
    q: CallbackQuery,
    state: std::sync::Arc<AppState>,
    track_id: &str,
) -> Result<()> {
    let user_id = q.from.id;
    if track_id.is_empty() {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    }

    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat.id)
        .unwrap_or_else(|| chat_id_for_user(user_id));

    // The session is finished once a track is picked, whether or not the
    // farewell edit lands.
    if let Some(session) = state.sessions.remove(user_id).await {
        if let Some(message_id) = session.ui_message_id {
            let _ = bot
                .edit_message_text(
                    chat_id,
                    message_id,
                    "🎵 Your song will be ready soon! Please wait while we prepare it for you...",
                )
                .await;
        }
    }

    bot.answer_callback_query(q.id).await?;
    deliver_track(&bot, chat_id, &state, track_id).await
}

/// Downloads the selected track and sends it back as audio, keeping the
/// user informed through a placeholder message. Failures end up as edited
/// error text on the placeholder; if that edit fails too, the error is only
/// logged.
pub(super) async fn deliver_track(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    track_id: &str,
) -> Result<()> {
    let placeholder = bot
        .send_message(chat_id, "⬇️ Downloading... Please wait.")
        .await?;

    match deliver_inner(bot, chat_id, state, track_id).await {
        Ok(()) => {
            let _ = bot.delete_message(chat_id, placeholder.id).await;
        }
        Err(err) => {
            log::error!("download failed for {}: {:#}", track_id, err);
            let text = format!("❌ Error: {}", err);
            if bot
                .edit_message_text(chat_id, placeholder.id, text)
                .await
                .is_err()
            {
                log::warn!("could not report download failure for {}", track_id);
            }
        }
    }

    Ok(())
}

async fn deliver_inner(
    bot: &Bot,
    chat_id: ChatId,
    state: &std::sync::Arc<AppState>,
    track_id: &str,
) -> Result<()> {
    let track = download_track(&state.config, track_id).await?;

    bot.send_audio(chat_id, InputFile::file(&track.path))
        .title(track.title.clone())
        .await
        .context("send audio")?;

    if let Err(err) = fs::remove_file(&track.path) {
        log::warn!("failed to remove {}: {}", track.path.display(), err);
    }
    Ok(())
}
