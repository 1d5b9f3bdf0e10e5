use super::*;
use crate::integrations::SearchHit;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Which path a UI update took. Callers must record the new message id on
/// the `Sent` path so the session keeps pointing at the live message.
#[derive(Debug)]
pub(super) enum UiUpdate {
    Edited,
    Sent(MessageId),
}

/// Attempts to edit the existing UI message; on any edit failure (message
/// deleted, expired, edit no-op) sends a fresh message instead. Never leaves
/// the chat without a UI message.
pub(super) async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    existing: Option<MessageId>,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<UiUpdate> {
    if let Some(message_id) = existing {
        let edit = match markup.clone() {
            Some(kb) => {
                bot.edit_message_text(chat_id, message_id, text)
                    .reply_markup(kb)
                    .await
            }
            None => bot.edit_message_text(chat_id, message_id, text).await,
        };
        if edit.is_ok() {
            return Ok(UiUpdate::Edited);
        }
    }
    let sent = match markup {
        Some(kb) => bot.send_message(chat_id, text).reply_markup(kb).await?,
        None => bot.send_message(chat_id, text).await?,
    };
    Ok(UiUpdate::Sent(sent.id))
}

pub(super) fn page_window(hits: &[SearchHit], page: usize) -> &[SearchHit] {
    let start = page.saturating_mul(PAGE_SIZE).min(hits.len());
    let end = (start + PAGE_SIZE).min(hits.len());
    &hits[start..end]
}

pub(super) fn has_next_page(total: usize, page: usize) -> bool {
    page < MAX_PAGE && total > (page + 1) * PAGE_SIZE
}

pub(super) fn build_results_keyboard(
    hits: &[SearchHit],
    total: usize,
    page: usize,
    user_id: UserId,
) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    for hit in hits {
        let label = hit
            .title
            .clone()
            .unwrap_or_else(|| "No Title".to_string());
        rows.push(vec![InlineKeyboardButton::callback(
            label,
            format!("select:{}", hit.id),
        )]);
    }
    if has_next_page(total, page) {
        rows.push(vec![InlineKeyboardButton::callback(
            "➡️ Next",
            format!("advance:{}", page + 1),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "❌ Cancel",
        format!("cancel:{}", user_id),
    )]);
    InlineKeyboardMarkup::new(rows)
}

pub(super) fn searching_text(query: &str, page: usize) -> String {
    format!("🔍 Searching for \"{}\" (page {})...", query, page + 1)
}

pub(super) fn choose_text(page: usize) -> String {
    format!("🎧 Choose a song to download (page {}):", page + 1)
}
