use super::*;
use crate::helpers::*;
use crate::integrations::*;
use crate::message_handlers::parse_command;
use std::io::Write;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardButtonKind, InlineKeyboardMarkup};

fn hit(id: &str, title: Option<&str>) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        title: title.map(|t| t.to_string()),
    }
}

fn hits(count: usize) -> Vec<SearchHit> {
    (0..count)
        .map(|i| hit(&format!("id{}", i), Some(&format!("Track {}", i))))
        .collect()
}

fn callback_data(button: &InlineKeyboardButton) -> &str {
    match &button.kind {
        InlineKeyboardButtonKind::CallbackData(data) => data,
        other => panic!("unexpected button kind: {:?}", other),
    }
}

fn payloads(kb: &InlineKeyboardMarkup) -> Vec<&str> {
    kb.inline_keyboard
        .iter()
        .flatten()
        .map(callback_data)
        .collect()
}

#[test]
fn page_window_slices_five_at_a_time() {
    let hits = hits(12);
    let page0: Vec<&str> = page_window(&hits, 0).iter().map(|h| h.id.as_str()).collect();
    assert_eq!(page0, ["id0", "id1", "id2", "id3", "id4"]);
    let page1: Vec<&str> = page_window(&hits, 1).iter().map(|h| h.id.as_str()).collect();
    assert_eq!(page1, ["id5", "id6", "id7", "id8", "id9"]);
    let page2: Vec<&str> = page_window(&hits, 2).iter().map(|h| h.id.as_str()).collect();
    assert_eq!(page2, ["id10", "id11"]);
    assert!(page_window(&hits, 3).is_empty());
}

#[test]
fn page_window_handles_empty_results() {
    let hits: Vec<SearchHit> = Vec::new();
    assert!(page_window(&hits, 0).is_empty());
}

#[test]
fn has_next_page_tracks_remaining_results() {
    assert!(has_next_page(12, 0));
    assert!(has_next_page(12, 1));
    assert!(!has_next_page(12, 2));
    assert!(!has_next_page(5, 0));
    assert!(has_next_page(6, 0));
}

#[test]
fn has_next_page_caps_at_page_limit() {
    // 20 results would leave more past page 3, but pagination stops there.
    assert!(has_next_page(20, 2));
    assert!(!has_next_page(20, MAX_PAGE));
    assert!(!has_next_page(100, MAX_PAGE));
}

#[test]
fn results_keyboard_has_one_row_per_hit_plus_next_and_cancel() {
    let hits = hits(12);
    let kb = build_results_keyboard(page_window(&hits, 0), hits.len(), 0, UserId(7));
    let data = payloads(&kb);
    assert_eq!(
        data,
        [
            "select:id0",
            "select:id1",
            "select:id2",
            "select:id3",
            "select:id4",
            "advance:1",
            "cancel:7",
        ]
    );
}

#[test]
fn results_keyboard_drops_next_on_last_window() {
    let hits = hits(12);
    let kb = build_results_keyboard(page_window(&hits, 2), hits.len(), 2, UserId(7));
    let data = payloads(&kb);
    assert_eq!(data, ["select:id10", "select:id11", "cancel:7"]);
}

#[test]
fn results_keyboard_uses_placeholder_for_missing_title() {
    let hits = vec![hit("abc", None)];
    let kb = build_results_keyboard(&hits, 1, 0, UserId(1));
    assert_eq!(kb.inline_keyboard[0][0].text, "No Title");
    assert_eq!(callback_data(&kb.inline_keyboard[0][0]), "select:abc");
}

#[test]
fn ui_texts_are_one_based() {
    assert_eq!(
        searching_text("daylight", 0),
        "🔍 Searching for \"daylight\" (page 1)..."
    );
    assert_eq!(choose_text(2), "🎧 Choose a song to download (page 3):");
}

#[test]
fn parse_command_splits_name_and_argument() {
    assert_eq!(parse_command("/song daylight"), Some(("song", "daylight")));
    assert_eq!(parse_command("/song   spaced out  "), Some(("song", "spaced out")));
    assert_eq!(parse_command("/song"), Some(("song", "")));
    assert_eq!(parse_command("/song    "), Some(("song", "")));
}

#[test]
fn parse_command_strips_bot_mention() {
    assert_eq!(
        parse_command("/song@SongFetchBot daylight"),
        Some(("song", "daylight"))
    );
}

#[test]
fn parse_command_ignores_plain_text() {
    assert_eq!(parse_command("daylight"), None);
    assert_eq!(parse_command(""), None);
    assert_eq!(parse_command("/"), None);
}

#[test]
fn parse_search_output_reads_one_hit_per_line() {
    let stdout = concat!(
        "{\"id\":\"a1\",\"title\":\"First\"}\n",
        "\n",
        "{\"id\":\"b2\",\"title\":null}\n",
        "not json\n",
        "{\"title\":\"no id\"}\n",
        "{\"id\":\"c3\",\"title\":\"Third\",\"duration\":123}\n",
    );
    let hits = parse_search_output(stdout);
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, ["a1", "b2", "c3"]);
    assert_eq!(hits[0].title.as_deref(), Some("First"));
    assert_eq!(hits[1].title, None);
}

#[test]
fn track_url_builds_canonical_watch_link() {
    assert_eq!(track_url("dQw4w9WgXcQ"), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
}

#[test]
fn summarize_process_output_prefers_stderr() {
    assert_eq!(summarize_process_output("out", "err"), "err");
    assert_eq!(summarize_process_output("out", "  "), "out");
    assert_eq!(summarize_process_output("", ""), "no output captured");
}

#[test]
fn trim_tail_keeps_the_end() {
    assert_eq!(trim_tail("short", 10), "short");
    let long = "a".repeat(20) + "TAIL";
    let trimmed = trim_tail(&long, 8);
    assert!(trimmed.starts_with("..."));
    assert!(trimmed.ends_with("TAIL"));
}

#[tokio::test]
async fn session_store_create_get_remove() {
    let store = SessionStore::new();
    let user = UserId(1);
    assert!(store.get(user).await.is_none());

    store.create(user, "daylight").await;
    let session = store.get(user).await.expect("session exists");
    assert_eq!(session.query, "daylight");
    assert_eq!(session.page, 0);
    assert!(session.ui_message_id.is_none());

    let removed = store.remove(user).await.expect("removed");
    assert_eq!(removed.query, "daylight");
    assert!(store.get(user).await.is_none());
    assert!(store.remove(user).await.is_none());
}

#[tokio::test]
async fn session_store_create_overwrites_previous_search() {
    let store = SessionStore::new();
    let user = UserId(1);
    store.create(user, "first").await;
    store.set_page(user, 2).await;
    store.set_ui_message(user, MessageId(10)).await;

    store.create(user, "second").await;
    let session = store.get(user).await.expect("session exists");
    assert_eq!(session.query, "second");
    assert_eq!(session.page, 0);
    assert!(session.ui_message_id.is_none());
}

#[tokio::test]
async fn session_store_updates_page_and_message() {
    let store = SessionStore::new();
    let user = UserId(1);
    store.create(user, "daylight").await;

    store.set_page(user, 1).await;
    store.set_ui_message(user, MessageId(42)).await;
    let session = store.get(user).await.expect("session exists");
    assert_eq!(session.page, 1);
    assert_eq!(session.ui_message_id, Some(MessageId(42)));
}

#[tokio::test]
async fn session_store_mutations_are_noops_without_session() {
    let store = SessionStore::new();
    let user = UserId(9);
    store.set_page(user, 2).await;
    store.set_ui_message(user, MessageId(5)).await;
    assert!(store.get(user).await.is_none());
}

#[test]
fn load_config_reads_all_fields() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "token = \"abc\"\ndownload_dir = \"/tmp/songs\"\ncookies_path = \"/tmp/cookies.txt\"\nytdlp_bin = \"/opt/yt-dlp\""
    )
    .expect("write config");

    let config = load_config(Some(file.path())).expect("load config");
    assert_eq!(config.token, "abc");
    assert_eq!(config.download_dir, PathBuf::from("/tmp/songs"));
    assert_eq!(config.cookies_path, Some(PathBuf::from("/tmp/cookies.txt")));
    assert_eq!(config.ytdlp_bin, "/opt/yt-dlp");
}

#[test]
fn load_config_applies_defaults() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "token = \"abc\"").expect("write config");

    let config = load_config(Some(file.path())).expect("load config");
    assert_eq!(config.download_dir, PathBuf::from("downloads"));
    assert_eq!(config.cookies_path, None);
    assert_eq!(config.ytdlp_bin, "yt-dlp");
}

#[test]
fn chat_id_for_user_maps_to_private_chat() {
    assert_eq!(chat_id_for_user(UserId(42)), ChatId(42));
}
