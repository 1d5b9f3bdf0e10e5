use super::*;
use serde::Deserialize;
use std::process::Command;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct SearchHit {
    pub(super) id: String,
    #[serde(default)]
    pub(super) title: Option<String>,
}

#[derive(Debug)]
pub(super) struct DownloadedTrack {
    pub(super) path: PathBuf,
    pub(super) title: String,
}

/// Flat metadata search, no media resolution. Each page navigation re-runs
/// this; results are never cached.
pub(super) async fn search_tracks(config: &Config, query: &str) -> Result<Vec<SearchHit>> {
    let config = config.clone();
    let query = query.to_string();
    tokio::task::spawn_blocking(move || run_ytdlp_search(&config, &query))
        .await
        .context("search task failed")?
}

pub(super) async fn download_track(config: &Config, track_id: &str) -> Result<DownloadedTrack> {
    let config = config.clone();
    let track_id = track_id.to_string();
    tokio::task::spawn_blocking(move || run_ytdlp_download(&config, &track_id))
        .await
        .context("download task failed")?
}

fn run_ytdlp_search(config: &Config, query: &str) -> Result<Vec<SearchHit>> {
    let mut cmd = Command::new(&config.ytdlp_bin);
    cmd.arg("-j")
        .arg("--flat-playlist")
        .arg("--no-warnings")
        .arg(format!("ytsearch{}:{}", SEARCH_LIMIT, query));
    add_cookies_arg(&mut cmd, config);
    let output = cmd
        .output()
        .with_context(|| format!("run {}", config.ytdlp_bin))?;
    if !output.status.success() {
        return Err(anyhow::anyhow!(format_ytdlp_error(&output)));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_search_output(&stdout))
}

/// yt-dlp emits one JSON object per line in flat-playlist mode. Lines that
/// are blank or fail to parse (playlist headers, partial writes) are skipped.
pub(super) fn parse_search_output(stdout: &str) -> Vec<SearchHit> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str::<SearchHit>(line).ok())
        .collect()
}

pub(super) fn track_url(track_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", track_id)
}

fn run_ytdlp_download(config: &Config, track_id: &str) -> Result<DownloadedTrack> {
    let template = config.download_dir.join("%(title).200B.%(ext)s");
    let mut cmd = Command::new(&config.ytdlp_bin);
    cmd.arg("--no-playlist")
        .arg("-f")
        .arg("bestaudio")
        .arg("--no-warnings")
        .arg("--no-simulate")
        .arg("--print")
        .arg("after_move:title")
        .arg("--print")
        .arg("after_move:filepath")
        .arg("-o")
        .arg(template.to_string_lossy().to_string())
        .arg(track_url(track_id));
    add_cookies_arg(&mut cmd, config);
    let output = cmd
        .output()
        .with_context(|| format!("run {}", config.ytdlp_bin))?;
    if !output.status.success() {
        return Err(anyhow::anyhow!(format_ytdlp_error(&output)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines().filter(|line| !line.trim().is_empty()).rev();
    let path_line = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("yt-dlp did not return a filepath"))?;
    let title_line = lines.next();

    let mut path = PathBuf::from(path_line.trim());
    if path.is_relative() {
        path = config.download_dir.join(path);
    }
    if !path.exists() {
        return Err(anyhow::anyhow!("yt-dlp output not found: {}", path.display()));
    }

    let title = match title_line {
        Some(title) => title.trim().to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| track_id.to_string()),
    };

    Ok(DownloadedTrack { path, title })
}

fn add_cookies_arg(cmd: &mut Command, config: &Config) {
    if let Some(cookies) = &config.cookies_path {
        cmd.arg("--cookies").arg(cookies);
    }
}

pub(super) fn format_ytdlp_error(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!(
        "yt-dlp failed: {}",
        summarize_process_output(&stdout, &stderr)
    )
}

pub(super) fn summarize_process_output(stdout: &str, stderr: &str) -> String {
    let stderr_trimmed = stderr.trim();
    if !stderr_trimmed.is_empty() {
        return trim_tail(stderr_trimmed, 500);
    }
    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        return trim_tail(stdout_trimmed, 500);
    }
    "no output captured".to_string()
}

pub(super) fn trim_tail(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut cutoff = 0usize;
    for (idx, _) in text.char_indices() {
        if idx >= text.len().saturating_sub(max_chars) {
            cutoff = idx;
            break;
        }
    }
    format!("...{}", &text[cutoff..])
}
