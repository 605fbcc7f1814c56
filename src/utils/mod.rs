use std::path::Path;

use crate::Result;

/// Canonical watch URL for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// List the video ids of the `.mp3` artifacts in a directory, sorted for a
/// deterministic processing order.
pub fn video_ids_in_dir(audio_dir: &Path) -> Result<Vec<String>> {
    let mut ids = Vec::new();

    for entry in fs_err::read_dir(audio_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("mp3") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            ids.push(stem.to_string());
        }
    }

    ids.sort();
    Ok(ids)
}

/// Convert an ISO-8601 duration of the `PT#H#M#S` form to seconds.
/// Strings without the `PT` prefix (live streams report `P0D`, and older
/// documents may hold arbitrary text) count as zero.
pub fn iso8601_to_seconds(duration: &str) -> u64 {
    let Some(rest) = duration.strip_prefix("PT") else {
        return 0;
    };

    let mut total = 0u64;
    let mut value = 0u64;
    for ch in rest.chars() {
        if let Some(digit) = ch.to_digit(10) {
            value = value * 10 + u64::from(digit);
            continue;
        }
        let factor = match ch {
            'H' => 3600,
            'M' => 60,
            'S' => 1,
            _ => {
                value = 0;
                continue;
            }
        };
        total += value * factor;
        value = 0;
    }

    total
}

/// Sum a collection of ISO-8601 durations into hours
pub fn total_duration_hours<'a, I>(durations: I) -> f64
where
    I: IntoIterator<Item = &'a str>,
{
    let total_seconds: u64 = durations.into_iter().map(iso8601_to_seconds).sum();
    total_seconds as f64 / 3600.0
}

/// Check if the current environment has the required external tools
pub async fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available("yt-dlp", "--version").await {
        missing.push("yt-dlp - required for audio downloads".to_string());
    }

    if !check_command_available("whisper", "--help").await {
        missing.push("whisper - required for transcription".to_string());
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str, probe_arg: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg(probe_arg)
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
