use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_all_commands() {
    Command::cargo_bin("channel-scribe")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scrape"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("duration"));
}

#[test]
fn duration_sums_the_aggregate_document() {
    let dir = tempfile::TempDir::new().unwrap();
    let aggregate = dir.path().join("videos.json");

    let record = |id: &str, duration: &str| {
        serde_json::json!({
            "title": format!("Video {id}"),
            "videoId": id,
            "url": format!("https://www.youtube.com/watch?v={id}"),
            "publishedAt": "2023-05-01T12:00:00Z",
            "viewCount": "100",
            "likeCount": "10",
            "commentCount": "1",
            "description": "",
            "channelTitle": "Acme",
            "duration": duration,
            "definition": "hd",
            "caption": "false",
            "licensedContent": false,
            "thumbnails": {}
        })
    };
    let documents = serde_json::json!([record("a1", "PT1H30M"), record("a2", "PT30M")]);
    std::fs::write(&aggregate, serde_json::to_string_pretty(&documents).unwrap()).unwrap();

    Command::cargo_bin("channel-scribe")
        .unwrap()
        .args(["duration", "--input"])
        .arg(&aggregate)
        .assert()
        .success()
        .stdout(predicate::str::contains("2.00 hours"))
        .stdout(predicate::str::contains("2 video(s)"));
}

#[test]
fn duration_fails_on_missing_aggregate() {
    let dir = tempfile::TempDir::new().unwrap();

    Command::cargo_bin("channel-scribe")
        .unwrap()
        .args(["duration", "--input"])
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read aggregate document"));
}

#[test]
fn scrape_requires_api_key_and_channel() {
    Command::cargo_bin("channel-scribe")
        .unwrap()
        .arg("scrape")
        .env_remove("YOUTUBE_API_KEY")
        .env_remove("CHANNEL_NAME")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--api-key"))
        .stderr(predicate::str::contains("--channel"));
}

#[test]
fn scrape_help_documents_env_fallbacks() {
    Command::cargo_bin("channel-scribe")
        .unwrap()
        .args(["scrape", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("YOUTUBE_API_KEY"))
        .stdout(predicate::str::contains("CHANNEL_NAME"))
        .stdout(predicate::str::contains("VIDEO_LIMIT"))
        .stdout(predicate::str::contains("CONCURRENCY"));
}
