//! End-to-end archive jobs against a fake downloader
#![cfg(unix)]

mod common;

use common::{list_names, merged_video_script, write_json, Harness};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use vidarc::core::LogErrorKind;
use vidarc::download::DownloadOptions;
use vidarc::{archive_url, archive_urls, AppError, AuxRegistry};

fn video_info() -> Value {
    json!({
        "id": "abc",
        "title": "X",
        "thumbnails": [
            { "url": "https://i.ytimg.com/vi/abc/default.jpg", "preference": -10 },
            { "url": "https://i.ytimg.com/vi_webp/abc/maxresdefault.webp", "preference": 0 }
        ]
    })
}

#[tokio::test]
async fn test_video_site_single_file_layout() {
    let harness = Harness::new();
    let settings = harness.settings(&merged_video_script("X", &video_info()));

    let outcome = archive_url("https://www.youtube.com/watch?v=abc", &settings, &AuxRegistry::new()).await;

    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    let item = harness.dest_path().join("X");
    assert_eq!(outcome.destination_path.as_deref(), Some(item.as_path()));
    assert_eq!(
        list_names(&item),
        vec!["X.mp4", "info.json", "log.txt", "thumb.webp"]
    );
    assert_eq!(harness.dest_entries(), vec!["X"]);
    assert_eq!(harness.workspace_count(), 0);

    let log = std::fs::read_to_string(item.join("log.txt")).unwrap();
    assert!(log.contains("[Merger] Merging formats into \"X.mp4\""));
    assert!(log.ends_with('\n'));

    let info: Value = serde_json::from_str(&std::fs::read_to_string(item.join("info.json")).unwrap()).unwrap();
    assert_eq!(info["id"], "abc");
}

#[tokio::test]
async fn test_music_collection_batch_layout() {
    let harness = Harness::new();
    let album = json!({
        "creator": "Band",
        "album": "Record",
        "release_year": 2001,
        "playlist_id": "OLAK5uy"
    });
    let mut script = vec!["echo '[youtube:tab] Downloading playlist OLAK5uy'".to_string()];
    for (n, id) in [(1, "a1"), (2, "a2"), (3, "a3")] {
        let base = format!("0{}. Track {} [{}]", n, n, id);
        script.push(write_json(&format!("{}.info.json", base), &album));
        script.push(format!("echo '[download] Destination: {}.webm'", base));
        script.push("echo '[download] 100% of 3.00MiB in 00:00:02'".to_string());
        script.push(format!("echo '[ExtractAudio] Destination: {}.opus'", base));
        script.push(format!("echo audio > '{}.opus'", base));
    }
    script.push(write_json("Record [OLAK5uy].info.json", &json!({ "id": "OLAK5uy" })));
    let settings = harness.settings(&script.join("\n"));

    let outcome = archive_url(
        "https://music.youtube.com/playlist?list=OLAK5uy",
        &settings,
        &AuxRegistry::new(),
    )
    .await;

    assert!(outcome.success, "unexpected failure: {:?}", outcome.error);
    let item = harness.dest_path().join("Band - Record (2001) [OLAK5uy]");
    assert_eq!(outcome.destination_path.as_deref(), Some(item.as_path()));
    assert_eq!(
        list_names(&item),
        vec![
            "01. Track 1 [a1].opus",
            "02. Track 2 [a2].opus",
            "03. Track 3 [a3].opus",
            "Metadata",
        ]
    );
    assert_eq!(
        list_names(&item.join("Metadata")),
        vec![
            "01. Track 1 [a1].info.json",
            "02. Track 2 [a2].info.json",
            "03. Track 3 [a3].info.json",
            "Record [OLAK5uy].info.json",
            "log.txt",
        ]
    );
}

#[tokio::test]
async fn test_unable_to_download_video_data_fails_as_host_unreachable() {
    let harness = Harness::new();
    let settings = harness.settings(
        "echo '[download] Destination: Y.mp4'\n\
         echo 'ERROR: unable to download video data: HTTP Error 403: Forbidden' 1>&2\n\
         exit 1",
    );

    let outcome = archive_url("https://youtu.be/abc", &settings, &AuxRegistry::new()).await;

    assert!(!outcome.success);
    assert_eq!(outcome.destination_path, None);
    let failure = outcome.error.expect("failure recorded");
    assert_eq!(failure.reason.log_error_kind(), Some(LogErrorKind::HostUnreachable));
    assert_eq!(failure.basename.as_deref(), Some("Y"));
    assert!(harness.dest_entries().is_empty());
    assert_eq!(harness.workspace_count(), 0);
}

#[tokio::test]
async fn test_unhandled_exception_in_tool() {
    let harness = Harness::new();
    let settings = harness.settings(
        "echo 'Traceback (most recent call last):' 1>&2\n\
         echo '  File \"yt_dlp/__main__.py\", line 1' 1>&2\n\
         exit 1",
    );

    let outcome = archive_url("https://example.com/v/1", &settings, &AuxRegistry::new()).await;

    let failure = outcome.error.expect("failure recorded");
    assert_eq!(failure.reason.log_error_kind(), Some(LogErrorKind::Exception));
}

#[tokio::test]
async fn test_non_zero_exit_without_known_phrase_is_process_failure() {
    let harness = Harness::new();
    let settings = harness.settings("echo '[download] 100% of 1.00MiB'\nexit 2");

    let outcome = archive_url("https://example.com/v/2", &settings, &AuxRegistry::new()).await;

    let failure = outcome.error.expect("failure recorded");
    assert!(matches!(failure.reason, AppError::Process(_)));
}

#[tokio::test]
async fn test_existing_item_gets_numeric_suffix() {
    let harness = Harness::new();
    std::fs::create_dir(harness.dest_path().join("X")).unwrap();
    std::fs::write(harness.dest_path().join("X").join("keep.txt"), "old").unwrap();
    let settings = harness.settings(&merged_video_script("X", &video_info()));
    let urls = vec![
        "https://www.youtube.com/watch?v=abc".to_string(),
        "https://www.youtube.com/watch?v=abc".to_string(),
    ];

    let outcomes = archive_urls(&urls, &settings, &AuxRegistry::new()).await.unwrap();

    assert!(outcomes.iter().all(|o| o.success));
    assert_eq!(harness.dest_entries(), vec!["X", "X 2", "X 3"]);
    assert_eq!(
        std::fs::read_to_string(harness.dest_path().join("X").join("keep.txt")).unwrap(),
        "old"
    );
    assert!(harness.dest_path().join("X 3").join("X.mp4").is_file());
}

#[tokio::test]
async fn test_keep_tmp_retains_workspace() {
    let harness = Harness::new();
    let settings = harness
        .settings(&merged_video_script("X", &video_info()))
        .options(DownloadOptions {
            date_first: false,
            keep_workspace: true,
        });

    let outcome = archive_url("https://www.youtube.com/watch?v=abc", &settings, &AuxRegistry::new()).await;

    assert!(outcome.success);
    assert_eq!(harness.workspace_count(), 1);
}

#[tokio::test]
async fn test_batch_continues_after_a_failed_url() {
    let harness = Harness::new();
    let script = format!(
        "case \"$*\" in\n*bad*) echo 'ERROR: Requested format is not available'; exit 1 ;;\n*)\n{}\n;;\nesac",
        merged_video_script("X", &video_info())
    );
    let settings = harness.settings(&script);
    let urls = vec![
        "https://www.youtube.com/watch?v=bad".to_string(),
        "https://www.youtube.com/watch?v=abc".to_string(),
    ];

    let outcomes = archive_urls(&urls, &settings, &AuxRegistry::new()).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0].error.as_ref().and_then(|f| f.reason.log_error_kind()),
        Some(LogErrorKind::FormatUnavailable)
    );
    assert!(outcomes[1].success);
}

#[tokio::test]
async fn test_date_first_reaches_the_downloader() {
    let harness = Harness::new();
    let settings = harness
        .settings("printf '%s\\n' \"$@\" > \"$0.args\"\nexit 1")
        .options(DownloadOptions {
            date_first: true,
            keep_workspace: false,
        });

    let _ = archive_url("https://example.com/v/3", &settings, &AuxRegistry::new()).await;

    let args = std::fs::read_to_string(harness.tools.path().join("fake-yt-dlp.args")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args.last(), Some(&"https://example.com/v/3"));
    let output = args.iter().position(|a| *a == "--output").expect("output template flag");
    assert!(args[output + 1].starts_with("%(upload_date)s"));
}
