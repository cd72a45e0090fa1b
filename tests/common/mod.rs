//! Shared fixtures for the integration tests
//!
//! Archive jobs are driven by a stand-in downloader: a shell script that
//! prints a yt-dlp style log and creates the files the real tool would.

#![allow(dead_code)]

use serde_json::Value;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

use vidarc::core::config::archive;
use vidarc::ArchiveSettings;

/// A fake downloader script plus a destination root for one test.
pub struct Harness {
    pub tools: TempDir,
    pub dest: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            tools: tempfile::tempdir().expect("tools dir"),
            dest: tempfile::tempdir().expect("dest dir"),
        }
    }

    /// Writes `body` as an executable `/bin/sh` script and returns settings
    /// that run it instead of yt-dlp.
    pub fn settings(&self, body: &str) -> ArchiveSettings {
        let exe = write_script(self.tools.path(), "fake-yt-dlp", body);
        ArchiveSettings::new(self.dest.path()).executable(exe).echo_output(false)
    }

    pub fn dest_path(&self) -> &Path {
        self.dest.path()
    }

    /// Names in the destination root, workspaces excluded, sorted.
    pub fn dest_entries(&self) -> Vec<String> {
        list_names(self.dest.path())
            .into_iter()
            .filter(|n| !n.starts_with(archive::WORKSPACE_PREFIX))
            .collect()
    }

    pub fn workspace_count(&self) -> usize {
        list_names(self.dest.path())
            .iter()
            .filter(|n| n.starts_with(archive::WORKSPACE_PREFIX))
            .count()
    }
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod script");
    path.to_string_lossy().into_owned()
}

/// Sorted file names directly inside `dir`.
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Shell snippet that writes `value` as JSON to `file` in the working directory.
pub fn write_json(file: &str, value: &Value) -> String {
    format!("cat > '{}' <<'JSON'\n{}\nJSON", file, value)
}

/// Log and files of a single video whose formats get merged into `<base>.mp4`.
pub fn merged_video_script(base: &str, info: &Value) -> String {
    format!(
        r#"echo '[youtube] abc: Downloading webpage'
echo '[info] Writing video metadata as JSON to: {base}.info.json'
{json}
echo 'thumb' > '{base}.webp'
echo '[download] Destination: {base}.f137.mp4'
echo '[download]  50.0% of 10.00MiB at 1.00MiB/s ETA 00:05'
echo '[download] 100% of 10.00MiB in 00:00:10'
echo '[download] Destination: {base}.f251.webm'
echo '[download] 100% of 1.00MiB in 00:00:01'
echo '[Merger] Merging formats into "{base}.mp4"'
echo 'video' > '{base}.mp4'
echo 'description' > '{base}.description'"#,
        base = base,
        json = write_json(&format!("{}.info.json", base), info),
    )
}

/// Encodes `data` like a page-embedded JS string: JSON with `\xHH` escapes.
pub fn js_escaped(data: &Value) -> String {
    data.to_string()
        .chars()
        .map(|c| match c {
            '{' | '}' | '"' | '[' | ']' | '\'' | '\\' => format!("\\x{:02x}", c as u32),
            other => other.to_string(),
        })
        .collect()
}

/// A collection page whose header thumbnail points at `thumb_url`.
pub fn collection_page(thumb_url: &str) -> String {
    let data = serde_json::json!({
        "header": { "musicDetailHeaderRenderer": { "thumbnail": { "croppedSquareThumbnailRenderer": {
            "thumbnail": { "thumbnails": [
                { "url": thumb_url.replace("w544-h544", "w60-h60"), "width": 60, "height": 60 },
                { "url": thumb_url, "width": 544, "height": 544 }
            ] }
        } } } }
    });
    format!(
        r#"<!DOCTYPE html><html><head><title>Album</title></head><body>
<script>window.ytcfg = {{}};</script>
<script nonce="n">try {{ const initialData = []; initialData.push({{path: '\/browse', params: JSON.parse('\x7b\x7d'), data: '{}'}}); ytcfg.set({{'X': 1}}); }} catch (e) {{}}</script>
</body></html>"#,
        js_escaped(&data)
    )
}

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
