//! End-to-end media tests against a real FFmpeg install.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use vedit_media::{probe_media, FfmpegEngine};
use vedit_models::{EncodingConfig, TaskOutput};
use vedit_storage::FsObjectStore;
use vedit_worker::Dispatcher;

/// Render a `testsrc` clip, optionally with a sine tone.
fn generate_video(dir: &Path, name: &str, size: &str, seconds: u32, with_audio: bool) -> PathBuf {
    let path = dir.join(name);
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=size={}:rate=25:duration={}", size, seconds));
    if with_audio {
        cmd.args(["-f", "lavfi", "-i"])
            .arg(format!("sine=frequency=440:duration={}", seconds))
            .args(["-c:a", "aac"]);
    }
    cmd.args(["-c:v", "libx264", "-pix_fmt", "yuv420p"]).arg(&path);

    let status = cmd.status().expect("ffmpeg runs");
    assert!(status.success(), "failed to generate {}", name);
    path
}

fn generate_tone(dir: &Path, name: &str, seconds: u32) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i"])
        .arg(format!("sine=frequency=220:duration={}", seconds))
        .arg(&path)
        .status()
        .expect("ffmpeg runs");
    assert!(status.success(), "failed to generate {}", name);
    path
}

fn dispatcher(dir: &Path) -> Dispatcher {
    Dispatcher::new(
        Arc::new(FfmpegEngine::new().with_timeout(120)),
        Arc::new(FsObjectStore::new(dir.join("bucket"))),
        dir.join("work"),
        EncodingConfig::default(),
    )
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_resize_keeps_aspect_ratio() {
    let dir = TempDir::new().expect("temp dir");
    let input = generate_video(dir.path(), "in.mp4", "320x240", 2, false);
    let output = dir.path().join("small.mp4");

    let result = dispatcher(dir.path())
        .invoke(
            "resize",
            json!({"input": {"local": input}, "output": {"local": output}, "width": 160}),
        )
        .await
        .expect("resize");
    assert_eq!(result, TaskOutput::Flag(true));

    let probed = probe_media(&output).await.expect("probe output");
    assert_eq!(probed.dimensions(), Some((160, 120)));
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_trim_clamps_to_clip() {
    let dir = TempDir::new().expect("temp dir");
    let input = generate_video(dir.path(), "in.mp4", "320x240", 2, true);
    let output = dir.path().join("cut.mp4");

    dispatcher(dir.path())
        .invoke(
            "trim",
            json!({
                "input": {"local": input},
                "output": {"local": output},
                "start_time": "0.5",
                "end_time": "00:01:00"
            }),
        )
        .await
        .expect("trim");

    let duration = probe_media(&output)
        .await
        .expect("probe output")
        .duration
        .expect("duration");
    assert!((duration - 1.5).abs() < 0.2, "duration was {}", duration);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_concatenate_sums_durations() {
    let dir = TempDir::new().expect("temp dir");
    let first = generate_video(dir.path(), "a.mp4", "320x240", 1, true);
    let second = generate_video(dir.path(), "b.mp4", "320x240", 2, true);
    let output = dir.path().join("joined.mp4");

    dispatcher(dir.path())
        .invoke(
            "concatenate",
            json!({
                "inputs": [{"local": first}, {"local": second}],
                "output": {"local": output}
            }),
        )
        .await
        .expect("concatenate");

    let probed = probe_media(&output).await.expect("probe output");
    assert!(probed.has_audio);
    let duration = probed.duration.expect("duration");
    assert!((duration - 3.0).abs() < 0.2, "duration was {}", duration);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_concatenate_rejects_mismatched_sizes() {
    let dir = TempDir::new().expect("temp dir");
    let first = generate_video(dir.path(), "a.mp4", "320x240", 1, false);
    let second = generate_video(dir.path(), "b.mp4", "160x240", 1, false);

    let err = dispatcher(dir.path())
        .invoke(
            "concatenate",
            json!({
                "inputs": [{"local": first}, {"local": second}],
                "output": {"local": dir.path().join("joined.mp4")}
            }),
        )
        .await
        .expect_err("sizes differ");
    assert_eq!(err.kind(), "compatibility");
    assert!(!dir.path().join("joined.mp4").exists());
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_add_audio_loops_to_video_length() {
    let dir = TempDir::new().expect("temp dir");
    let video = generate_video(dir.path(), "v.mp4", "320x240", 3, false);
    let tone = generate_tone(dir.path(), "tone.wav", 1);
    let output = dir.path().join("scored.mp4");

    dispatcher(dir.path())
        .invoke(
            "add_audio",
            json!({
                "video": {"local": video},
                "audio": {"local": tone},
                "output": {"local": output},
                "loop_audio": true,
                "volume": 0.5
            }),
        )
        .await
        .expect("add audio");

    let probed = probe_media(&output).await.expect("probe output");
    assert!(probed.has_audio);
    let duration = probed.duration.expect("duration");
    assert!((duration - 3.0).abs() < 0.2, "duration was {}", duration);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_remote_transcode_and_media_info() {
    let dir = TempDir::new().expect("temp dir");
    let bucket = dir.path().join("bucket");
    std::fs::create_dir_all(bucket.join("in")).expect("bucket dir");
    generate_video(&bucket.join("in"), "clip.mp4", "320x240", 2, true);

    let dispatcher = dispatcher(dir.path());

    let source = dispatcher
        .invoke("media_info", json!({"input": {"remote": "in/clip.mp4"}}))
        .await
        .expect("source media info");
    match source {
        TaskOutput::Info(info) => {
            assert_eq!(info.resolution, "320x240");
            let duration: f64 = info.duration.parse().expect("numeric duration");
            assert!((duration - 2.0).abs() < 0.1, "duration was {}", duration);
        }
        other => panic!("unexpected output {:?}", other),
    }

    let result = dispatcher
        .invoke(
            "transcode",
            json!({
                "input": {"remote": "in/clip.mp4"},
                "output": {"remote": "out/clip.mkv"},
                "target_format": "matroska"
            }),
        )
        .await
        .expect("transcode");
    assert!(matches!(result, TaskOutput::Message(_)));
    assert!(bucket.join("out/clip.mkv").exists());

    let info = dispatcher
        .invoke("media_info", json!({"input": {"remote": "out/clip.mkv"}}))
        .await
        .expect("media info");
    match info {
        TaskOutput::Info(info) => {
            assert_eq!(info.resolution, "320x240");
            assert!(info.format.contains("matroska"));
            let duration: f64 = info.duration.parse().expect("numeric duration");
            assert!((duration - 2.0).abs() < 0.2, "duration was {}", duration);
        }
        other => panic!("unexpected output {:?}", other),
    }

    let leftovers = std::fs::read_dir(dir.path().join("work"))
        .expect("work dir")
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_concatenate_pads_silent_input() {
    let dir = TempDir::new().expect("temp dir");
    let voiced = generate_video(dir.path(), "a.mp4", "320x240", 1, true);
    let silent = generate_video(dir.path(), "b.mp4", "320x240", 2, false);
    let output = dir.path().join("joined.mp4");

    dispatcher(dir.path())
        .invoke(
            "concatenate",
            json!({
                "inputs": [{"local": voiced}, {"local": silent}],
                "output": {"local": output}
            }),
        )
        .await
        .expect("concatenate");

    let probed = probe_media(&output).await.expect("probe output");
    assert!(probed.has_audio);
    let duration = probed.duration.expect("duration");
    assert!((duration - 3.0).abs() < 0.2, "duration was {}", duration);
}

#[tokio::test]
#[ignore = "requires ffmpeg"]
async fn test_unknown_codec_reports_diagnostic() {
    let dir = TempDir::new().expect("temp dir");
    let input = generate_video(dir.path(), "in.mp4", "320x240", 1, false);

    let err = dispatcher(dir.path())
        .invoke(
            "transcode",
            json!({
                "input": {"local": input},
                "output": {"local": dir.path().join("out.bin")},
                "target_format": "no_such_muxer"
            }),
        )
        .await
        .expect_err("unknown muxer");
    assert_eq!(err.kind(), "processing");
    assert!(err.diagnostic().is_some());
}
