//! Dispatcher tests against the filesystem store and the in-memory engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use vedit_media::testing::{audio_descriptor, video_descriptor, FakeEngine};
use vedit_models::{EncodingConfig, JobId, JobRequest, TaskOutput};
use vedit_storage::FsObjectStore;
use vedit_worker::Dispatcher;

struct Bucket {
    dir: TempDir,
}

impl Bucket {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("bucket dir"),
        }
    }

    fn put(&self, key: &str, data: &[u8]) {
        let path = self.dir.path().join(key);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, data).expect("write object");
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.path().join(key)
    }

    fn store(&self) -> Arc<FsObjectStore> {
        Arc::new(FsObjectStore::new(self.dir.path()))
    }
}

fn dispatcher(bucket: &Bucket, engine: FakeEngine, work: &Path) -> Dispatcher {
    Dispatcher::new(
        Arc::new(engine),
        bucket.store(),
        work,
        EncodingConfig::default(),
    )
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).expect("read work dir").next().is_none()
}

#[tokio::test]
async fn test_remote_concatenate_with_shared_basenames() {
    let bucket = Bucket::new();
    bucket.put("day1/clip.mp4", b"first");
    bucket.put("day2/clip.mp4", b"second");
    bucket.put("day3/clip.mp4", b"third");
    let work = TempDir::new().expect("work dir");

    let engine = FakeEngine::new().with_fallback(video_descriptor(640, 360, 5.0));
    let dispatcher = dispatcher(&bucket, engine, work.path());

    let request = JobRequest::from_parts(
        "concatenate",
        json!({
            "inputs": [
                {"remote": "day1/clip.mp4"},
                {"remote": "day2/clip.mp4"},
                {"remote": "day3/clip.mp4"}
            ],
            "output": {"remote": "joined/clip.mp4"}
        }),
    )
    .expect("valid request");

    let output = dispatcher
        .execute(&JobId::new(), &request, false)
        .await
        .expect("concatenate");

    assert_eq!(output, TaskOutput::Flag(true));
    assert!(bucket.path("joined/clip.mp4").exists());
    assert!(is_empty_dir(work.path()));
}

#[tokio::test]
async fn test_remote_add_audio_fetches_both_inputs() {
    let bucket = Bucket::new();
    bucket.put("videos/v.mp4", b"video");
    bucket.put("music/track.wav", b"audio");
    let work = TempDir::new().expect("work dir");

    // The staged video and audio share the fallback, so give it an audio stream.
    let mut descriptor = video_descriptor(320, 240, 6.0);
    descriptor.has_audio = true;
    let engine = FakeEngine::new().with_fallback(descriptor);
    let dispatcher = dispatcher(&bucket, engine, work.path());

    let output = dispatcher
        .invoke(
            "add_audio",
            json!({
                "video": {"remote": "videos/v.mp4"},
                "audio": {"remote": "music/track.wav"},
                "output": {"remote": "videos/v_scored.mp4"},
                "loop_audio": true,
                "keep_original_audio": true,
                "original_audio_volume": 0.3
            }),
        )
        .await
        .expect("add audio");

    assert_eq!(output, TaskOutput::Flag(true));
    assert!(bucket.path("videos/v_scored.mp4").exists());
    assert!(is_empty_dir(work.path()));
}

#[tokio::test]
async fn test_incompatible_remote_inputs_leave_nothing_behind() {
    let bucket = Bucket::new();
    bucket.put("a.mp4", b"a");
    bucket.put("b.mp4", b"b");
    let work = TempDir::new().expect("work dir");

    // Every staged file probes identically, so use a local second input with
    // its own dimensions.
    let local = work.path().join("local.mp4");
    std::fs::write(&local, b"local").expect("write local");
    let engine = FakeEngine::new()
        .with_fallback(video_descriptor(320, 240, 2.0))
        .with_media(&local, video_descriptor(640, 480, 2.0));
    let dispatcher = dispatcher(&bucket, engine, work.path());

    let request = JobRequest::from_parts(
        "concatenate",
        json!({
            "inputs": [{"remote": "a.mp4"}, {"local": local}],
            "output": {"remote": "out.mp4"}
        }),
    )
    .expect("valid request");

    let err = dispatcher
        .execute(&JobId::new(), &request, false)
        .await
        .expect_err("dimensions differ");

    assert_eq!(err.kind(), "compatibility");
    assert!(!bucket.path("out.mp4").exists());
    // Only the local input remains in the work dir.
    assert_eq!(std::fs::read_dir(work.path()).expect("read").count(), 1);
}

#[tokio::test]
async fn test_remote_audio_without_stream_fails_cleanly() {
    let bucket = Bucket::new();
    bucket.put("v.mp4", b"video");
    bucket.put("silence.mp4", b"no audio");
    let work = TempDir::new().expect("work dir");

    let engine = FakeEngine::new().with_fallback(video_descriptor(320, 240, 4.0));
    let dispatcher = dispatcher(&bucket, engine, work.path());

    let err = dispatcher
        .invoke(
            "add_audio",
            json!({
                "video": {"remote": "v.mp4"},
                "audio": {"remote": "silence.mp4"},
                "output": {"remote": "out.mp4"}
            }),
        )
        .await
        .expect_err("audio input has no audio stream");

    assert_eq!(err.kind(), "processing");
    assert!(!bucket.path("out.mp4").exists());
    assert!(is_empty_dir(work.path()));
}

#[tokio::test]
async fn test_local_resize_writes_in_place() {
    let bucket = Bucket::new();
    let work = TempDir::new().expect("work dir");
    let input = work.path().join("in.mp4");
    let output = work.path().join("out.mp4");
    std::fs::write(&input, b"source").expect("write input");

    let engine = FakeEngine::new().with_media(&input, video_descriptor(1920, 1080, 3.0));
    let dispatcher = dispatcher(&bucket, engine, work.path());

    let result = dispatcher
        .invoke(
            "resize",
            json!({
                "input": {"local": input},
                "output": {"local": output},
                "height": 540
            }),
        )
        .await
        .expect("resize");

    assert_eq!(result, TaskOutput::Flag(true));
    assert!(output.exists());
}

#[tokio::test]
async fn test_audio_descriptor_has_no_video() {
    // media_info on an audio-only file still succeeds with unknown dimensions.
    let bucket = Bucket::new();
    bucket.put("sound.wav", b"wav");
    let work = TempDir::new().expect("work dir");

    let engine = FakeEngine::new().with_fallback(audio_descriptor(3.5));
    let dispatcher = dispatcher(&bucket, engine, work.path());

    let result = dispatcher
        .invoke("media_info", json!({"input": {"remote": "sound.wav"}}))
        .await
        .expect("media info");

    match result {
        TaskOutput::Info(info) => {
            assert_eq!(info.resolution, "unknownxunknown");
            assert_eq!(info.duration, "3.500000");
            assert_eq!(info.format, "wav");
        }
        other => panic!("unexpected output {:?}", other),
    }
}
