//! Photo operations against the scripted engine: side-effecting listing
//! with real temp files, batch-stop semantics, and rejected uploads.

mod common;

use std::time::Duration;

use common::{statuses, EditEngine, NoEngine, SingleContext, Step};
use keyedit_core::{EditError, KeyHandle};
use keyedit_ops::{Config, KeyOps, OpError};
use serial_test::serial;
use tokio_util::sync::CancellationToken;

fn prompts(count: usize) -> Vec<Step> {
    (0..count)
        .map(|_| Step::Status("GET_LINE", "keyedit.prompt"))
        .collect()
}

fn config_with(photo_env: &str, temp_dir: &std::path::Path) -> Config {
    Config {
        photo_env: photo_env.to_string(),
        temp_dir: temp_dir.to_path_buf(),
        ..Config::default()
    }
}

#[tokio::test]
#[serial]
async fn load_photos_skips_uids_without_an_image() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_with("KEYEDIT_PHOTO_LOAD_TEST", temp.path());

    // uid 1 renders nothing; uid 2's image lands just before the prompt
    // that follows its showphoto.
    let mut steps = prompts(5);
    steps.push(Step::Effect(Box::new(|| {
        let path = std::env::var("KEYEDIT_PHOTO_LOAD_TEST").unwrap();
        std::fs::write(path, b"\xff\xd8photo-two").unwrap();
    })));
    steps.extend(prompts(2));

    let engine = EditEngine::new(steps);
    let outbound = engine.outbound.clone();
    let ops = KeyOps::new(SingleContext::new(engine), &config);

    let key = KeyHandle::new("1A2B3C4D5E6F7081").with_uid_slots(2);
    let photos = ops
        .load_photos(&key, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(photos.len(), 1);
    assert_eq!(photos[0].uid_index, 2);
    assert_eq!(photos[0].image, b"\xff\xd8photo-two");
    assert_eq!(
        outbound.text(),
        "uid 1\nshowphoto\nuid 1\nuid 2\nshowphoto\nuid 2\nquit\n"
    );
    assert!(
        std::env::var_os("KEYEDIT_PHOTO_LOAD_TEST").is_none(),
        "the session environment is restored"
    );
}

#[tokio::test]
#[serial]
async fn load_photos_reports_progress_when_the_batch_stops() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_with("KEYEDIT_PHOTO_BATCH_TEST", temp.path());

    // uid 1 yields a photo; the conversation then drifts while uid 2 is
    // being selected.
    let mut steps = prompts(2);
    steps.push(Step::Effect(Box::new(|| {
        let path = std::env::var("KEYEDIT_PHOTO_BATCH_TEST").unwrap();
        std::fs::write(path, b"\xff\xd8photo-one").unwrap();
    })));
    steps.extend(prompts(2));
    steps.push(Step::Status("GET_LINE", "keygen.valid"));

    let engine = EditEngine::new(steps);
    let ops = KeyOps::new(SingleContext::new(engine), &config);

    let key = KeyHandle::new("1A2B3C4D5E6F7081").with_uid_slots(2);
    let result = ops.load_photos(&key, CancellationToken::new()).await;

    match result {
        Err(OpError::Interrupted { completed, source }) => {
            assert_eq!(completed, 1, "one photo was collected before the stop");
            assert!(matches!(*source, OpError::Edit(EditError::Unexpected { .. })));
        }
        other => panic!("expected an interrupted batch, got {other:?}"),
    }
}

#[tokio::test]
#[serial]
async fn load_photos_cancellation_skips_the_remaining_uids() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_with("KEYEDIT_PHOTO_CANCEL_TEST", temp.path());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    // Cancellation lands while uid 1 is being shown; the machine finishes
    // that uid and quits instead of selecting uid 2.
    let mut steps = prompts(3);
    steps.push(Step::Effect(Box::new(move || {
        trigger.cancel();
        // Give the watcher task time to relay the token into the session.
        std::thread::sleep(Duration::from_millis(100));
    })));
    steps.extend(prompts(1));

    let engine = EditEngine::new(steps);
    let outbound = engine.outbound.clone();
    let ops = KeyOps::new(SingleContext::new(engine), &config);

    let key = KeyHandle::new("1A2B3C4D5E6F7081").with_uid_slots(3);
    let result = ops.load_photos(&key, cancel).await;

    assert!(matches!(result, Err(OpError::Cancelled)));
    assert_eq!(outbound.text(), "uid 1\nshowphoto\nuid 1\nquit\n");
}

#[tokio::test]
async fn load_photos_with_no_uid_slots_is_a_noop() {
    let ops = KeyOps::new(std::sync::Arc::new(NoEngine), &Config::default());
    let key = KeyHandle::new("1A2B3C4D5E6F7081");
    let photos = ops
        .load_photos(&key, CancellationToken::new())
        .await
        .unwrap();
    assert!(photos.is_empty());
}

#[tokio::test]
async fn add_photo_sends_the_file_path() {
    let temp = tempfile::tempdir().unwrap();
    let image = temp.path().join("face.jpg");
    std::fs::write(&image, b"\xff\xd8jpeg").unwrap();

    let engine = EditEngine::new(statuses(&[
        ("GET_LINE", "keyedit.prompt"),
        ("GET_LINE", "photoid.jpeg.add"),
        ("GET_LINE", "keyedit.prompt"),
        ("GET_BOOL", "keyedit.save.okay"),
    ]));
    let outbound = engine.outbound.clone();
    let ops = KeyOps::new(SingleContext::new(engine), &Config::default());

    let key = KeyHandle::new("1A2B3C4D5E6F7081");
    ops.add_photo(&key, &image).await.unwrap();
    assert_eq!(
        outbound.text(),
        format!("addphoto\n{}\nquit\nY\n", image.display())
    );
}

#[tokio::test]
async fn add_photo_maps_a_rerequest_to_file_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let image = temp.path().join("not-a-photo.txt");
    std::fs::write(&image, b"plain text").unwrap();

    let engine = EditEngine::new(statuses(&[
        ("GET_LINE", "keyedit.prompt"),
        ("GET_LINE", "photoid.jpeg.add"),
        ("GET_LINE", "photoid.jpeg.add"),
    ]));
    let ops = KeyOps::new(SingleContext::new(engine), &Config::default());

    let key = KeyHandle::new("1A2B3C4D5E6F7081");
    let result = ops.add_photo(&key, &image).await;
    assert!(matches!(
        result,
        Err(OpError::Edit(EditError::FileRejected))
    ));
}

#[tokio::test]
async fn add_photo_rejects_missing_and_empty_files() {
    let temp = tempfile::tempdir().unwrap();
    let ops = KeyOps::new(std::sync::Arc::new(NoEngine), &Config::default());
    let key = KeyHandle::new("1A2B3C4D5E6F7081");

    let missing = temp.path().join("nowhere.jpg");
    let result = ops.add_photo(&key, &missing).await;
    assert!(matches!(result, Err(OpError::InvalidParam { .. })));

    let empty = temp.path().join("empty.jpg");
    std::fs::write(&empty, b"").unwrap();
    let result = ops.add_photo(&key, &empty).await;
    assert!(matches!(result, Err(OpError::InvalidParam { .. })));
}
