/*!
 * Tests of whole runs: directory scanning, failure isolation, cancellation
 * and the background worker handle
 */

use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use amarelo::app_controller::RunTarget;
use amarelo::engines::mock::{MockBehavior, MockRecognizer};
use amarelo::progress::{CancellationFlag, EventSender, RunStatus, WorkflowEvent};
use crate::common;

fn drain(rx: &mut UnboundedReceiver<WorkflowEvent>) -> Vec<WorkflowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn finished(events: &[WorkflowEvent]) -> Option<(RunStatus, String)> {
    match events.last() {
        Some(WorkflowEvent::Finished { status, message }) => Some((*status, message.clone())),
        _ => None,
    }
}

#[tokio::test]
async fn test_run_withDirectory_shouldProcessEveryVideoInOrder() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_test_video(input.path(), "b.mkv")?;
    common::create_test_video(input.path(), "a.mp4")?;
    common::create_test_subtitle(input.path(), "a.srt")?;
    common::create_test_file(input.path(), "readme.txt", "ignored")?;
    let (controller, recognizer, loader) = common::mock_controller(
        common::test_config(output.path()),
        MockRecognizer::working(common::sample_transcript(), Vec::new()),
        None,
    );
    let (events, mut rx) = EventSender::channel();

    let status = controller.run(RunTarget::Directory(input.path().to_path_buf()), &events, &CancellationFlag::new()).await;

    assert_eq!(status, RunStatus::Succeeded);
    assert!(output.path().join("a_Amarelo.srt").is_file());
    assert!(output.path().join("b_Amarelo.srt").is_file());
    assert_eq!(loader.load_count(), 1);
    assert_eq!(recognizer.probe_calls(), 1);
    assert_eq!(recognizer.transcribe_calls(), 1);

    let events = drain(&mut rx);
    assert_eq!(
        events.first(),
        Some(&WorkflowEvent::Progress { current: 0, total: 2, message: "Analyzing: a.mp4".to_string() })
    );
    assert!(events.contains(&WorkflowEvent::Progress { current: 1, total: 2, message: "Analyzing: b.mkv".to_string() }));
    assert!(events.contains(&WorkflowEvent::Progress { current: 2, total: 2, message: "Done".to_string() }));
    assert_eq!(events.iter().filter(|e| matches!(e, WorkflowEvent::Preview(_))).count(), 2);
    assert_eq!(finished(&events), Some((RunStatus::Succeeded, "Processing of 2 files completed.".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_run_withEmptyDirectory_shouldFinishFailed() -> Result<()> {
    let input = common::create_temp_dir()?;
    common::create_test_subtitle(input.path(), "orphan.srt")?;
    let (controller, recognizer, _) = common::mock_controller(
        common::test_config(input.path()),
        MockRecognizer::working(Vec::new(), Vec::new()),
        None,
    );
    let (events, mut rx) = EventSender::channel();

    let status = controller.run(RunTarget::Directory(input.path().to_path_buf()), &events, &CancellationFlag::new()).await;

    assert_eq!(status, RunStatus::Failed);
    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    let (_, message) = finished(&events).ok_or_else(|| anyhow::anyhow!("missing Finished event"))?;
    assert!(message.contains("No video files found"), "{}", message);
    assert_eq!(recognizer.transcribe_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_run_withMissingDirectory_shouldFinishFailed() -> Result<()> {
    let output = common::create_temp_dir()?;
    let (controller, _, _) = common::mock_controller(
        common::test_config(output.path()),
        MockRecognizer::working(Vec::new(), Vec::new()),
        None,
    );
    let (events, mut rx) = EventSender::channel();

    let status = controller
        .run(RunTarget::Directory(PathBuf::from("/no/such/amarelo/dir")), &events, &CancellationFlag::new())
        .await;

    assert_eq!(status, RunStatus::Failed);
    assert!(matches!(finished(&drain(&mut rx)), Some((RunStatus::Failed, _))));
    Ok(())
}

#[tokio::test]
async fn test_run_withNoFiles_shouldFinishFailed() -> Result<()> {
    let output = common::create_temp_dir()?;
    let (controller, _, _) = common::mock_controller(
        common::test_config(output.path()),
        MockRecognizer::working(Vec::new(), Vec::new()),
        None,
    );
    let (events, mut rx) = EventSender::channel();

    let status = controller.run(RunTarget::Files(Vec::new()), &events, &CancellationFlag::new()).await;

    assert_eq!(status, RunStatus::Failed);
    assert_eq!(drain(&mut rx).len(), 1);
    Ok(())
}

/// One failing video is reported and skipped; the others are still written
#[tokio::test]
async fn test_run_withOneFailingVideo_shouldIsolateTheFailure() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    common::create_test_video(input.path(), "a.mp4")?;
    common::create_test_video(input.path(), "broken.mp4")?;
    common::create_test_video(input.path(), "c.mp4")?;
    let recognizer = MockRecognizer::new(MockBehavior::FailOnName("broken"), common::sample_transcript(), Vec::new());
    let (controller, _, _) = common::mock_controller(common::test_config(output.path()), recognizer, None);
    let (events, mut rx) = EventSender::channel();

    let status = controller.run(RunTarget::Directory(input.path().to_path_buf()), &events, &CancellationFlag::new()).await;

    assert_eq!(status, RunStatus::Failed);
    assert!(output.path().join("a_Amarelo.srt").is_file());
    assert!(!output.path().join("broken_Amarelo.srt").exists());
    assert!(output.path().join("c_Amarelo.srt").is_file());

    let events = drain(&mut rx);
    let failures: Vec<(usize, String)> = events.iter()
        .filter_map(|e| match e {
            WorkflowEvent::VideoFailed { index, video, .. } => Some((*index, video.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![(1, "broken.mp4".to_string())]);
    assert_eq!(finished(&events), Some((RunStatus::Failed, "Processed 2 of 3 files, 1 failed.".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_run_withCancelledFlag_shouldStopBeforeNextVideo() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    let video = common::create_test_video(input.path(), "a.mp4")?;
    let (controller, recognizer, _) = common::mock_controller(
        common::test_config(output.path()),
        MockRecognizer::working(common::sample_transcript(), Vec::new()),
        None,
    );
    let (events, mut rx) = EventSender::channel();
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let status = controller.run(RunTarget::Files(vec![video]), &events, &cancel).await;

    assert_eq!(status, RunStatus::Cancelled);
    assert!(!status.is_success());
    assert_eq!(recognizer.transcribe_calls(), 0);
    assert_eq!(
        finished(&drain(&mut rx)),
        Some((RunStatus::Cancelled, "Cancelled after 0 of 1 files".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn test_spawn_withFiles_shouldStreamEventsAndJoinWithStatus() -> Result<()> {
    let input = common::create_temp_dir()?;
    let output = common::create_temp_dir()?;
    let first = common::create_test_video(input.path(), "one.mp4")?;
    let second = common::create_test_video(input.path(), "two.mp4")?;
    let (controller, recognizer, loader) = common::mock_controller(
        common::test_config(output.path()),
        MockRecognizer::working(common::sample_transcript(), Vec::new()),
        None,
    );

    let mut handle = controller.spawn(RunTarget::Files(vec![first, second]));

    let mut events = Vec::new();
    while let Some(event) = handle.events.recv().await {
        events.push(event);
    }
    let status = handle.join.await?;

    assert_eq!(status, RunStatus::Succeeded);
    assert_eq!(finished(&events).map(|(s, _)| s), Some(RunStatus::Succeeded));
    assert_eq!(loader.load_count(), 1);
    assert_eq!(recognizer.transcribe_calls(), 2);
    Ok(())
}

#[test]
fn test_cancellation_flag_clones_shouldShareState() {
    let flag = CancellationFlag::new();
    let clone = flag.clone();
    assert!(!flag.is_cancelled());

    clone.cancel();

    assert!(flag.is_cancelled());
}

#[test]
fn test_run_status_display_shouldBeLowercase() {
    assert_eq!(RunStatus::Succeeded.to_string(), "succeeded");
    assert_eq!(RunStatus::Cancelled.to_string(), "cancelled");
    assert!(RunStatus::Succeeded.is_success());
    assert!(!RunStatus::Failed.is_success());
}
