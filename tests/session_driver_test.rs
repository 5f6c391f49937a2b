//! Integration tests for the session scheduling loop.

#![allow(clippy::unwrap_used)]

mod common;

use common::{Harness, predictions};
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use wildguard::Error;
use wildguard::config::CaptureMode;
use wildguard::detection::Species;
use wildguard::session::{SessionCommand, SessionEvent, SessionHandle, SessionState, driver};

const FRAME_INTERVAL: Duration = Duration::from_millis(5);
const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_driver_pauses_on_detection_and_stops_on_cancel() {
    let Harness {
        controller,
        mut events,
        camera,
        log,
        ..
    } = Harness::builder()
        .script(vec![
            Ok(predictions(&[(Species::Cat, 0.1)])),
            Ok(predictions(&[(Species::Deer, 0.92)])),
        ])
        .build();

    let cancel = CancellationToken::new();
    let (handle, commands) = SessionHandle::channel();
    let task = tokio::spawn(driver::run(
        controller,
        commands,
        cancel.clone(),
        FRAME_INTERVAL,
    ));

    let detected = timeout(WAIT, async {
        while let Some(event) = events.recv().await {
            if let SessionEvent::Detection(detection) = event {
                return Some(detection);
            }
        }
        None
    })
    .await
    .unwrap()
    .unwrap();
    assert_eq!(detected.animal(), Species::Deer);

    cancel.cancel();
    let controller = timeout(WAIT, task).await.unwrap().unwrap();

    assert_eq!(controller.state(), SessionState::Paused);
    assert!(!controller.has_stream());
    assert_eq!(log.len(), 1);
    assert!(camera.streams().iter().all(|s| s.stops() == 1));

    // The command receiver is gone once the loop has exited.
    assert!(matches!(
        handle.send(SessionCommand::Resume).await,
        Err(Error::SessionClosed)
    ));
}

#[tokio::test]
async fn test_driver_runs_capture_command_and_shuts_down() {
    let Harness {
        controller,
        mut events,
        classifier,
        ..
    } = Harness::builder()
        .mode(CaptureMode::OnDemand)
        .script(vec![Ok(predictions(&[(Species::Armadillo, 0.2)]))])
        .build();

    let (handle, commands) = SessionHandle::channel();
    let task = tokio::spawn(driver::run(
        controller,
        commands,
        CancellationToken::new(),
        FRAME_INTERVAL,
    ));

    // Wait for the camera before capturing.
    timeout(WAIT, async {
        while let Some(event) = events.recv().await {
            if matches!(event, SessionEvent::StateChanged(SessionState::Live)) {
                break;
            }
        }
    })
    .await
    .unwrap();

    handle.send(SessionCommand::Capture).await.unwrap();
    let best = timeout(WAIT, async {
        while let Some(event) = events.recv().await {
            if let SessionEvent::NoDetection { best } = event {
                return best;
            }
        }
        None
    })
    .await
    .unwrap();
    assert_eq!(best.map(|p| p.label), Some(Species::Armadillo));

    handle.send(SessionCommand::Shutdown).await.unwrap();
    let controller = timeout(WAIT, task).await.unwrap().unwrap();

    assert!(!controller.has_stream());
    assert!(controller.current_detection().is_none());
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn test_cancel_interrupts_slow_model_load() {
    let Harness {
        controller,
        camera,
        gateway,
        ..
    } = Harness::builder().load_delay(Duration::from_secs(2)).build();

    let cancel = CancellationToken::new();
    let (_handle, commands) = SessionHandle::channel();
    let task = tokio::spawn(driver::run(
        controller,
        commands,
        cancel.clone(),
        FRAME_INTERVAL,
    ));

    timeout(WAIT, async {
        while gateway.loads() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    let controller = timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();

    assert_ne!(controller.state(), SessionState::Live);
    assert!(!controller.has_stream());
    assert_eq!(camera.opened(), 0);
}
