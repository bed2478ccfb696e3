//! Background task that talks to the data service.
//!
//! Runs on its own thread and tokio runtime. Owns the backend handle and
//! the change feed of the open reservation; the UI thread owns all panel
//! state and only hears about results through [`UiEvent`]s.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use orderchat_client::{ChatBackend, Subscription};
use orderchat_core::{ChangeEvent, ReservationNumber, Viewer};
use orderchat_panel::{ops, PanelConfig, SendRequest};

use crate::event::{BackendCommand, FeedStatus, UiEvent};

/// Wait for the next feed event; never resolves without a feed.
async fn next_event(feed: &mut Option<Subscription>) -> Option<ChangeEvent> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}

/// Run the backend loop until the UI asks to quit.
pub async fn run_backend(
    backend: Arc<dyn ChatBackend>,
    mut viewer: Viewer,
    config: PanelConfig,
    ui_tx: mpsc::Sender<UiEvent>,
    mut cmd_rx: mpsc::Receiver<BackendCommand>,
) {
    if viewer.session.is_none() {
        match backend.current_user().await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Session found");
                let _ = ui_tx.send(UiEvent::ViewerResolved(user.id.clone())).await;
                viewer.session = Some(user);
            }
            Ok(None) => debug!("No session, using caller identity"),
            Err(e) => warn!(error = %e, "Could not read current session"),
        }
    }
    let viewer = Arc::new(viewer);

    let mut feed: Option<Subscription> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(BackendCommand::Open(reservation)) => {
                        if let Some(mut old) = feed.take() {
                            old.close();
                        }
                        feed = open(backend.as_ref(), &reservation, &ui_tx).await;
                        if config.translate_pending_on_load {
                            ops::translate_pending(backend.clone(), reservation);
                        }
                    }
                    Some(BackendCommand::Send(request)) => {
                        spawn_send(backend.clone(), viewer.clone(), config.clone(), request, ui_tx.clone());
                    }
                    Some(BackendCommand::Quit) | None => {
                        info!("Received quit command, shutting down backend");
                        break;
                    }
                }
            }

            event = next_event(&mut feed) => {
                match event {
                    Some(event) => {
                        let reservation = event.record().reservation_number.clone();
                        if let ChangeEvent::Insert(record) = &event {
                            if record.sender_id.as_ref() != Some(&viewer.id()) && record.needs_translation() {
                                ops::request_translation(backend.clone(), record.clone());
                            }
                        }
                        if ui_tx.send(UiEvent::Change { reservation, event }).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        warn!("Change feed ended");
                        feed = None;
                        let _ = ui_tx.send(UiEvent::Feed(FeedStatus::Offline)).await;
                    }
                }
            }
        }
    }

    if let Some(mut feed) = feed {
        feed.close();
    }
    info!("Backend shutdown complete");
}

/// Subscribe, then fetch. Returns the new feed, if one could be opened.
async fn open(
    backend: &dyn ChatBackend,
    reservation: &ReservationNumber,
    ui_tx: &mpsc::Sender<UiEvent>,
) -> Option<Subscription> {
    info!(reservation = %reservation, "Opening conversation");
    let _ = ui_tx.send(UiEvent::Feed(FeedStatus::Connecting)).await;

    let feed = match backend.subscribe(reservation).await {
        Ok(feed) => {
            let _ = ui_tx.send(UiEvent::Feed(FeedStatus::Live)).await;
            Some(feed)
        }
        Err(e) => {
            warn!(reservation = %reservation, error = %e, "Change feed unavailable");
            let _ = ui_tx.send(UiEvent::Feed(FeedStatus::Offline)).await;
            let _ = ui_tx
                .send(UiEvent::Error(format!("실시간 연결 실패: {}", e)))
                .await;
            None
        }
    };

    let event = match ops::fetch_conversation(backend, reservation).await {
        Ok(rows) => UiEvent::Loaded {
            reservation: reservation.clone(),
            rows,
        },
        Err(e) => UiEvent::LoadFailed {
            reservation: reservation.clone(),
            reason: e.to_string(),
        },
    };
    let _ = ui_tx.send(event).await;

    feed
}

fn spawn_send(
    backend: Arc<dyn ChatBackend>,
    viewer: Arc<Viewer>,
    config: PanelConfig,
    request: SendRequest,
    ui_tx: mpsc::Sender<UiEvent>,
) {
    tokio::spawn(async move {
        let outcome = match ops::deliver(backend.as_ref(), &viewer, &config, &request).await {
            Ok(stored) => {
                ops::request_translation(backend.clone(), stored.clone());
                Ok(stored)
            }
            Err(e) => {
                error!(reservation = %request.reservation, error = %e, "Failed to send message");
                Err(e.to_string())
            }
        };
        let _ = ui_tx.send(UiEvent::SendCompleted(outcome)).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use orderchat_client::MemoryBackend;
    use orderchat_core::{
        AuthUser, Language, MessageType, NewChatMessage, SenderRole, UserId, UserMetadata,
    };

    fn rn() -> ReservationNumber {
        ReservationNumber::parse("DL-2024-0001").unwrap()
    }

    struct Harness {
        memory: Arc<MemoryBackend>,
        ui_rx: mpsc::Receiver<UiEvent>,
        cmd_tx: mpsc::Sender<BackendCommand>,
    }

    fn start(memory: MemoryBackend) -> Harness {
        let memory = Arc::new(memory);
        let (ui_tx, ui_rx) = mpsc::channel(64);
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let config = PanelConfig {
            translate_pending_on_load: false,
            ..PanelConfig::default()
        };
        tokio::spawn(run_backend(
            memory.clone(),
            Viewer::default(),
            config,
            ui_tx,
            cmd_rx,
        ));
        Harness {
            memory,
            ui_rx,
            cmd_tx,
        }
    }

    impl Harness {
        async fn next(&mut self) -> UiEvent {
            tokio::time::timeout(Duration::from_secs(5), self.ui_rx.recv())
                .await
                .expect("timed out waiting for backend")
                .expect("backend stopped")
        }

        /// Skip feed status updates.
        async fn next_significant(&mut self) -> UiEvent {
            loop {
                match self.next().await {
                    UiEvent::Feed(_) => continue,
                    other => return other,
                }
            }
        }
    }

    fn session(id: &str) -> AuthUser {
        AuthUser {
            id: UserId::new(id),
            email: None,
            user_metadata: UserMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_resolves_session_then_loads() {
        let mut h = start(MemoryBackend::new().with_session(session("u1")));

        match h.next().await {
            UiEvent::ViewerResolved(id) => assert_eq!(id.as_str(), "u1"),
            other => panic!("Expected ViewerResolved, got {:?}", other),
        }

        h.cmd_tx.send(BackendCommand::Open(rn())).await.unwrap();
        match h.next_significant().await {
            UiEvent::Loaded { reservation, rows } => {
                assert_eq!(reservation, rn());
                assert!(rows.is_empty());
            }
            other => panic!("Expected Loaded, got {:?}", other),
        }
        assert_eq!(h.memory.calls().fetch, 1);
        assert_eq!(h.memory.calls().subscribe, 1);
    }

    #[tokio::test]
    async fn test_send_reports_stored_row_and_feed_echo() {
        let mut h = start(MemoryBackend::new().with_session(session("u1")));
        h.next().await;
        h.cmd_tx.send(BackendCommand::Open(rn())).await.unwrap();
        h.next_significant().await;

        h.cmd_tx
            .send(BackendCommand::Send(SendRequest {
                reservation: rn(),
                text: "검품 일정 문의드립니다".to_string(),
            }))
            .await
            .unwrap();

        let mut stored = None;
        let mut echoed = None;
        while stored.is_none() || echoed.is_none() {
            match h.next_significant().await {
                UiEvent::SendCompleted(Ok(row)) => stored = Some(row),
                UiEvent::Change {
                    event: ChangeEvent::Insert(row),
                    ..
                } => echoed = Some(row),
                _ => {}
            }
        }

        let stored = stored.unwrap();
        assert_eq!(stored.original_language, Language::Ko);
        assert_eq!(stored.sender_id, Some(UserId::new("u1")));
        assert_eq!(echoed.unwrap().id, stored.id);
        assert_eq!(h.memory.calls().insert, 1);
    }

    #[tokio::test]
    async fn test_send_failure_carries_reason() {
        let memory = MemoryBackend::new();
        memory.fail_insert("permission denied for table chat_messages");
        let mut h = start(memory);
        h.cmd_tx.send(BackendCommand::Open(rn())).await.unwrap();
        h.next_significant().await;

        h.cmd_tx
            .send(BackendCommand::Send(SendRequest {
                reservation: rn(),
                text: "안녕하세요".to_string(),
            }))
            .await
            .unwrap();

        match h.next_significant().await {
            UiEvent::SendCompleted(Err(reason)) => {
                assert_eq!(reason, "permission denied for table chat_messages")
            }
            other => panic!("Expected failed send, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incoming_message_is_forwarded_and_translated() {
        let memory = MemoryBackend::new().with_session(session("u1"));
        let mut h = start(memory);
        h.next().await;
        h.cmd_tx.send(BackendCommand::Open(rn())).await.unwrap();
        h.next_significant().await;

        h.memory.insert_external(NewChatMessage {
            reservation_number: rn(),
            sender_id: UserId::new("u2"),
            sender_name: "王芳".to_string(),
            sender_role: SenderRole::ChineseStaff,
            original_message: "您好".to_string(),
            original_language: Language::Zh,
            message_type: MessageType::Text,
            service_type: None,
            is_read: false,
        });

        match h.next_significant().await {
            UiEvent::Change {
                event: ChangeEvent::Insert(row),
                ..
            } => assert_eq!(row.original_message, "您好"),
            other => panic!("Expected insert, got {:?}", other),
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(h.memory.calls().translate, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let memory = MemoryBackend::new();
        memory.fail_fetch("connection reset");
        let mut h = start(memory);

        h.cmd_tx.send(BackendCommand::Open(rn())).await.unwrap();
        match h.next_significant().await {
            UiEvent::LoadFailed { reason, .. } => assert_eq!(reason, "connection reset"),
            other => panic!("Expected LoadFailed, got {:?}", other),
        }
    }
}
