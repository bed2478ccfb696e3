//! Application state and main event loop.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use orderchat_core::{ReservationNumber, UserId};
use orderchat_panel::SendRejected;

use crate::event::{BackendCommand, UiEvent};
use crate::state::UiState;
use crate::ui;

const PAGE: usize = 5;

/// Main application with UI state and channel handles.
pub struct App {
    state: UiState,

    /// Receiver for events from the backend.
    ui_rx: mpsc::Receiver<UiEvent>,

    /// Sender for commands to the backend.
    cmd_tx: mpsc::Sender<BackendCommand>,
}

impl App {
    pub fn new(
        viewer_id: UserId,
        ui_rx: mpsc::Receiver<UiEvent>,
        cmd_tx: mpsc::Sender<BackendCommand>,
    ) -> Self {
        Self {
            state: UiState::new(viewer_id),
            ui_rx,
            cmd_tx,
        }
    }

    /// Show a reservation.
    pub fn open(&mut self, reservation: ReservationNumber) {
        self.state.panel.open(reservation.clone());
        self.command(BackendCommand::Open(reservation));
    }

    fn command(&mut self, cmd: BackendCommand) {
        if self.cmd_tx.blocking_send(cmd).is_err() {
            warn!("Backend is gone");
            self.state.status_message = Some("백엔드 연결 끊김".to_string());
        }
    }

    /// Run the main event loop on the current thread.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> std::io::Result<()> {
        loop {
            let mut max_scroll = 0;
            terminal.draw(|frame| max_scroll = ui::render(frame, &self.state))?;
            self.state.clamp_scroll(max_scroll);

            // Poll terminal events (non-blocking with short timeout)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key) {
                        break;
                    }
                }
            }

            // Process backend events (non-blocking)
            while let Ok(event) = self.ui_rx.try_recv() {
                self.apply_event(event);
            }
        }

        let _ = self.cmd_tx.blocking_send(BackendCommand::Quit);
        Ok(())
    }

    /// Apply an event from the backend to the UI state.
    fn apply_event(&mut self, event: UiEvent) {
        let panel = &mut self.state.panel;
        match event {
            UiEvent::ViewerResolved(id) => {
                debug!(user_id = %id, "Viewer resolved");
                self.state.viewer_id = id;
            }
            UiEvent::Loaded { reservation, rows } => {
                panel.load_completed(&reservation, rows);
            }
            UiEvent::LoadFailed {
                reservation,
                reason,
            } => {
                panel.load_failed(&reservation, &reason);
            }
            UiEvent::Change { reservation, event } => {
                panel.apply_change(&reservation, event);
            }
            UiEvent::SendCompleted(Ok(row)) => {
                panel.send_succeeded(row);
            }
            UiEvent::SendCompleted(Err(reason)) => {
                panel.send_failed(reason);
            }
            UiEvent::Feed(status) => {
                self.state.feed = status;
            }
            UiEvent::Error(message) => {
                self.state.status_message = Some(message);
            }
        }
    }

    /// Handle a key press. Returns true if the app should quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        // The alert blocks everything until acknowledged.
        if self.state.panel.alert().is_some() {
            self.state.panel.dismiss_alert();
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => self.submit(),
            KeyCode::Char(c) => self.state.insert_char(c),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Delete => self.state.delete(),
            KeyCode::Left => self.state.move_left(),
            KeyCode::Right => self.state.move_right(),
            KeyCode::Home => self.state.move_home(),
            KeyCode::End => self.state.move_end(),
            KeyCode::Up => self.state.panel.scroll_up(1),
            KeyCode::Down => self.state.panel.scroll_down(1),
            KeyCode::PageUp => self.state.panel.scroll_up(PAGE),
            KeyCode::PageDown => self.state.panel.scroll_down(PAGE),
            _ => {}
        }
        false
    }

    fn submit(&mut self) {
        match self.state.panel.begin_send() {
            Ok(request) => {
                self.state.cursor = 0;
                self.state.status_message = None;
                if self.cmd_tx.blocking_send(BackendCommand::Send(request)).is_err() {
                    self.state.panel.send_failed("백엔드 연결 끊김");
                }
            }
            Err(SendRejected::Empty) => {}
            Err(rejected) => {
                debug!(reason = %rejected, "Send rejected");
                self.state.status_message = Some(rejected.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderchat_core::{ChatMessage, Language, MessageId, NewChatMessage, SenderRole};

    fn rn() -> ReservationNumber {
        ReservationNumber::parse("DL-2024-0001").unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> (App, mpsc::Sender<UiEvent>, mpsc::Receiver<BackendCommand>) {
        let (ui_tx, ui_rx) = mpsc::channel(16);
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        (App::new(UserId::new("u1"), ui_rx, cmd_tx), ui_tx, cmd_rx)
    }

    fn ready_app() -> (App, mpsc::Sender<UiEvent>, mpsc::Receiver<BackendCommand>) {
        let (mut app, ui_tx, mut cmd_rx) = app();
        app.open(rn());
        assert!(matches!(cmd_rx.try_recv(), Ok(BackendCommand::Open(_))));
        app.apply_event(UiEvent::Loaded {
            reservation: rn(),
            rows: vec![],
        });
        (app, ui_tx, cmd_rx)
    }

    fn stored(text: &str) -> ChatMessage {
        ChatMessage::from_new(
            NewChatMessage {
                reservation_number: rn(),
                sender_id: UserId::new("u1"),
                sender_name: "Kim".to_string(),
                sender_role: SenderRole::Customer,
                original_message: text.to_string(),
                original_language: Language::Ko,
                message_type: Default::default(),
                service_type: None,
                is_read: false,
            },
            MessageId::new("m1"),
            Utc::now(),
        )
    }

    #[test]
    fn test_enter_sends_draft_as_typed() {
        let (mut app, _ui_tx, mut cmd_rx) = ready_app();
        for c in "  안녕하세요 ".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.handle_key(press(KeyCode::Enter));

        match cmd_rx.try_recv() {
            Ok(BackendCommand::Send(request)) => assert_eq!(request.text, "  안녕하세요 "),
            other => panic!("Expected send, got {:?}", other),
        }
        assert_eq!(app.state.panel.draft(), "");
        assert_eq!(app.state.cursor, 0);
        assert!(app.state.panel.is_sending());

        // A second Enter while the first is in flight sends nothing.
        app.handle_key(press(KeyCode::Char('x')));
        app.handle_key(press(KeyCode::Enter));
        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.state.panel.draft(), "x");
    }

    #[test]
    fn test_whitespace_enter_is_ignored() {
        let (mut app, _ui_tx, mut cmd_rx) = ready_app();
        app.handle_key(press(KeyCode::Char(' ')));
        app.handle_key(press(KeyCode::Enter));

        assert!(cmd_rx.try_recv().is_err());
        assert_eq!(app.state.panel.draft(), " ");
        assert!(app.state.status_message.is_none());
    }

    #[test]
    fn test_send_outcomes() {
        let (mut app, _ui_tx, _cmd_rx) = ready_app();
        app.state.panel.set_draft("검품 일정 문의드립니다");
        app.handle_key(press(KeyCode::Enter));

        app.apply_event(UiEvent::SendCompleted(Ok(stored("검품 일정 문의드립니다"))));
        assert_eq!(app.state.panel.log().len(), 1);

        app.state.panel.set_draft("again");
        app.handle_key(press(KeyCode::Enter));
        app.apply_event(UiEvent::SendCompleted(Err("permission denied".to_string())));
        assert_eq!(app.state.panel.alert(), Some("permission denied"));

        // Any key dismisses the alert and is otherwise swallowed.
        assert!(!app.handle_key(press(KeyCode::Esc)));
        assert!(app.state.panel.alert().is_none());
        assert!(app.handle_key(press(KeyCode::Esc)));
    }

    #[test]
    fn test_viewer_resolution_updates_alignment_id() {
        let (mut app, _ui_tx, _cmd_rx) = app();
        app.apply_event(UiEvent::ViewerResolved(UserId::new("real-user")));
        assert_eq!(app.state.viewer_id.as_str(), "real-user");
    }

    #[test]
    fn test_ctrl_c_quits() {
        let (mut app, _ui_tx, _cmd_rx) = app();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.handle_key(key));
    }
}
