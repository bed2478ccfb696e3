//! UI state for rendering.

use orderchat_core::UserId;
use orderchat_panel::PanelState;

use crate::event::FeedStatus;

/// Everything the UI thread owns (no async, no locks).
pub struct UiState {
    pub panel: PanelState,

    /// Id that decides which messages are drawn on the right.
    pub viewer_id: UserId,

    /// Cursor in the draft, in characters.
    pub cursor: usize,

    pub feed: FeedStatus,

    /// Status message to display in the footer.
    pub status_message: Option<String>,

    /// Largest scroll offset at the last draw.
    pub max_scroll: usize,
}

impl UiState {
    pub fn new(viewer_id: UserId) -> Self {
        Self {
            panel: PanelState::new(),
            viewer_id,
            cursor: 0,
            feed: FeedStatus::default(),
            status_message: None,
            max_scroll: 0,
        }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        let draft = self.panel.draft();
        draft
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(draft.len())
    }

    fn draft_chars(&self) -> usize {
        self.panel.draft().chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.panel.draft_mut().insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.panel.draft_mut().remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.draft_chars() {
            let at = self.byte_index(self.cursor);
            self.panel.draft_mut().remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.draft_chars());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.draft_chars();
    }

    /// Keep the scroll position inside the drawn log.
    pub fn clamp_scroll(&mut self, max_scroll: usize) {
        self.max_scroll = max_scroll;
        let excess = self.panel.scroll_back().saturating_sub(max_scroll);
        if excess > 0 {
            self.panel.scroll_down(excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> UiState {
        let mut state = UiState::new(UserId::new("u1"));
        for c in text.chars() {
            state.insert_char(c);
        }
        state
    }

    #[test]
    fn test_editing_multibyte_draft() {
        let mut state = typed("검품 일정");
        assert_eq!(state.cursor, 5);

        state.move_left();
        state.move_left();
        state.insert_char('새');
        assert_eq!(state.panel.draft(), "검품 새일정");

        state.backspace();
        state.backspace();
        assert_eq!(state.panel.draft(), "검품일정");

        state.move_home();
        state.delete();
        assert_eq!(state.panel.draft(), "품일정");

        state.move_end();
        assert_eq!(state.cursor, 3);
        state.move_right();
        assert_eq!(state.cursor, 3);
    }

    #[test]
    fn test_clamp_scroll() {
        let mut state = UiState::new(UserId::new("u1"));
        state.panel.scroll_up(50);
        state.clamp_scroll(12);
        assert_eq!(state.panel.scroll_back(), 12);
        state.clamp_scroll(20);
        assert_eq!(state.panel.scroll_back(), 12);
    }
}
