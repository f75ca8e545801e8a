use futures_util::FutureExt;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;

use rapidscale_chat::{Chat, ChatRole, Health, MessageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub chat: Chat,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the chat pane, set during render
    pub chat_width: u16,  // Inner width of the chat pane, set during render
    pub chat_area: Option<Rect>,
    pub follow_tail: bool,
    seen_revision: u64,

    // Inspector
    pub highlighted: Option<MessageId>,
    pub inspector_scroll: u16,
    pub notice: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Backend liveness
    pub backend_status: BackendStatus,
    health_task: Option<JoinHandle<anyhow::Result<Health>>>,
}

impl App {
    pub fn new(chat: Chat) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            chat,

            input: String::new(),
            cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            follow_tail: true,
            seen_revision: 0,

            highlighted: None,
            inspector_scroll: 0,
            notice: None,

            animation_frame: 0,

            backend_status: BackendStatus::Checking,
            health_task: None,
        }
    }

    /// Send the input box contents. The text is only cleared when the chat
    /// accepted it.
    pub fn submit_input(&mut self) -> bool {
        if !self.chat.submit(&self.input) {
            return false;
        }
        self.input.clear();
        self.cursor = 0;
        self.follow_tail = true;
        true
    }

    // Input editing (cursor is a char index, the string is UTF-8)

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        // Pasted CRLF would otherwise leave stray carriage returns.
        for c in text.chars().filter(|c| *c != '\r') {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.session().is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll >= max;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_tail = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
        self.follow_tail = true;
    }

    /// Keep the newest message in view whenever the conversation changed.
    pub fn sync_scroll(&mut self) {
        let revision = self.chat.session().revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            if self.follow_tail {
                self.scroll_to_bottom();
            }
        }
    }

    fn max_chat_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_line_count().saturating_sub(visible_height)
    }

    /// Approximate number of wrapped lines the chat pane needs.
    pub fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in self.chat.session().messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "AI:")
            for line in msg.content.split('\n') {
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add((char_count / wrap_width + 1) as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.chat.session().is_pending() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        total_lines
    }

    // Inspector

    fn inspectable_ids(&self) -> Vec<MessageId> {
        self.chat
            .session()
            .messages()
            .iter()
            .filter(|m| m.role() == ChatRole::Assistant && m.is_inspectable())
            .map(|m| m.id())
            .collect()
    }

    /// Move the highlight to the next reply that has a raw payload.
    pub fn highlight_next(&mut self) {
        let ids = self.inspectable_ids();
        self.highlighted = match self.highlighted {
            Some(current) => ids.iter().copied().find(|id| *id > current).or(Some(current)),
            None => ids.first().copied(),
        };
    }

    pub fn highlight_prev(&mut self) {
        let ids = self.inspectable_ids();
        self.highlighted = match self.highlighted {
            Some(current) => ids.iter().rev().copied().find(|id| *id < current).or(Some(current)),
            None => ids.last().copied(),
        };
    }

    /// Open the inspector on the highlighted reply (or the latest one).
    pub fn open_inspector(&mut self) -> bool {
        let target = self
            .highlighted
            .or_else(|| self.inspectable_ids().last().copied());
        let Some(id) = target else {
            return false;
        };
        self.highlighted = Some(id);
        self.inspector_scroll = 0;
        self.chat.select(Some(id))
    }

    pub fn close_inspector(&mut self) {
        self.chat.clear_selection();
        self.inspector_scroll = 0;
    }

    pub fn inspector_open(&self) -> bool {
        self.chat.session().selected().is_some()
    }

    /// Pretty JSON of the message under inspection.
    pub fn selected_json(&self) -> Option<String> {
        self.chat
            .session()
            .selected_message()
            .and_then(|m| m.raw_payload())
            .map(rapidscale_chat::normalize::pretty)
    }

    // Backend liveness

    pub fn check_health(&mut self) {
        if let Some(task) = self.health_task.take() {
            task.abort();
        }
        self.backend_status = BackendStatus::Checking;
        let client = self.chat.client().clone();
        self.health_task = Some(tokio::spawn(async move { client.health().await }));
    }

    pub fn poll_health(&mut self) {
        let Some(task) = self.health_task.as_mut() else {
            return;
        };
        let Some(joined) = task.now_or_never() else {
            return;
        };
        self.health_task = None;
        self.backend_status = match joined {
            Ok(Ok(health)) => {
                tracing::info!(status = %health.status, "backend is reachable");
                BackendStatus::Online
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "backend health check failed");
                BackendStatus::Offline
            }
            Err(err) => {
                tracing::warn!(error = %err, "health check task failed");
                BackendStatus::Offline
            }
        };
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
