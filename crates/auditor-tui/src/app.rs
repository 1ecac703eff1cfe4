use auditor_core::{AuditReport, Relay, RelayMode, SubmissionSequence, Ticket};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub mode: RelayMode,

    // Prompt form
    pub prompt: String,
    pub prompt_cursor: usize, // cursor position in prompt, in chars

    // Result area
    pub result: String,
    pub report: Option<AuditReport>,
    pub result_scroll: usize, // first visible result line
    pub result_height: u16, // inner height of the result box, set during render

    // Submissions
    pub sequence: SubmissionSequence,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    relay: Relay,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(relay: Relay, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            mode: RelayMode::default(),
            prompt: String::new(),
            prompt_cursor: 0,
            result: String::new(),
            report: None,
            result_scroll: 0,
            result_height: 0,
            sequence: SubmissionSequence::new(),
            animation_frame: 0,
            relay,
            events,
        }
    }

    pub fn model(&self) -> &str {
        self.relay.model()
    }

    pub fn is_loading(&self) -> bool {
        self.sequence.is_pending()
    }

    /// Send the current prompt in the background. The prompt is not cleared.
    pub fn submit(&mut self) -> Ticket {
        let ticket = self.sequence.begin();
        let relay = self.relay.clone();
        let mode = self.mode;
        let prompt = self.prompt.clone();
        let events = self.events.clone();

        info!(
            ticket = ticket.number(),
            mode = mode.as_str(),
            chars = prompt.chars().count(),
            "submitting prompt"
        );

        tokio::spawn(async move {
            let (result, report) = relay.submit_as(mode, &prompt).await;
            // Receiver is gone once the UI has quit
            let _ = events.send(AppEvent::RelayFinished { ticket, result, report });
        });

        self.animation_frame = 0;
        ticket
    }

    /// Show a finished result if it belongs to the newest submission.
    pub fn apply_result(&mut self, ticket: Ticket, result: String, report: Option<AuditReport>) -> bool {
        if !self.sequence.complete(ticket) {
            debug!(ticket = ticket.number(), "discarding superseded result");
            return false;
        }

        self.result = result;
        self.report = report;
        self.result_scroll = 0;
        true
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggle();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Prompt editing
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.prompt, self.prompt_cursor);
        self.prompt.insert(byte_pos, c);
        self.prompt_cursor += 1;
    }

    /// Insert pasted text at the cursor, normalizing line endings.
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let byte_pos = char_to_byte_index(&self.prompt, self.prompt_cursor);
        self.prompt.insert_str(byte_pos, &text);
        self.prompt_cursor += text.chars().count();
    }

    pub fn backspace(&mut self) {
        if self.prompt_cursor > 0 {
            self.prompt_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.prompt, self.prompt_cursor);
            self.prompt.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.prompt.chars().count();
        if self.prompt_cursor < char_count {
            let byte_pos = char_to_byte_index(&self.prompt, self.prompt_cursor);
            self.prompt.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.prompt_cursor = self.prompt_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.prompt.chars().count();
        self.prompt_cursor = (self.prompt_cursor + 1).min(char_count);
    }

    /// Move to the start of the current line
    pub fn cursor_home(&mut self) {
        let (_, col) = self.cursor_line_col();
        self.prompt_cursor -= col;
    }

    /// Move to the end of the current line
    pub fn cursor_end(&mut self) {
        let rest = self
            .prompt
            .chars()
            .skip(self.prompt_cursor)
            .take_while(|&c| c != '\n')
            .count();
        self.prompt_cursor += rest;
    }

    pub fn clear_prompt(&mut self) {
        self.prompt.clear();
        self.prompt_cursor = 0;
    }

    /// Line and column of the cursor, both counted in chars.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in self.prompt.chars().take(self.prompt_cursor) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    // Result scrolling
    fn max_result_scroll(&self) -> usize {
        let total = self.result.lines().count();
        total.saturating_sub(usize::from(self.result_height))
    }

    pub fn scroll_down(&mut self) {
        if self.result_scroll < self.max_result_scroll() {
            self.result_scroll += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.result_scroll = self.result_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = usize::from(self.result_height / 2).max(1);
        self.result_scroll = (self.result_scroll + half_page).min(self.max_result_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = usize::from(self.result_height / 2).max(1);
        self.result_scroll = self.result_scroll.saturating_sub(half_page);
    }

    pub fn scroll_top(&mut self) {
        self.result_scroll = 0;
    }

    pub fn scroll_bottom(&mut self) {
        self.result_scroll = self.max_result_scroll();
    }
}
