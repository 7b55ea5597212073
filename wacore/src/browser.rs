//! State behind the two-pane chat browser: which entry is selected, which
//! slice of the list fits on screen and what the transcript pane shows.
//!
//! Nothing here touches the terminal. The front-end feeds [`BrowserMsg`]s in
//! and reads the derived window and layout back out.

use crate::chat_buffer::{ChatBufferStore, ChatLine};
use crate::chat_list::{ChatDirectory, ChatListEntry};
use crate::types::contact::ContactRecord;
use crate::types::group::GroupRecord;
use crate::types::jid::Jid;
use std::sync::Arc;

/// Rows that never hold list entries: title bar, status bar and the list
/// block's top and bottom borders.
pub const FIXED_CHROME_HEIGHT: u16 = 4;

pub const MIN_LIST_WIDTH: u16 = 20;
pub const MAX_LIST_WIDTH: u16 = 40;

/// The visible slice `[start, end)` of the chat list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub end: usize,
    pub cursor_in_view: usize,
}

impl Window {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Number of list rows that fit in a viewport of `viewport_height` rows.
pub fn max_lines(len: usize, viewport_height: u16) -> usize {
    let available = viewport_height.saturating_sub(FIXED_CHROME_HEIGHT) as usize;
    available.min(len).max(1)
}

/// Centered scrolling: the cursor stays in the middle of the window except
/// near either end of the list, where the window is pinned to the edge.
pub fn window(cursor: usize, len: usize, viewport_height: u16) -> Window {
    let max_lines = max_lines(len, viewport_height);
    let half = max_lines / 2;

    let start = if cursor <= half {
        0
    } else if cursor >= len.saturating_sub(half) {
        len.saturating_sub(max_lines)
    } else {
        cursor - half
    };
    let end = (start + max_lines).min(len);

    Window {
        start,
        end,
        cursor_in_view: cursor.saturating_sub(start),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneLayout {
    pub width: u16,
    pub height: u16,
    pub list_width: u16,
    pub transcript_width: u16,
}

impl PaneLayout {
    pub fn for_size(width: u16, height: u16) -> Self {
        let list_width = (width / 3).clamp(MIN_LIST_WIDTH, MAX_LIST_WIDTH).min(width);
        Self {
            width,
            height,
            list_width,
            transcript_width: width - list_width,
        }
    }

    /// Characters available for a name inside the bordered list pane, after
    /// the two-column selection marker.
    pub fn name_width(&self) -> usize {
        self.list_width.saturating_sub(4) as usize
    }

    /// Transcript rows inside the bordered transcript pane.
    pub fn transcript_rows(&self) -> usize {
        self.height.saturating_sub(FIXED_CHROME_HEIGHT) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserMsg {
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Home,
    End,
    Resize { width: u16, height: u16 },
    /// Periodic refresh of the selected transcript.
    Tick,
    ContactUpdated(ContactRecord),
    GroupJoined(GroupRecord),
    Quit,
}

pub struct BrowserViewModel {
    directory: ChatDirectory,
    store: Arc<ChatBufferStore>,
    cursor: usize,
    layout: PaneLayout,
    transcript: Vec<ChatLine>,
    /// Chat that `transcript` belongs to.
    transcript_chat: Option<Jid>,
    quit: bool,
}

impl BrowserViewModel {
    pub fn new(directory: ChatDirectory, store: Arc<ChatBufferStore>) -> Self {
        let mut model = Self {
            directory,
            store,
            cursor: 0,
            layout: PaneLayout::default(),
            transcript: Vec::new(),
            transcript_chat: None,
            quit: false,
        };
        model.refresh_transcript();
        model
    }

    pub fn update(&mut self, msg: BrowserMsg) {
        if self.quit {
            return;
        }

        match msg {
            BrowserMsg::MoveUp => self.select(self.cursor.saturating_sub(1)),
            BrowserMsg::MoveDown => self.select(self.cursor.saturating_add(1)),
            BrowserMsg::PageUp => self.select(self.cursor.saturating_sub(self.page_size())),
            BrowserMsg::PageDown => self.select(self.cursor.saturating_add(self.page_size())),
            BrowserMsg::Home => self.select(0),
            BrowserMsg::End => self.select(usize::MAX),
            BrowserMsg::Resize { width, height } => {
                self.layout = PaneLayout::for_size(width, height);
            }
            BrowserMsg::Tick => self.refresh_transcript(),
            BrowserMsg::ContactUpdated(contact) => {
                self.update_directory(|directory| directory.upsert_contact(contact))
            }
            BrowserMsg::GroupJoined(group) => {
                self.update_directory(|directory| directory.upsert_group(group))
            }
            BrowserMsg::Quit => self.quit = true,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn layout(&self) -> PaneLayout {
        self.layout
    }

    pub fn directory(&self) -> &ChatDirectory {
        &self.directory
    }

    pub fn selected(&self) -> Option<&ChatListEntry> {
        self.directory.get(self.cursor)
    }

    pub fn window(&self) -> Window {
        window(self.cursor, self.directory.len(), self.layout.height)
    }

    pub fn visible_entries(&self) -> &[ChatListEntry] {
        let window = self.window();
        &self.directory.entries()[window.start..window.end]
    }

    /// Transcript of the selected chat as of the last refresh.
    pub fn transcript(&self) -> &[ChatLine] {
        &self.transcript
    }

    /// The newest transcript lines that fit in the transcript pane.
    pub fn visible_transcript(&self) -> &[ChatLine] {
        let rows = self.layout.transcript_rows();
        let skip = self.transcript.len().saturating_sub(rows);
        &self.transcript[skip..]
    }

    fn page_size(&self) -> usize {
        max_lines(self.directory.len(), self.layout.height)
    }

    fn select(&mut self, index: usize) {
        let last = self.directory.len().saturating_sub(1);
        self.cursor = index.min(last);
        self.refresh_transcript();
    }

    /// Applies a record change and keeps the same chat selected if it is still
    /// listed.
    fn update_directory(&mut self, change: impl FnOnce(&mut ChatDirectory)) {
        let selected = self.selected().map(|entry| entry.jid.clone());
        change(&mut self.directory);

        let cursor = selected
            .and_then(|jid| self.directory.position(&jid))
            .unwrap_or(self.cursor);
        self.cursor = cursor.min(self.directory.len().saturating_sub(1));
        self.refresh_transcript();
    }

    /// Pulls lines appended to the selected chat since the last refresh,
    /// without blocking. If the store is busy the current copy stays on screen
    /// until the next refresh.
    fn refresh_transcript(&mut self) {
        let selected = self.selected().map(|entry| entry.jid.clone());
        if selected != self.transcript_chat {
            self.transcript.clear();
            self.transcript_chat = selected;
        }
        let Some(jid) = &self.transcript_chat else {
            return;
        };
        if let Some(lines) = self.store.try_lines_from(jid, self.transcript.len()) {
            self.transcript.extend(lines);
        }
    }
}
