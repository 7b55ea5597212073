//! Two-pane terminal browser: chat list on the left, transcript on the right.

pub mod app;
pub mod ui;

pub use app::{TuiError, run};

/// Where the chat list came from, shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBanner {
    pub source: String,
    /// The snapshot ended before `End` arrived.
    pub partial: bool,
    pub skipped: usize,
}

impl SessionBanner {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            partial: false,
            skipped: 0,
        }
    }
}
