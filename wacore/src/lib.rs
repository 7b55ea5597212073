//! Runtime-free core of the WhatsApp terminal bridge: chat identities and
//! records, the snapshot line framing, the chat list, per-chat transcript
//! buffers and the browser view model.

pub mod browser;
pub mod chat_buffer;
pub mod chat_list;
pub mod frame;
pub mod types;

pub use browser::{BrowserMsg, BrowserViewModel, PaneLayout, Window};
pub use chat_buffer::{ChatBufferStore, ChatLine};
pub use chat_list::{ChatDirectory, ChatListEntry};
pub use frame::{Frame, FrameError, Tag};
