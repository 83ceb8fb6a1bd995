//! Conversation logic for PileLog.
//!
//! An operator records a pile-driving event by answering a fixed sequence of
//! prompts. This crate owns everything between "text arrived for session S"
//! and "send these messages back":
//! - [`grouping`]: splits long pile lists into range menus for drill-down
//! - [`dialogue`]: the per-session state machine
//! - [`session`]: the in-memory session repository
//! - [`engine`]: drives the state machine and performs backend calls

pub mod dialogue;
pub mod engine;
pub mod grouping;
pub mod messages;
pub mod reply;
pub mod session;

pub use dialogue::{DialogueSettings, DialogueState, Step};
pub use engine::{Engine, PileBackend};
pub use grouping::{GROUP_LABEL_DELIMITER, Group, compute_groups, find_group_by_label};
pub use reply::{Keyboard, Outgoing};
pub use session::{Session, SessionStore};
