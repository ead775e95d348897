//! Conversation glue: transcript, backend call, and the hand-off from a bot
//! reply to the vehicle simulator.

pub mod backend;
pub mod message;
pub mod session;

pub use backend::{ChatBackend, ChatError, HttpChatBackend};
pub use message::{ChatMessage, Sender};
pub use session::ChatSession;
