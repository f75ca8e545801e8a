pub mod backend;
pub mod chat;
pub mod config;
pub mod normalize;
pub mod session;
pub mod typewriter;

// Re-export main types for convenience
pub use backend::{AskClient, DispatchError, Health};
pub use chat::{Chat, ChatOptions, ChatUpdate};
pub use config::Config;
pub use normalize::display_text;
pub use session::{ChatMessage, ChatRole, ChatSession, MessageId};
pub use typewriter::Typewriter;
