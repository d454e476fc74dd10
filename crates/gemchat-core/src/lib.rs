//! gemchat-core – conversation bookkeeping and request assembly for the
//! Gemini chat front-end.
//!
//! The HTTP layer lives in `gemchat-server`; everything here is transport
//! agnostic so it can be exercised directly from tests.

pub mod assembler;
pub mod chat;
pub mod conversation;
pub mod error;
pub mod gemini;
pub mod mime;
pub mod part;
pub mod store;
pub mod thinking;

pub use assembler::{assemble, Assembled, OutboundPart, OutboundTurn, DEFAULT_ATTACHMENT_PROMPT};
pub use chat::{ChatService, Exchange, ExchangeOutcome};
pub use conversation::{Attachment, Conversation, Role, Turn};
pub use error::ChatError;
pub use gemini::{GeminiClient, Generate, GenerateRequest};
pub use mime::resolve_mime;
pub use part::{file_to_part, AttachmentPart};
pub use store::{Acquired, ConversationStore, MemoryStore, SessionId, SharedConversation};
pub use thinking::{thinking_config, ThinkingConfig, ThinkingLevel};

/// Models offered by the chat page, in display order.
pub const MODELS: &[&str] = &[
    "gemini-3-pro-preview",
    "gemini-3-flash-preview",
    "gemini-2.5-pro",
    "gemini-2.5-flash",
];
