// Conversation surfaces - plain chat and image-grounded chat

pub mod chatbot;
pub mod history;
pub mod image_chat;

pub use chatbot::ChatSession;
pub use history::{BoundedHistory, Turn, CHAT_MAX_ROUNDS};
pub use image_chat::{ImageAttachment, ImageChatSession};
