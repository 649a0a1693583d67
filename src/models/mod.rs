mod chat;
mod conversation;

pub use chat::*;
pub use conversation::*;
