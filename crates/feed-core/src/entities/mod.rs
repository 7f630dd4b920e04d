//! Domain entities - core feed objects

mod invite;
mod message;

pub use invite::InviteMap;
pub use message::{AttachmentKind, Author, Embed, Message, DEFAULT_AUTHOR_COLOR, VIDEO_EXTENSIONS};
