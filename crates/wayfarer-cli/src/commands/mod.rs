pub mod chat;
pub mod tool;
pub mod version;
